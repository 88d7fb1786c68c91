//! Mood retrieval workflow
//!
//! Analysis is computed asynchronously by the backend after an entry is
//! saved, and there is no push channel. [`MoodRetrieval`] looks the entry up,
//! then polls the mood endpoint under a [`RetryPolicy`] until the analysis
//! appears, the budget runs out, or the caller cancels.

mod retry;
mod types;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::entries::{self, Entry, EntryId};
use crate::error::{Error, Result};
use crate::fetch::{ApiGateway, ApiResponse};

pub use retry::*;
pub use types::*;

/// Where the workflow gets its data from
#[async_trait]
pub trait MoodSource: Send + Sync {
    /// The full entry collection of the current user
    async fn fetch_entries(&self) -> Result<Vec<Entry>>;

    /// One request to the mood endpoint of `id`
    async fn fetch_mood(&self, id: &EntryId) -> Result<MoodPoll>;
}

#[async_trait]
impl MoodSource for ApiGateway {
    async fn fetch_entries(&self) -> Result<Vec<Entry>> {
        entries::fetch_entries(self).await
    }

    async fn fetch_mood(&self, id: &EntryId) -> Result<MoodPoll> {
        let response = self.get(&format!("entries/{}/mood", id.path_segment())).send().await?;
        match response {
            ApiResponse::Success(Some(body)) => Ok(MoodPoll::Ready(serde_json::from_value(body)?)),
            ApiResponse::Success(None) => Ok(MoodPoll::Pending { status: 204 }),
            ApiResponse::Failure { status, .. } => Ok(MoodPoll::Pending { status }),
            ApiResponse::AuthExpired => {
                self.expire_session()?;
                Err(Error::AuthExpired)
            }
            ApiResponse::NetworkFailure(e) => Err(Error::Network(e)),
        }
    }
}

/// Fetches an entry and waits for its mood analysis.
///
/// Steps run strictly in sequence: the entry lookup finishes before polling
/// starts, and each attempt (with its delay) finishes before the next one.
pub struct MoodRetrieval<S> {
    source: S,
    policy: RetryPolicy,
    phase: watch::Sender<MoodPhase>,
}

impl<S: MoodSource> MoodRetrieval<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        let (phase, _) = watch::channel(MoodPhase::Idle);
        Self {
            source,
            policy,
            phase,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Follow the phase transitions of this workflow
    pub fn subscribe(&self) -> watch::Receiver<MoodPhase> {
        self.phase.subscribe()
    }

    /// The latest phase
    pub fn phase(&self) -> MoodPhase {
        self.phase.borrow().clone()
    }

    /// Run the workflow for `id` to completion.
    ///
    /// Ends with the report, or with one of `EntryNotFound`,
    /// `StillProcessing`, `AuthExpired`, `Cancelled`, or the transport/server
    /// error that aborted it.
    pub async fn run(&self, id: &EntryId, cancel: &CancellationToken) -> Result<MoodReport> {
        self.phase.send_replace(MoodPhase::Loading);

        let result = self.retrieve(id, cancel).await;
        match &result {
            Ok(report) => {
                self.phase.send_replace(MoodPhase::Ready(report.clone()));
            }
            Err(e) => {
                warn!("Mood retrieval for entry {} failed: {}", id, e);
                self.phase.send_replace(MoodPhase::Failed(e.user_message()));
            }
        }
        result
    }

    async fn retrieve(&self, id: &EntryId, cancel: &CancellationToken) -> Result<MoodReport> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let entry = self
            .source
            .fetch_entries()
            .await?
            .into_iter()
            .find(|entry| entry.id == *id)
            .ok_or_else(|| Error::EntryNotFound(id.clone()))?;

        for attempt in 1..=self.policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            self.phase.send_replace(MoodPhase::AnalyzingMood {
                entry: entry.clone(),
                attempt,
            });

            match self.source.fetch_mood(id).await? {
                MoodPoll::Ready(mood) => {
                    info!("Mood analysis for entry {} ready after {} attempt(s)", id, attempt);
                    return Ok(MoodReport {
                        entry,
                        mood,
                        attempts: attempt,
                    });
                }
                MoodPoll::Pending { status } => {
                    debug!("Mood for entry {} not ready (attempt {}, status {})", id, attempt, status);
                }
            }

            if !self.policy.has_attempts_after(attempt) {
                break;
            }

            let delay = self.policy.delay_for(attempt);
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        Err(Error::StillProcessing {
            attempts: self.policy.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    fn entry(id: &str) -> Entry {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("title {}", id),
            "text": "some text",
            "date": "2025-03-01"
        }))
        .unwrap()
    }

    fn mood(score: f64) -> MoodAnalysis {
        serde_json::from_value(serde_json::json!({
            "overall_sentiment": "positive",
            "sentiment_score": score,
            "summary": "calm",
            "suggestions": "keep going",
            "emotions": [{"label": "joy", "score": 0.9}],
            "analyzed_at": "2025-03-01T10:00:00Z"
        }))
        .unwrap()
    }

    enum Step {
        Pending,
        Ready(MoodAnalysis),
        Fail(fn() -> Error),
    }

    #[derive(Clone)]
    struct ScriptedSource {
        entries: Vec<Entry>,
        steps: Arc<Mutex<VecDeque<Step>>>,
        mood_calls: Arc<AtomicU32>,
        call_times: Arc<Mutex<Vec<Instant>>>,
    }

    impl ScriptedSource {
        fn new(entries: Vec<Entry>, steps: Vec<Step>) -> Self {
            Self {
                entries,
                steps: Arc::new(Mutex::new(steps.into())),
                mood_calls: Arc::new(AtomicU32::new(0)),
                call_times: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> u32 {
            self.mood_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MoodSource for ScriptedSource {
        async fn fetch_entries(&self) -> Result<Vec<Entry>> {
            Ok(self.entries.clone())
        }

        async fn fetch_mood(&self, _id: &EntryId) -> Result<MoodPoll> {
            self.mood_calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().unwrap().push(Instant::now());
            match self.steps.lock().unwrap().pop_front() {
                Some(Step::Ready(mood)) => Ok(MoodPoll::Ready(mood)),
                Some(Step::Fail(make)) => Err(make()),
                Some(Step::Pending) | None => Ok(MoodPoll::Pending { status: 404 }),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_pending_makes_ten_attempts() {
        let source = ScriptedSource::new(vec![entry("1")], vec![]);
        let workflow = MoodRetrieval::new(source.clone(), RetryPolicy::default());
        let started = Instant::now();

        let result = workflow.run(&EntryId::from("1"), &CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::StillProcessing { attempts: 10 })));
        assert_eq!(source.calls(), 10);
        assert_eq!(started.elapsed(), Duration::from_millis(18_000));

        let times = source.call_times.lock().unwrap().clone();
        for pair in times.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_millis(2000));
        }
        assert!(matches!(workflow.phase(), MoodPhase::Failed(msg) if msg.contains("still processing")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_third_attempt() {
        let source = ScriptedSource::new(
            vec![entry("1"), entry("2")],
            vec![Step::Pending, Step::Pending, Step::Ready(mood(0.8))],
        );
        let workflow = MoodRetrieval::new(source.clone(), RetryPolicy::default());
        let started = Instant::now();

        let report = workflow
            .run(&EntryId::from("2"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.attempts, 3);
        assert_eq!(report.entry.id, EntryId::from("2"));
        assert_eq!(report.mood.sentiment_score, 0.8);
        assert_eq!(source.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(4000));
        assert!(matches!(workflow.phase(), MoodPhase::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_entry_never_polls() {
        let source = ScriptedSource::new(vec![entry("1")], vec![Step::Ready(mood(0.1))]);
        let workflow = MoodRetrieval::new(source.clone(), RetryPolicy::default());

        let result = workflow.run(&EntryId::from("99"), &CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::EntryNotFound(id)) if id.as_str() == "99"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_aborts_remaining_attempts() {
        let source = ScriptedSource::new(
            vec![entry("1")],
            vec![
                Step::Pending,
                Step::Fail(|| Error::config("connection refused")),
                Step::Ready(mood(0.5)),
            ],
        );
        let workflow = MoodRetrieval::new(source.clone(), RetryPolicy::default());

        let result = workflow.run(&EntryId::from("1"), &CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_expired_stops_polling() {
        let source = ScriptedSource::new(vec![entry("1")], vec![Step::Fail(|| Error::AuthExpired)]);
        let workflow = MoodRetrieval::new(source.clone(), RetryPolicy::default());

        let result = workflow.run(&EntryId::from("1"), &CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::AuthExpired)));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay() {
        let source = ScriptedSource::new(vec![entry("1")], vec![]);
        let workflow = Arc::new(MoodRetrieval::new(source.clone(), RetryPolicy::default()));
        let cancel = CancellationToken::new();

        let handle = {
            let workflow = workflow.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let id = EntryId::from("1");
                let result = workflow.run(&id, &cancel).await;
                result
            })
        };

        tokio::time::sleep(Duration::from_millis(3000)).await;
        cancel.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phases_progress_in_order() {
        let source = ScriptedSource::new(vec![entry("1")], vec![Step::Pending, Step::Ready(mood(0.2))]);
        let workflow = MoodRetrieval::new(source, RetryPolicy::default());
        let mut phases = workflow.subscribe();
        assert_eq!(*phases.borrow_and_update(), MoodPhase::Idle);

        workflow
            .run(&EntryId::from("1"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(phases.has_changed().unwrap());
        assert!(phases.borrow_and_update().is_terminal());
    }

    #[test]
    fn test_null_or_missing_emotions_are_empty() {
        let mut raw = serde_json::to_value(mood(0.4)).unwrap();
        raw["emotions"] = serde_json::Value::Null;
        let analysis: MoodAnalysis = serde_json::from_value(raw.clone()).unwrap();
        assert!(analysis.emotions.is_empty());

        raw.as_object_mut().unwrap().remove("emotions");
        let analysis: MoodAnalysis = serde_json::from_value(raw).unwrap();
        assert!(analysis.emotions.is_empty());
    }

    #[test]
    fn test_dominant_emotion() {
        let mut analysis = mood(0.3);
        analysis.emotions = vec![
            Emotion { label: "sadness".into(), score: 0.2 },
            Emotion { label: "joy".into(), score: 0.7 },
        ];
        assert_eq!(analysis.dominant_emotion().map(|e| e.label.as_str()), Some("joy"));
    }
}
