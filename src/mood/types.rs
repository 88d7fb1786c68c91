//! Types for mood analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entries::Entry;

/// One detected emotion and its confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub label: String,
    pub score: f64,
}

/// Sentiment analysis the backend computes for an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAnalysis {
    /// "positive", "negative" or "neutral"
    pub overall_sentiment: String,

    pub sentiment_score: f64,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub suggestions: String,

    /// The backend sends `null` when no emotion was detected
    #[serde(default, deserialize_with = "null_as_empty")]
    pub emotions: Vec<Emotion>,

    pub analyzed_at: DateTime<Utc>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Emotion>, D::Error> {
    Ok(Option::<Vec<Emotion>>::deserialize(deserializer)?.unwrap_or_default())
}

impl MoodAnalysis {
    /// The highest scoring emotion, if any were detected
    pub fn dominant_emotion(&self) -> Option<&Emotion> {
        self.emotions
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// An entry together with its finished analysis
#[derive(Debug, Clone, PartialEq)]
pub struct MoodReport {
    pub entry: Entry,
    pub mood: MoodAnalysis,
    /// Number of mood requests it took
    pub attempts: u32,
}

/// What a single mood request found
#[derive(Debug, Clone, PartialEq)]
pub enum MoodPoll {
    Ready(MoodAnalysis),
    /// Not available yet; carries the status the backend answered with
    Pending { status: u16 },
}

/// Progress of a mood retrieval, for rendering
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MoodPhase {
    #[default]
    Idle,
    /// Fetching the entry
    Loading,
    /// Entry found, waiting for the analysis
    AnalyzingMood { entry: Entry, attempt: u32 },
    Ready(MoodReport),
    /// Terminal error, with the message to show
    Failed(String),
}

impl MoodPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MoodPhase::Ready(_) | MoodPhase::Failed(_))
    }
}
