use std::env;
use std::time::Duration;

use dotenv::dotenv;
use moodjournal::mood::MoodRetrieval;
use moodjournal::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let email = env::var("MOODJOURNAL_EMAIL").expect("MOODJOURNAL_EMAIL must be set");
    let password = env::var("MOODJOURNAL_PASSWORD").expect("MOODJOURNAL_PASSWORD must be set");

    let config = JournalConfig::from_env()?.with_session_file(None);
    // Back off gently instead of the flat two seconds
    let options = ClientOptions::default().with_mood_retry(RetryPolicy::exponential(
        8,
        Duration::from_millis(500),
        2.0,
        Duration::from_secs(5),
    ));
    let journal = MoodJournal::from_config(config, options)?;
    journal.auth().login(&email, &password).await?;

    println!("Starting Mood example");

    let mut form = EntryForm::new(
        "A good day",
        "Finished the project, went for a long walk and called an old friend.",
    );
    journal.mutations().create(&mut form).await?;
    let entry = journal
        .entries()
        .sorted()
        .into_iter()
        .next()
        .expect("the new entry should be listed");

    let workflow = MoodRetrieval::new(journal.gateway().clone(), journal.options.mood_retry.clone());
    let mut phases = workflow.subscribe();
    tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            println!("phase: {:?}", phases.borrow_and_update().clone());
        }
    });

    // Give up after 30 seconds whatever the policy says
    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        deadline.cancel();
    });

    match workflow.run(&entry.id, &cancel).await {
        Ok(report) => {
            println!(
                "{}: {} ({:.2}) after {} attempt(s)",
                report.entry.title,
                report.mood.overall_sentiment,
                report.mood.sentiment_score,
                report.attempts
            );
            if let Some(emotion) = report.mood.dominant_emotion() {
                println!("Dominant emotion: {}", emotion.label);
            }
        }
        Err(e) => println!("No analysis: {}", e.user_message()),
    }

    println!("Mood example completed");
    Ok(())
}
