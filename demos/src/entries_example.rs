use std::env;

use dotenv::dotenv;
use moodjournal::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let email = env::var("MOODJOURNAL_EMAIL").expect("MOODJOURNAL_EMAIL must be set");
    let password = env::var("MOODJOURNAL_PASSWORD").expect("MOODJOURNAL_PASSWORD must be set");

    let config = JournalConfig::from_env()?.with_session_file(None);
    let journal = MoodJournal::from_config(config, ClientOptions::default())?;
    journal.auth().login(&email, &password).await?;

    println!("Starting Entries example");

    // Validation happens locally; nothing is sent
    let mut empty = EntryForm::new("", "no title");
    if let Err(e) = journal.mutations().create(&mut empty).await {
        println!("Rejected locally: {}", e.user_message());
    }

    let mut form = EntryForm::new("Example entry", "Wrote this from the Rust client. Feeling great!");
    let entries = journal.mutations().create(&mut form).await?;
    println!("Created. The server now has {} entries", entries.len());

    let created = journal
        .entries()
        .filtered("rust client")
        .into_iter()
        .next()
        .expect("the new entry should be listed");
    println!("Found entry {} dated {}", created.id, created.date);

    let mut edit = EntryForm::new("Example entry (edited)", created.text.clone());
    journal.mutations().update(&created.id, &mut edit).await?;

    for entry in journal.entries().sorted() {
        println!("{:>5}  {}  {}", entry.id, entry.date, entry.title);
    }

    // Skip the prompt; a real front end would ask
    match journal.mutations().delete(&created.id, &|_: &str| true).await? {
        DeleteOutcome::Deleted(remaining) => println!("Deleted, {} entries left", remaining.len()),
        DeleteOutcome::Declined => println!("Kept the entry"),
    }

    println!("Entries example completed");
    Ok(())
}
