use dotenv::dotenv;
use moodjournal_session::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let dir = std::env::temp_dir().join("moodjournal-preferences-example");
    let store = SessionStore::open(dir.join("session.json"))?;

    println!("Starting Preferences example");

    // Another part of the program following changes
    let mut events = store.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("changed: {} -> {:?}", event.key, event.new_value);
        }
    });

    store.set_dark_mode(!store.dark_mode()?)?;
    store.set_font_preference("Georgia")?;

    println!("Dark mode: {}", store.dark_mode()?);
    println!("Font: {:?}", store.font_preference()?);

    drop(store);
    watcher.await?;

    println!("Preferences example completed");
    Ok(())
}
