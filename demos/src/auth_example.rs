use dotenv::dotenv;
use moodjournal::auth::ProfileForm;
use moodjournal::prelude::*;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    pretty_env_logger::init();

    // MOODJOURNAL_API_URL defaults to the local development server
    let config = JournalConfig::from_env()?.with_session_file(None);
    let journal = MoodJournal::from_config(config, ClientOptions::default())?;

    println!("Starting Auth example");

    // Generate a unique email for testing
    let unique_id = Uuid::new_v4().to_string();
    let test_email = format!("test-user-{}@example.com", unique_id);
    let test_password = "securePassword123!";

    println!("Signing up a new user with email: {}", test_email);
    let session = journal
        .auth()
        .signup("Example User", &test_email, test_password)
        .await?;
    println!("Signed up, user: {:?}", session.user);

    journal.auth().logout()?;
    println!("Logged out, authenticated: {}", journal.auth().is_authenticated());

    println!("\nSigning in again");
    journal.auth().login(&test_email, test_password).await?;

    let profile = journal.auth().profile().await?;
    println!("Profile: {} <{}>", profile.name, profile.email);

    println!("\nRenaming the user and changing the password");
    let mut form = ProfileForm::new("Renamed Example User").with_password_change(
        test_password,
        "anotherPassword456!",
        "anotherPassword456!",
    );
    journal.auth().update_profile(&mut form).await?;

    // A wrong password is reported with the server's message
    match journal.auth().login(&test_email, test_password).await {
        Ok(_) => println!("Old password still works?"),
        Err(e) => println!("Old password rejected: {}", e.user_message()),
    }

    println!("Auth example completed");
    Ok(())
}
