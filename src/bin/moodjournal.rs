#![cfg(feature = "cli")]

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use clap::{Arg, ArgMatches, Command};
use dotenv::dotenv;
use log::debug;

use moodjournal::auth::ProfileForm;
use moodjournal::entries::sort_newest_first;
use moodjournal::error::Result;
use moodjournal::mood::MoodRetrieval;
use moodjournal::prelude::*;

fn cli() -> Command<'static> {
    Command::new("moodjournal")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep a journal and read the mood analysis of your entries")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("login")
                .about("Sign in and remember the session")
                .arg(Arg::new("email").long("email").takes_value(true).required(true))
                .arg(Arg::new("password").long("password").takes_value(true).required(true)),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account")
                .arg(Arg::new("name").long("name").takes_value(true).required(true))
                .arg(Arg::new("email").long("email").takes_value(true).required(true))
                .arg(Arg::new("password").long("password").takes_value(true).required(true)),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(
            Command::new("list")
                .about("List entries, newest first")
                .arg(
                    Arg::new("search")
                        .long("search")
                        .short('s')
                        .takes_value(true)
                        .help("Only entries whose title, text or date contain this"),
                ),
        )
        .subcommand(
            Command::new("add")
                .about("Write a new entry")
                .arg(Arg::new("title").long("title").takes_value(true).required(true))
                .arg(Arg::new("text").long("text").takes_value(true).required(true))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .takes_value(true)
                        .help("YYYY-MM-DD, defaults to today"),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Replace the title and text of an entry")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("title").long("title").takes_value(true).required(true))
                .arg(Arg::new("text").long("text").takes_value(true).required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an entry")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("yes").long("yes").short('y').help("Do not ask for confirmation")),
        )
        .subcommand(
            Command::new("mood")
                .about("Show the mood analysis of an entry, waiting for it if needed")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("attempts").long("attempts").takes_value(true))
                .arg(Arg::new("delay-ms").long("delay-ms").takes_value(true)),
        )
        .subcommand(Command::new("profile").about("Show your profile"))
        .subcommand(
            Command::new("profile-update")
                .about("Change your name and optionally your password")
                .arg(Arg::new("name").long("name").takes_value(true).required(true))
                .arg(Arg::new("current-password").long("current-password").takes_value(true))
                .arg(Arg::new("new-password").long("new-password").takes_value(true))
                .arg(Arg::new("confirm-password").long("confirm-password").takes_value(true)),
        )
        .subcommand(
            Command::new("prefs")
                .about("Show or change display preferences")
                .arg(
                    Arg::new("dark-mode")
                        .long("dark-mode")
                        .takes_value(true)
                        .possible_values(["on", "off"]),
                )
                .arg(Arg::new("font").long("font").takes_value(true)),
        )
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches.value_of(name).unwrap_or_default()
}

fn parse_number<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>> {
    matches
        .value_of(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| Error::validation(format!("--{} must be a number", name)))
        })
        .transpose()
}

fn confirm_on_stdin(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_entries(entries: &[Entry]) {
    if entries.is_empty() {
        println!("No entries found.");
        return;
    }
    for entry in entries {
        println!("{:>5}  {}  {}", entry.id, entry.date, entry.title);
    }
}

fn print_report(report: &MoodReport) {
    let mood = &report.mood;
    println!("{} ({})", report.entry.title, report.entry.date);
    println!();
    println!("{}", report.entry.text);
    println!();
    println!(
        "Overall sentiment: {} ({:.2})",
        mood.overall_sentiment, mood.sentiment_score
    );
    for emotion in &mood.emotions {
        println!("  {:<12} {:>5.1}%", emotion.label, emotion.score * 100.0);
    }
    if !mood.summary.is_empty() {
        println!("\nSummary: {}", mood.summary);
    }
    if !mood.suggestions.is_empty() {
        println!("Suggestions: {}", mood.suggestions);
    }
}

async fn run_mood(journal: &MoodJournal, matches: &ArgMatches) -> Result<()> {
    let id = EntryId::from(value(matches, "id"));
    let defaults = journal.options.mood_retry.clone();
    let policy = match (
        parse_number::<u32>(matches, "attempts")?,
        parse_number::<u64>(matches, "delay-ms")?,
    ) {
        (None, None) => defaults,
        (attempts, delay) => RetryPolicy::fixed(
            attempts.unwrap_or(defaults.max_attempts),
            delay.map(Duration::from_millis).unwrap_or(defaults.delay_for(1)),
        ),
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let workflow = MoodRetrieval::new(journal.gateway().clone(), policy);
    let mut phases = workflow.subscribe();
    let progress = tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase = phases.borrow_and_update().clone();
            match phase {
                MoodPhase::Loading => eprintln!("Loading journal entry..."),
                MoodPhase::AnalyzingMood { attempt, .. } => {
                    eprintln!("Analyzing mood (attempt {})...", attempt)
                }
                _ => {}
            }
        }
    });

    let result = workflow.run(&id, &cancel).await;
    drop(workflow);
    if let Err(e) = progress.await {
        debug!("Progress printer stopped: {}", e);
    }

    print_report(&result?);
    Ok(())
}

async fn run(journal: &MoodJournal, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("login", m)) => {
            let session = journal.auth().login(value(m, "email"), value(m, "password")).await?;
            let name = session.user.map(|u| u.name).unwrap_or_default();
            println!("Welcome back, {}!", name);
        }
        Some(("signup", m)) => {
            journal
                .auth()
                .signup(value(m, "name"), value(m, "email"), value(m, "password"))
                .await?;
            println!("Account created.");
        }
        Some(("logout", _)) => {
            journal.auth().logout()?;
            println!("Logged Out Successfully!");
        }
        Some(("list", m)) => {
            journal.entries().reload().await?;
            let mut entries = match m.value_of("search") {
                Some(query) => journal.entries().filtered(query),
                None => journal.entries().entries(),
            };
            sort_newest_first(&mut entries);
            print_entries(&entries);
        }
        Some(("add", m)) => {
            let mut form = EntryForm::new(value(m, "title"), value(m, "text"));
            if let Some(date) = m.value_of("date") {
                form = form.with_date(date);
            }
            let entries = journal.mutations().create(&mut form).await?;
            println!("Entry saved. You now have {} entries.", entries.len());
        }
        Some(("edit", m)) => {
            let id = EntryId::from(value(m, "id"));
            let mut form = EntryForm::new(value(m, "title"), value(m, "text"));
            journal.mutations().update(&id, &mut form).await?;
            println!("Entry {} updated.", id);
        }
        Some(("delete", m)) => {
            let id = EntryId::from(value(m, "id"));
            let outcome = if m.is_present("yes") {
                journal.mutations().delete(&id, &|_: &str| true).await?
            } else {
                journal.mutations().delete(&id, &confirm_on_stdin).await?
            };
            match outcome {
                DeleteOutcome::Deleted(_) => println!("Entry {} deleted.", id),
                DeleteOutcome::Declined => println!("Nothing deleted."),
            }
        }
        Some(("mood", m)) => run_mood(journal, m).await?,
        Some(("profile", _)) => {
            let profile = journal.auth().profile().await?;
            println!("Name:  {}", profile.name);
            println!("Email: {}", profile.email);
        }
        Some(("profile-update", m)) => {
            let mut form = ProfileForm::new(value(m, "name")).with_password_change(
                value(m, "current-password"),
                value(m, "new-password"),
                value(m, "confirm-password"),
            );
            journal.auth().update_profile(&mut form).await?;
            println!("Settings saved successfully!");
        }
        Some(("prefs", m)) => {
            let session = journal.session();
            if let Some(mode) = m.value_of("dark-mode") {
                session.set_dark_mode(mode == "on")?;
            }
            if let Some(font) = m.value_of("font") {
                session.set_font_preference(font)?;
            }
            println!("Dark mode: {}", if session.dark_mode()? { "on" } else { "off" });
            println!(
                "Font:      {}",
                session.font_preference()?.unwrap_or_else(|| "default".to_string())
            );
        }
        _ => unreachable!("clap requires a subcommand"),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();

    let matches = cli().get_matches();

    let journal = match JournalConfig::from_env()
        .and_then(|config| MoodJournal::from_config(config, ClientOptions::default()))
    {
        Ok(journal) => journal,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = run(&journal, &matches).await {
        eprintln!("Error: {}", e.user_message());
        if e.route() == Some(Route::Login) {
            eprintln!("Run `moodjournal login` to sign in again.");
        }
        process::exit(1);
    }
}
