use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{Input, Password};
use serde::Serialize;
use std::sync::Arc;

use wellness_client::api::WellnessApi;
use wellness_client::auth::{IdentityProvider, SecureTokenProvider};
use wellness_client::config::{self, CliArgs, Command, Config, LogFormat};
use wellness_client::http_client::{AuthenticatedClient, RequestOptions};
use wellness_client::models::{Mood, MoodLogRequest};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let mut args = CliArgs::parse();

    // First run without .env and without the required values
    if config::needs_interactive_setup() && (args.api_url.is_none() || args.api_key.is_none()) {
        let interactive_config = config::run_interactive_setup()?;
        args.api_url.get_or_insert(interactive_config.api_url);
        args.api_key.get_or_insert(interactive_config.api_key);
        if args.email.is_none() {
            args.email = interactive_config.email;
        }
    }

    let config = Config::from_args(&args)?;
    config.validate()?;

    init_tracing(&config);

    tracing::debug!(api_url = %config.api_base_url, "Configuration loaded");

    let email = match config.email.clone() {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email")?,
    };
    let password = match config.password.clone() {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let provider: Arc<dyn IdentityProvider> = Arc::new(SecureTokenProvider::new(
        reqwest::Client::new(),
        config.identity_endpoints(),
        email,
        password,
    ));
    let client = AuthenticatedClient::init(&config, provider)?;

    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(reason = ?event.reason, signed_in = event.principal.is_some(), "Session changed");
        }
    });

    let principal = client
        .session()
        .sign_in()
        .await
        .context("Sign-in failed, check your email and password")?;
    tracing::info!("Welcome, {}", principal.greeting_name());

    let api = WellnessApi::new(client.clone());
    let outcome = run_command(&api, &args.command).await;

    client.dispose().await;
    outcome
}

/// Initialize logging on stderr; stdout carries command output
fn init_tracing(config: &Config) {
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run_command(api: &WellnessApi, command: &Command) -> Result<()> {
    match command {
        Command::Dashboard => {
            let (stats, plan, badges) =
                futures::join!(api.gamification_stats(), api.daily_plan(), api.badges());
            print_json(&serde_json::json!({
                "stats": stats?,
                "plan": plan?,
                "badges": badges?,
            }))
        }
        Command::Plan => print_json(&api.daily_plan().await?),
        Command::CompleteTask { id } => print_json(&api.complete_task(id).await?),
        Command::SkipTask { id } => print_json(&api.skip_task(id).await?),
        Command::Moods { limit } => print_json(&api.mood_logs(*limit).await?),
        Command::LogMood {
            mood,
            energy,
            stress,
            note,
        } => {
            let mood: Mood = mood.parse()?;
            let mut request = MoodLogRequest::new(mood, *energy, *stress);
            if let Some(note) = note {
                request = request.with_note(note.as_str());
            }
            print_json(&api.log_mood(&request).await?)
        }
        Command::Journal { limit } => print_json(&api.journal_entries(*limit).await?),
        Command::Write { text } => print_json(&api.create_journal_entry(text).await?),
        Command::Chat {
            message,
            conversation,
        } => print_json(&api.send_chat(message, conversation.clone()).await?),
        Command::Suggestions => print_json(&api.chat_suggestions().await?),
        Command::Meditations => print_json(&api.meditations().await?),
        Command::Profile => print_json(&api.profile().await?),
        Command::Get { path } => {
            let response = api
                .client()
                .request_authenticated(path, RequestOptions::get())
                .await?;
            let status = response.status();
            let body = response.text().await?;
            println!("{}", status);
            println!("{}", body);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}
