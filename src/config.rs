use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use std::io::Write;

use crate::auth::SecureTokenEndpoints;

const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Wellness tracker API client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the wellness backend API
    #[arg(short = 'u', long, env = "WELLNESS_API_URL")]
    pub api_url: Option<String>,

    /// Public API key of the identity provider
    #[arg(short = 'k', long, env = "IDENTITY_API_KEY")]
    pub api_key: Option<String>,

    /// Identity toolkit base URL (sign-in)
    #[arg(long, env = "IDENTITY_URL", default_value = DEFAULT_IDENTITY_URL)]
    pub identity_url: String,

    /// Secure token base URL (refresh)
    #[arg(long, env = "SECURE_TOKEN_URL", default_value = DEFAULT_SECURE_TOKEN_URL)]
    pub secure_token_url: String,

    /// Account email
    #[arg(short, long, env = "WELLNESS_EMAIL")]
    pub email: Option<String>,

    /// Account password (prompted when omitted)
    #[arg(long, env = "WELLNESS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    /// Share one credential refresh between concurrent 401s
    #[arg(long, env = "COALESCE_REFRESH")]
    pub coalesce_refresh: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Stats, today's plan and badges in one view
    Dashboard,
    /// Today's plan
    Plan,
    /// Mark a task as completed
    CompleteTask { id: String },
    /// Mark a task as skipped
    SkipTask { id: String },
    /// Recent mood logs
    Moods {
        #[arg(long, default_value = "7")]
        limit: u32,
    },
    /// Log a mood
    LogMood {
        /// happy, sad, stressed, anxious or neutral
        #[arg(long)]
        mood: String,
        #[arg(long, default_value = "5")]
        energy: u8,
        #[arg(long, default_value = "5")]
        stress: u8,
        #[arg(long)]
        note: Option<String>,
    },
    /// Recent journal entries
    Journal {
        #[arg(long, default_value = "5")]
        limit: u32,
    },
    /// Write a journal entry
    Write { text: String },
    /// Send a message to the chat assistant
    Chat {
        message: String,
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Suggested chat prompts
    Suggestions,
    /// Meditation library
    Meditations,
    /// Current user profile
    Profile,
    /// Raw authenticated GET, prints status and body
    Get { path: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    // Backend
    pub api_base_url: String,

    // Identity provider
    pub identity_api_key: String,
    pub identity_url: String,
    pub secure_token_url: String,

    // Account
    pub email: Option<String>,
    pub password: Option<String>,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Session
    pub coalesce_refresh: bool,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Build configuration with priority: CLI > ENV > defaults
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = Config {
            api_base_url: args
                .api_url
                .clone()
                .or_else(|| std::env::var("WELLNESS_API_URL").ok())
                .context("WELLNESS_API_URL is required (use -u or set WELLNESS_API_URL env var)")?,

            identity_api_key: args
                .api_key
                .clone()
                .or_else(|| std::env::var("IDENTITY_API_KEY").ok())
                .context("IDENTITY_API_KEY is required (use -k or set IDENTITY_API_KEY env var)")?,

            identity_url: args.identity_url.clone(),
            secure_token_url: args.secure_token_url.clone(),

            email: args.email.clone(),
            password: args.password.clone(),

            http_max_connections: std::env::var("HTTP_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            http_connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            http_request_timeout: args.http_timeout,

            coalesce_refresh: args.coalesce_refresh,

            log_level: args.log_level.clone(),
            log_format: parse_log_format(&args.log_format),
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_base_url)
            .with_context(|| format!("WELLNESS_API_URL is not a valid URL: {}", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("WELLNESS_API_URL must use http or https: {}", self.api_base_url);
        }

        if self.identity_api_key.trim().is_empty() {
            anyhow::bail!("IDENTITY_API_KEY cannot be empty");
        }

        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        Ok(())
    }

    /// Endpoints for the secure token identity provider
    pub fn identity_endpoints(&self) -> SecureTokenEndpoints {
        SecureTokenEndpoints {
            identity_url: self.identity_url.clone(),
            secure_token_url: self.secure_token_url.clone(),
            api_key: self.identity_api_key.clone(),
        }
    }
}

/// Parse log format from string
fn parse_log_format(s: &str) -> LogFormat {
    match s.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

// === Interactive Setup ===

/// Check if interactive setup is needed (no .env file and missing required values)
pub fn needs_interactive_setup() -> bool {
    let env_file_exists = std::path::Path::new(".env").exists();

    let has_api_url = std::env::var("WELLNESS_API_URL").is_ok();
    let has_api_key = std::env::var("IDENTITY_API_KEY").is_ok();

    !env_file_exists && (!has_api_url || !has_api_key)
}

/// Run interactive setup to collect required configuration
pub fn run_interactive_setup() -> Result<InteractiveConfig> {
    println!();
    println!("Wellness client - first time setup");
    println!("No configuration found. Let's point the client at your backend.");
    println!();

    let api_url: String = Input::new()
        .with_prompt("Backend API URL (WELLNESS_API_URL)")
        .default("http://localhost:5000".to_string())
        .interact_text()
        .context("Failed to read WELLNESS_API_URL")?;

    let api_key: String = Input::new()
        .with_prompt("Identity provider web API key (IDENTITY_API_KEY)")
        .interact_text()
        .context("Failed to read IDENTITY_API_KEY")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("IDENTITY_API_KEY cannot be empty");
    }

    let email: String = Input::new()
        .with_prompt("Account email (WELLNESS_EMAIL)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read WELLNESS_EMAIL")?;

    let config = InteractiveConfig {
        api_url,
        api_key,
        email: Some(email).filter(|e| !e.trim().is_empty()),
    };

    println!();
    let save_to_env = Confirm::new()
        .with_prompt("Save configuration to .env file?")
        .default(true)
        .interact()
        .context("Failed to read save confirmation")?;

    if save_to_env {
        save_env_file(&config)?;
        println!("Configuration saved to .env file");
    }
    println!();

    Ok(config)
}

/// Configuration collected from interactive setup
#[derive(Debug, Clone)]
pub struct InteractiveConfig {
    pub api_url: String,
    pub api_key: String,
    pub email: Option<String>,
}

/// Render the .env contents for an interactive setup
fn render_env_file(config: &InteractiveConfig) -> String {
    format!(
        r#"# Wellness client configuration
# Generated by interactive setup

# Backend API base URL (required)
WELLNESS_API_URL={}

# Identity provider web API key (required)
IDENTITY_API_KEY={}

# Account email (password is prompted, never stored)
WELLNESS_EMAIL={}

# HTTP request timeout in seconds
HTTP_REQUEST_TIMEOUT=30

# Logging (trace, debug, info, warn, error)
LOG_LEVEL=warn
"#,
        config.api_url,
        config.api_key,
        config.email.as_deref().unwrap_or_default(),
    )
}

/// Save configuration to .env file
fn save_env_file(config: &InteractiveConfig) -> Result<()> {
    let mut file = std::fs::File::create(".env").context("Failed to create .env file")?;
    file.write_all(render_env_file(config).as_bytes())
        .context("Failed to write .env file")?;
    Ok(())
}
