//! Postdeck CLI - sign in to the postdeck dashboard from a terminal.
//!
//! Stands in for the dashboard's login and sign-up forms and its route
//! guards: every command goes through the same `AuthService` the web
//! front end uses, against the session store picked in the config.

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use postdeck_core::{AuthService, AuthState, Config, SessionStore, SignInResponse, SignUpResponse};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the session encryption passphrase
const PASSPHRASE_ENV: &str = "POSTDECK_SESSION_PASSPHRASE";

/// Log file name used when `log_file` points at a directory
const DEFAULT_LOG_FILE: &str = "postdeck.log";

#[derive(Debug, Parser)]
#[command(name = "postdeck", version, about = "Sign in to the postdeck dashboard")]
struct Cli {
    /// Print JSON responses instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and start a 7-day session
    SignIn {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Check that an account could be created
    SignUp {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// End the current session
    SignOut,
    /// Show who is signed in (exit code 1 when nobody is)
    Status,
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr unless `log_file` is configured. The returned guard
/// must stay alive until exit so buffered file output is flushed.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.log_file {
        Some(ref path) => {
            let (dir, file_name) = split_log_path(path);
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn split_log_path(path: &Path) -> (&Path, &str) {
    if path.is_dir() {
        return (path, DEFAULT_LOG_FILE);
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    (dir, file_name)
}

fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    let _guard = init_tracing(&config);

    let passphrase = std::env::var(PASSPHRASE_ENV).ok().filter(|p| !p.is_empty());
    if passphrase.is_some() && config.ensure_encryption_salt() {
        config.save().context("Failed to save encryption salt")?;
        info!("Generated session encryption salt");
    }

    if !config.session_backend.is_persistent() {
        warn!("session_backend is \"memory\": sessions end when this command exits");
    }

    let auth = config.auth_service(passphrase.as_deref())?;
    run(cli, &auth).map(exit_code)
}

/// Dispatch one command. Returns whether it succeeded.
fn run<S: SessionStore>(cli: Cli, auth: &AuthService<S>) -> Result<bool> {
    match cli.command {
        Command::SignIn { email, password } => {
            let password = read_password(password)?;
            let response = SignInResponse::from(auth.sign_in(&email, &password));

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if let Some(ref user) = response.user {
                println!("Signed in as {} <{}>", user.name, user.email);
            } else if let Some(ref error) = response.error {
                eprintln!("Sign-in failed: {}", error);
            }
            Ok(response.success)
        }
        Command::SignUp {
            name,
            email,
            password,
        } => {
            let password = read_password(password)?;
            let response = SignUpResponse::from(auth.sign_up(&name, &email, &password));

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if let Some(ref user_id) = response.user_id {
                println!("Account {} accepted (demo mode: not saved)", user_id);
            } else if let Some(ref error) = response.error {
                eprintln!("Sign-up failed: {}", error);
            }
            Ok(response.success)
        }
        Command::SignOut => {
            auth.sign_out();
            if !cli.json {
                println!("Signed out");
            }
            Ok(true)
        }
        Command::Status => match auth.state() {
            AuthState::Authenticated(session) => {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&session)?);
                } else {
                    let days = session.days_until_expiry_at(Utc::now());
                    println!(
                        "Signed in as {} <{}> (session expires in {} day{})",
                        session.user.name,
                        session.user.email,
                        days,
                        if days == 1 { "" } else { "s" }
                    );
                }
                Ok(true)
            }
            AuthState::Anonymous => {
                if cli.json {
                    println!("null");
                } else {
                    println!("Not signed in");
                }
                Ok(false)
            }
        },
    }
}

fn read_password(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
