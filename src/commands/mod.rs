//! CLI command definitions and dispatch.

pub mod check;
pub mod password;
pub mod roles;
pub mod session;
pub mod validate;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use tollgate_auth::AuthRuntime;
use tollgate_auth::session::FileSessionStore;
use tollgate_core::config::AppConfig;
use tollgate_core::error::AppError;

use crate::output::OutputFormat;

/// Tollgate — session validation and authorization decisions
#[derive(Debug, Parser)]
#[command(name = "tollgate", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Verify a session token
    Validate(validate::ValidateArgs),
    /// Log in with the local identity provider
    Login(session::LoginArgs),
    /// End the persisted session
    Logout,
    /// Show the persisted session's subject
    Whoami,
    /// Ask for a decision as the logged-in subject
    Check(check::CheckArgs),
    /// List roles
    Roles,
    /// Hash a password for a catalog user entry
    HashPassword(password::HashPasswordArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::HashPassword(args) => password::execute(args, self.format),
            Commands::Validate(args) => validate::execute(args, &*build_runtime(config)?, self.format),
            Commands::Login(args) => session::login(args, &build_runtime(config)?, self.format).await,
            Commands::Logout => session::logout(&build_runtime(config)?),
            Commands::Whoami => session::whoami(&build_runtime(config)?, self.format),
            Commands::Check(args) => check::execute(args, &build_runtime(config)?, self.format),
            Commands::Roles => roles::execute(&*build_runtime(config)?, self.format),
        }
    }
}

/// Build a runtime whose session survives between invocations.
fn build_runtime(config: AppConfig) -> Result<Arc<AuthRuntime>, AppError> {
    let sessions = Arc::new(FileSessionStore::new(&config.session.file_path));
    AuthRuntime::builder(config)
        .with_session_store(sessions)
        .build()
}
