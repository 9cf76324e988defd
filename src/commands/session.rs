//! Session commands: login, logout, whoami.

use std::sync::Arc;

use clap::Args;

use tollgate_auth::AuthRuntime;
use tollgate_auth::session::{Credentials, Subject};
use tollgate_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for `login`
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Login name
    #[arg(short, long)]
    pub username: String,
    /// Password
    #[arg(short, long)]
    pub password: String,
}

fn print_subject(subject: &Subject, roles: &[String], format: OutputFormat) {
    output::print_item(
        subject,
        &[
            ("subject", subject.id.to_string()),
            ("username", subject.username.clone()),
            ("name", subject.display_name.clone()),
            ("active roles", roles.join(", ")),
            ("expires_at", subject.expires_at.to_rfc3339()),
        ],
        format,
    );
}

/// Log in and persist the session
pub async fn login(
    args: &LoginArgs,
    runtime: &Arc<AuthRuntime>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let surface = runtime.open_surface();
    let subject = surface
        .login(&Credentials::new(&args.username, &args.password))
        .await?;
    let roles: Vec<String> = surface
        .effective_roles()
        .into_iter()
        .map(|r| r.code.to_string())
        .collect();
    if format == OutputFormat::Table {
        output::print_success(&format!("Logged in as {}", subject.username));
    }
    print_subject(&subject, &roles, format);
    Ok(())
}

/// End the persisted session
pub fn logout(runtime: &Arc<AuthRuntime>) -> Result<(), AppError> {
    let surface = runtime.open_surface();
    let restored = surface.restore()?;
    surface.logout()?;
    match restored {
        Some(subject) => output::print_success(&format!("Logged out {}", subject.username)),
        None => output::print_warning("No active session"),
    }
    Ok(())
}

/// Show the persisted session
pub fn whoami(runtime: &Arc<AuthRuntime>, format: OutputFormat) -> Result<(), AppError> {
    let surface = runtime.open_surface();
    let Some(subject) = surface.restore()? else {
        output::print_warning("Not logged in");
        return Ok(());
    };
    let roles: Vec<String> = surface
        .effective_roles()
        .into_iter()
        .map(|r| r.code.to_string())
        .collect();
    print_subject(&subject, &roles, format);
    Ok(())
}
