//! Token validation command.

use clap::Args;
use serde::Serialize;

use tollgate_auth::AuthRuntime;
use tollgate_auth::jwt::ValidationOutcome;
use tollgate_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for `validate`
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Bearer token
    pub token: String,
}

#[derive(Serialize)]
struct ValidationOutput {
    valid: bool,
    reason: Option<String>,
    subject_id: Option<String>,
    roles: Vec<String>,
    expires_at: Option<String>,
}

/// Verify a token and print what it establishes
pub fn execute(
    args: &ValidateArgs,
    runtime: &AuthRuntime,
    format: OutputFormat,
) -> Result<(), AppError> {
    let out = match runtime.validator().validate(&args.token) {
        ValidationOutcome::Valid(session) => ValidationOutput {
            valid: true,
            reason: None,
            subject_id: Some(session.subject_id.to_string()),
            roles: session.role_codes.iter().map(ToString::to_string).collect(),
            expires_at: Some(session.expires_at.to_rfc3339()),
        },
        ValidationOutcome::Invalid(reason) => ValidationOutput {
            valid: false,
            reason: Some(reason.to_string()),
            subject_id: None,
            roles: Vec::new(),
            expires_at: None,
        },
    };

    let mut pairs = vec![("valid", out.valid.to_string())];
    if let Some(reason) = &out.reason {
        pairs.push(("reason", reason.clone()));
    }
    if let Some(subject_id) = &out.subject_id {
        pairs.push(("subject", subject_id.clone()));
        pairs.push(("roles", out.roles.join(", ")));
    }
    if let Some(expires_at) = &out.expires_at {
        pairs.push(("expires_at", expires_at.clone()));
    }
    output::print_item(&out, &pairs, format);
    Ok(())
}
