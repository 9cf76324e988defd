//! Decision commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;

use tollgate_auth::{AuthRuntime, DecisionQuery, Verdict};
use tollgate_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for `check`
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// What to check
    #[command(subcommand)]
    pub command: CheckCommand,
}

/// Decision kinds
#[derive(Debug, Subcommand)]
pub enum CheckCommand {
    /// May the subject enter a screen?
    Screen {
        /// Screen identifier
        screen_id: String,
    },
    /// May the subject perform an operation on a resource?
    Resource {
        /// Resource name
        resource: String,
        /// CREATE, READ, UPDATE, DELETE or BULK
        operation: String,
    },
    /// Which tier does the subject get on a field?
    Field {
        /// Resource name
        resource: String,
        /// Field name
        field: String,
    },
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    query: &'a DecisionQuery,
    verdict: &'a Verdict,
}

/// Answer a query for the persisted session's subject
pub fn execute(
    args: &CheckArgs,
    runtime: &Arc<AuthRuntime>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let query = match &args.command {
        CheckCommand::Screen { screen_id } => DecisionQuery::screen(screen_id.as_str()),
        CheckCommand::Resource {
            resource,
            operation,
        } => DecisionQuery::parse_resource(resource.as_str(), operation)?,
        CheckCommand::Field { resource, field } => {
            DecisionQuery::field(resource.as_str(), field.as_str())
        }
    };

    let surface = runtime.open_surface();
    if surface.restore()?.is_none() {
        return Err(AppError::session("Not logged in; run `tollgate login` first"));
    }
    let verdict = surface.decide(&query)?;

    let answer = match &verdict {
        Verdict::Access { granted, .. } => if *granted { "ALLOW" } else { "DENY" }.to_string(),
        Verdict::Field { tier, .. } => tier.to_string(),
    };
    output::print_item(
        &CheckOutput {
            query: &query,
            verdict: &verdict,
        },
        &[
            ("query", query.to_string()),
            ("answer", answer),
            ("basis", format!("{:?}", verdict.basis())),
        ],
        format,
    );
    Ok(())
}
