//! Role listing command.

use serde::Serialize;
use tabled::Tabled;

use tollgate_auth::AuthRuntime;
use tollgate_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Role display row
#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    /// Code
    code: String,
    /// Name
    name: String,
    /// Level
    level: i32,
    /// Active
    active: String,
    /// Users
    users: usize,
}

/// List roles ordered by level
pub fn execute(runtime: &AuthRuntime, format: OutputFormat) -> Result<(), AppError> {
    let registry = runtime.registry();
    let rows: Vec<RoleRow> = registry
        .list()
        .into_iter()
        .map(|role| RoleRow {
            users: registry.user_count(&role.code),
            code: role.code.to_string(),
            name: role.name,
            level: role.level,
            active: if role.active { "✓" } else { "✗" }.to_string(),
        })
        .collect();
    output::print_list(&rows, format);
    Ok(())
}
