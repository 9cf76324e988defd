//! Password hashing command.

use clap::Args;
use serde::Serialize;

use tollgate_auth::PasswordHasher;
use tollgate_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for `hash-password`
#[derive(Debug, Args)]
pub struct HashPasswordArgs {
    /// Plaintext password
    pub password: String,
}

#[derive(Serialize)]
struct HashOutput {
    password_hash: String,
}

/// Print an Argon2id hash suitable for `users[].password_hash`
pub fn execute(args: &HashPasswordArgs, format: OutputFormat) -> Result<(), AppError> {
    let hash = PasswordHasher::new().hash_password(&args.password)?;
    let out = HashOutput {
        password_hash: hash.clone(),
    };
    output::print_item(&out, &[("password_hash", hash)], format);
    Ok(())
}
