//! Password hashing for the local identity provider.

pub mod hasher;

pub use hasher::PasswordHasher;
