//! Permission value types shared by the store, the engine and config.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// A CRUD-style operation on a named resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Create new records.
    Create,
    /// Read records.
    Read,
    /// Modify existing records.
    Update,
    /// Remove records.
    Delete,
    /// Act on many records at once.
    Bulk,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Operation; 5] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::Bulk,
    ];

    /// Return the operation as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Bulk => "BULK",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "READ" => Ok(Self::Read),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "BULK" => Ok(Self::Bulk),
            _ => Err(AppError::validation(format!("Unknown operation: '{s}'"))),
        }
    }
}

/// Visibility/editability tier of a single field.
///
/// Totally ordered: `Hidden < Read < Edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldTier {
    /// Not rendered at all, label included.
    Hidden,
    /// Rendered but not editable.
    Read,
    /// Rendered and editable.
    Edit,
}

impl FieldTier {
    /// Return the tier as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hidden => "HIDDEN",
            Self::Read => "READ",
            Self::Edit => "EDIT",
        }
    }

    /// Whether a field at this tier is shown.
    pub fn is_visible(&self) -> bool {
        *self >= Self::Read
    }

    /// Whether a field at this tier accepts input.
    pub fn is_editable(&self) -> bool {
        *self == Self::Edit
    }
}

impl fmt::Display for FieldTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIDDEN" => Ok(Self::Hidden),
            "READ" => Ok(Self::Read),
            "EDIT" => Ok(Self::Edit),
            _ => Err(AppError::validation(format!("Unknown field tier: '{s}'"))),
        }
    }
}
