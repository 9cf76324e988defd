//! Decision queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use tollgate_core::result::AppResult;
use tollgate_core::types::{Operation, RoleCode};

/// A question the engine can answer. Also the decision cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionQuery {
    /// May the subject enter this screen?
    Screen { screen_id: String },
    /// May the subject perform this operation on this resource?
    Resource {
        resource: String,
        operation: Operation,
    },
    /// Which tier does the subject get on this field?
    Field { resource: String, field: String },
}

impl DecisionQuery {
    pub fn screen(screen_id: impl Into<String>) -> Self {
        Self::Screen {
            screen_id: screen_id.into(),
        }
    }

    pub fn resource(resource: impl Into<String>, operation: Operation) -> Self {
        Self::Resource {
            resource: resource.into(),
            operation,
        }
    }

    /// A resource query whose operation arrives as text, e.g. from a
    /// request. An unknown operation is a validation error.
    pub fn parse_resource(resource: impl Into<String>, operation: &str) -> AppResult<Self> {
        Ok(Self::resource(resource, operation.parse()?))
    }

    pub fn field(resource: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Field {
            resource: resource.into(),
            field: field.into(),
        }
    }

    /// Whether the answer is a field tier rather than allow/deny.
    pub fn is_field(&self) -> bool {
        matches!(self, Self::Field { .. })
    }
}

impl fmt::Display for DecisionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Screen { screen_id } => write!(f, "screen:{screen_id}"),
            Self::Resource {
                resource,
                operation,
            } => write!(f, "resource:{resource}:{operation}"),
            Self::Field { resource, field } => write!(f, "field:{resource}.{field}"),
        }
    }
}

/// Decision cache key: a query together with the role codes it was
/// answered for.
///
/// Two surfaces of one subject can briefly disagree on the role set while
/// a reassignment propagates; keying by roles keeps their answers apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionKey {
    pub roles: Vec<RoleCode>,
    pub query: DecisionQuery,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource() {
        let query = DecisionQuery::parse_resource("tasks", "delete").unwrap();
        assert_eq!(query, DecisionQuery::resource("tasks", Operation::Delete));
        assert_eq!(query.to_string(), "resource:tasks:DELETE");

        let err = DecisionQuery::parse_resource("tasks", "ARCHIVE").unwrap_err();
        assert_eq!(err.kind, tollgate_core::error::ErrorKind::Validation);
    }
}
