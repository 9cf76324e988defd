//! Policy catalog document.
//!
//! The catalog is what an administrator edits: role definitions, screen,
//! resource and field grants, plus local users for the development
//! identity provider. Role codes are kept as written here and validated
//! when a [`PermissionSnapshot`](super::PermissionSnapshot) is built.
//!
//! ```toml
//! [[roles]]
//! code = "MANAGER"
//! name = "Manager"
//! level = 10
//!
//! [[screens]]
//! role = "MANAGER"
//! screens = ["dashboard", "billing"]
//!
//! [[resources]]
//! role = "MANAGER"
//! resource = "tasks"
//! operations = ["READ", "UPDATE"]
//!
//! [[fields]]
//! role = "MANAGER"
//! resource = "tasks"
//! field = "budget"
//! tier = "READ"
//! ```

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::types::{FieldTier, Operation, RoleCode};

use crate::registry::NewRole;

/// A role as declared in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl RoleDefinition {
    /// Convert into a registry input, validating the code.
    pub fn to_new_role(&self) -> AppResult<NewRole> {
        Ok(NewRole {
            code: RoleCode::parse(&self.code)?,
            name: self.name.clone(),
            description: self.description.clone(),
            level: self.level,
            active: self.active,
        })
    }
}

/// Screens a role may enter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenGrant {
    pub role: String,
    pub screens: Vec<String>,
}

/// Operations a role may perform on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGrant {
    pub role: String,
    pub resource: String,
    pub operations: Vec<Operation>,
}

/// Tier a role gets on one field of a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldGrant {
    pub role: String,
    pub resource: String,
    pub field: String,
    pub tier: FieldTier,
}

/// A user known to the local identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalUser {
    /// Login name.
    pub username: String,
    /// Subject identifier placed in issued tokens.
    pub subject_id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Argon2id PHC hash of the password.
    pub password_hash: String,
    /// Role codes placed in issued tokens.
    pub roles: Vec<String>,
}

/// The whole permission catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyCatalog {
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
    #[serde(default)]
    pub screens: Vec<ScreenGrant>,
    #[serde(default)]
    pub resources: Vec<ResourceGrant>,
    #[serde(default)]
    pub fields: Vec<FieldGrant>,
    #[serde(default)]
    pub users: Vec<LocalUser>,
}

impl PolicyCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a catalog file. The format follows the extension (TOML, JSON
    /// or YAML).
    pub fn load(path: &str) -> AppResult<Self> {
        let catalog: Self = Config::builder()
            .add_source(File::with_name(path).required(true))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to read catalog '{path}': {e}")))?
            .try_deserialize()
            .map_err(|e| {
                AppError::configuration(format!("Failed to parse catalog '{path}': {e}"))
            })?;

        info!(
            path,
            roles = catalog.roles.len(),
            screens = catalog.screens.len(),
            resources = catalog.resources.len(),
            fields = catalog.fields.len(),
            "Policy catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses a catalog from TOML text.
    pub fn from_toml(text: &str) -> AppResult<Self> {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(AppError::from)
    }

    /// Adds an active role.
    pub fn with_role(mut self, code: &str, name: &str, level: i32) -> Self {
        self.roles.push(RoleDefinition {
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            level,
            active: true,
        });
        self
    }

    /// Grants screens to a role.
    pub fn with_screens(mut self, role: &str, screens: &[&str]) -> Self {
        self.screens.push(ScreenGrant {
            role: role.to_string(),
            screens: screens.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Grants resource operations to a role.
    pub fn with_resource(mut self, role: &str, resource: &str, operations: &[Operation]) -> Self {
        self.resources.push(ResourceGrant {
            role: role.to_string(),
            resource: resource.to_string(),
            operations: operations.to_vec(),
        });
        self
    }

    /// Sets a role's tier on a field.
    pub fn with_field(mut self, role: &str, resource: &str, field: &str, tier: FieldTier) -> Self {
        self.fields.push(FieldGrant {
            role: role.to_string(),
            resource: resource.to_string(),
            field: field.to_string(),
            tier,
        });
        self
    }

    /// Adds a local user.
    pub fn with_user(mut self, user: LocalUser) -> Self {
        self.users.push(user);
        self
    }

    /// Every screen id that any role is granted, sorted.
    pub fn screen_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .screens
            .iter()
            .flat_map(|grant| grant.screens.iter().cloned())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Finds a local user by login name.
    pub fn find_user(&self, username: &str) -> Option<&LocalUser> {
        self.users.iter().find(|u| u.username == username)
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[roles]]
code = "manager"
name = "Manager"
level = 10

[[roles]]
code = "USER"
name = "User"
level = 20
active = false

[[screens]]
role = "MANAGER"
screens = ["billing", "dashboard"]

[[screens]]
role = "USER"
screens = ["dashboard"]

[[resources]]
role = "MANAGER"
resource = "tasks"
operations = ["READ", "DELETE"]

[[fields]]
role = "USER"
resource = "tasks"
field = "budget"
tier = "READ"
"#;

    #[test]
    fn test_from_toml() {
        let catalog = PolicyCatalog::from_toml(SAMPLE).unwrap();
        assert_eq!(catalog.roles.len(), 2);
        assert!(!catalog.roles[1].active);
        assert_eq!(
            catalog.resources[0].operations,
            vec![Operation::Read, Operation::Delete]
        );
        assert_eq!(catalog.fields[0].tier, FieldTier::Read);
        assert_eq!(catalog.screen_ids(), vec!["billing", "dashboard"]);
    }

    #[test]
    fn test_role_definition_normalizes_code() {
        let catalog = PolicyCatalog::from_toml(SAMPLE).unwrap();
        let role = catalog.roles[0].to_new_role().unwrap();
        assert_eq!(role.code.as_str(), "MANAGER");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = PolicyCatalog::load(path.to_str().unwrap()).unwrap();
        assert_eq!(catalog.screens.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PolicyCatalog::load("/nonexistent/catalog.toml").unwrap_err();
        assert_eq!(err.kind, tollgate_core::error::ErrorKind::Configuration);
    }
}
