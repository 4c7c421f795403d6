use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Permissions an operator role can be granted, as `action:resource`.
pub const AVAILABLE_PERMISSIONS: &[&str] = &[
    "view:users",
    "create:users",
    "update:users",
    "delete:users",
    "view:roles",
    "create:roles",
    "update:roles",
    "delete:roles",
    "view:services",
    "create:services",
    "update:services",
    "delete:services",
    "view:files",
    "upload:files",
    "delete:files",
    "view:logs",
    "view:database",
    "update:database",
    "view:connections",
    "create:connections",
    "update:connections",
    "delete:connections",
];

/// An operator role owned by the role collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Weak handle to a role. Services store only the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleReference {
    pub id: i64,
    pub name: String,
}

impl From<&Role> for RoleReference {
    fn from(r: &Role) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    /// Case-insensitive substring match on name or description.
    pub fn matches_search(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Split `action:resource` into its parts. Strings without a colon have no
/// resource.
pub fn split_permission(permission: &str) -> (&str, Option<&str>) {
    match permission.split_once(':') {
        Some((action, resource)) => (action, Some(resource)),
        None => (permission, None),
    }
}

/// Group permissions by resource, keeping input order inside each group.
pub fn group_by_resource<'a, I>(permissions: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for p in permissions {
        let (_, resource) = split_permission(p);
        groups
            .entry(resource.unwrap_or_default().to_string())
            .or_default()
            .push(p.to_string());
    }
    groups
}
