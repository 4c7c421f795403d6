pub mod memory;
pub mod seed;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::role::{Role, RoleDraft, RoleReference};
use crate::models::service::{ServiceDefinition, ServiceRecord, ServiceStatus, ServiceType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Narrowing applied to a service listing. All set criteria must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFilter {
    /// Case-insensitive substring over name, category, endpoint and
    /// description.
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub service_type: Option<ServiceType>,
    pub status: Option<ServiceStatus>,
    /// Case-insensitive exact category.
    pub category: Option<String>,
}

impl ServiceFilter {
    pub fn matches(&self, def: &ServiceDefinition) -> bool {
        if let Some(t) = self.service_type {
            if def.service_type != t {
                return false;
            }
        }
        if let Some(s) = self.status {
            if def.status != s {
                return false;
            }
        }
        if let Some(c) = self.category.as_deref() {
            if def.category.to_lowercase() != c.to_lowercase() {
                return false;
            }
        }
        match self.q.as_deref().map(str::to_lowercase) {
            None => true,
            Some(q) if q.is_empty() => true,
            Some(q) => [
                Some(def.name.as_str()),
                Some(def.category.as_str()),
                Some(def.endpoint.as_str()),
                def.description.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&q)),
        }
    }
}

/// The owning collection of service definitions.
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Commit a new definition; the store assigns the id.
    async fn create_service(&self, def: ServiceDefinition) -> StoreResult<ServiceRecord>;

    async fn get_service(&self, id: i64) -> StoreResult<ServiceRecord>;

    /// Ordered by id.
    async fn list_services(&self, filter: &ServiceFilter) -> StoreResult<Vec<ServiceRecord>>;

    /// Replace the whole definition. With `expected_version` set, a stale
    /// version is rejected; without it the last write wins.
    async fn update_service(
        &self,
        id: i64,
        def: ServiceDefinition,
        expected_version: Option<u64>,
    ) -> StoreResult<ServiceRecord>;

    /// Remove immediately and return the removed record.
    async fn delete_service(&self, id: i64) -> StoreResult<ServiceRecord>;
}

/// The role collection services refer to by id.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn create_role(&self, role: RoleDraft) -> StoreResult<Role>;

    async fn get_role(&self, id: i64) -> StoreResult<Role>;

    /// Ordered by id, optionally narrowed by a name/description search.
    async fn list_roles(&self, search: Option<&str>) -> StoreResult<Vec<Role>>;

    async fn update_role(&self, id: i64, role: RoleDraft) -> StoreResult<Role>;

    /// Services referencing the role are left untouched.
    async fn delete_role(&self, id: i64) -> StoreResult<Role>;

    async fn role_references(&self) -> StoreResult<Vec<RoleReference>> {
        Ok(self
            .list_roles(None)
            .await?
            .iter()
            .map(RoleReference::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::ServiceDraft;
    use crate::validation::{validate_service, ValidationPolicy};

    fn def(category: &str) -> ServiceDefinition {
        let draft = ServiceDraft {
            name: "Kunden Export".into(),
            category: category.into(),
            source: "kunden".into(),
            endpoint: "/api/export".into(),
            ..ServiceDraft::default()
        };
        validate_service(&draft, &ValidationPolicy::default()).unwrap()
    }

    #[test]
    fn test_category_filter_ignores_unicode_case() {
        let filter = ServiceFilter {
            category: Some("ÜBERSICHT".into()),
            ..ServiceFilter::default()
        };
        assert!(filter.matches(&def("Übersicht")));
        assert!(!filter.matches(&def("Übersichten")));
    }
}
