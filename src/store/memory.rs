use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{RoleStore, ServiceFilter, ServiceStore, StoreError, StoreResult};
use crate::models::role::{Role, RoleDraft};
use crate::models::service::{ServiceDefinition, ServiceRecord};

/// Process-local collections. Each mutation runs under the shard lock of
/// the entry it touches, so a commit is never observed half-applied.
#[derive(Debug)]
pub struct MemoryStore {
    services: DashMap<i64, ServiceRecord>,
    roles: DashMap<i64, Role>,
    next_service_id: AtomicI64,
    next_role_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            roles: DashMap::new(),
            next_service_id: AtomicI64::new(1),
            next_role_id: AtomicI64::new(1),
        }
    }

    /// Insert a role with a fixed id and creation time. Later ids continue
    /// after the highest one inserted.
    pub fn insert_role(&self, role: Role) {
        self.next_role_id.fetch_max(role.id + 1, Ordering::SeqCst);
        self.roles.insert(role.id, role);
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    fn service_not_found(id: i64) -> StoreError {
        StoreError::NotFound {
            resource: "service",
            id,
        }
    }

    fn role_not_found(id: i64) -> StoreError {
        StoreError::NotFound {
            resource: "role",
            id,
        }
    }
}

#[async_trait]
impl ServiceStore for MemoryStore {
    async fn create_service(&self, def: ServiceDefinition) -> StoreResult<ServiceRecord> {
        let id = self.next_service_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let record = ServiceRecord {
            id,
            definition: def,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.services.insert(id, record.clone());
        Ok(record)
    }

    async fn get_service(&self, id: i64) -> StoreResult<ServiceRecord> {
        self.services
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| Self::service_not_found(id))
    }

    async fn list_services(&self, filter: &ServiceFilter) -> StoreResult<Vec<ServiceRecord>> {
        let mut rows: Vec<ServiceRecord> = self
            .services
            .iter()
            .filter(|r| filter.matches(&r.value().definition))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn update_service(
        &self,
        id: i64,
        def: ServiceDefinition,
        expected_version: Option<u64>,
    ) -> StoreResult<ServiceRecord> {
        let mut entry = self
            .services
            .get_mut(&id)
            .ok_or_else(|| Self::service_not_found(id))?;

        if let Some(expected) = expected_version {
            if entry.version != expected {
                return Err(StoreError::VersionConflict {
                    expected,
                    actual: entry.version,
                });
            }
        }

        entry.definition = def;
        entry.version += 1;
        entry.updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    async fn delete_service(&self, id: i64) -> StoreResult<ServiceRecord> {
        self.services
            .remove(&id)
            .map(|(_, r)| r)
            .ok_or_else(|| Self::service_not_found(id))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn create_role(&self, draft: RoleDraft) -> StoreResult<Role> {
        let id = self.next_role_id.fetch_add(1, Ordering::SeqCst);
        let role = Role {
            id,
            name: draft.name,
            description: draft.description,
            permissions: draft.permissions,
            created_at: Utc::now(),
        };
        self.roles.insert(id, role.clone());
        Ok(role)
    }

    async fn get_role(&self, id: i64) -> StoreResult<Role> {
        self.roles
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| Self::role_not_found(id))
    }

    async fn list_roles(&self, search: Option<&str>) -> StoreResult<Vec<Role>> {
        let mut rows: Vec<Role> = self
            .roles
            .iter()
            .filter(|r| search.map_or(true, |s| r.value().matches_search(s)))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn update_role(&self, id: i64, draft: RoleDraft) -> StoreResult<Role> {
        let mut entry = self
            .roles
            .get_mut(&id)
            .ok_or_else(|| Self::role_not_found(id))?;
        entry.name = draft.name;
        entry.description = draft.description;
        entry.permissions = draft.permissions;
        Ok(entry.value().clone())
    }

    async fn delete_role(&self, id: i64) -> StoreResult<Role> {
        self.roles
            .remove(&id)
            .map(|(_, r)| r)
            .ok_or_else(|| Self::role_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::{ServiceDraft, ServiceStatus, ServiceType};
    use crate::validation::{validate_service, ValidationPolicy};

    fn def(name: &str, category: &str) -> ServiceDefinition {
        let draft = ServiceDraft {
            name: name.into(),
            category: category.into(),
            source: "main_db".into(),
            endpoint: crate::editor::derive_endpoint(category, name),
            ..ServiceDraft::default()
        };
        validate_service(&draft, &ValidationPolicy::default()).unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = MemoryStore::new();
        let a = store.create_service(def("Alpha", "Core")).await.unwrap();
        let b = store.create_service(def("Beta", "Core")).await.unwrap();
        store.delete_service(b.id).await.unwrap();
        let c = store.create_service(def("Gamma", "Core")).await.unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
        assert_eq!(store.service_count(), 2);
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_checks_expected() {
        let store = MemoryStore::new();
        let rec = store.create_service(def("Alpha", "Core")).await.unwrap();
        assert_eq!(rec.version, 1);

        let mut changed = rec.definition.clone();
        changed.status = ServiceStatus::Inactive;
        let updated = store.update_service(rec.id, changed.clone(), Some(1)).await.unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.created_at, rec.created_at);

        let err = store
            .update_service(rec.id, changed.clone(), Some(1))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::VersionConflict { expected: 1, actual: 2 });

        // Without an expected version the last write wins.
        let again = store.update_service(rec.id, changed, None).await.unwrap();
        assert_eq!(again.version, 3);
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryStore::new();
        assert_eq!(
            store.get_service(9).await.unwrap_err(),
            StoreError::NotFound { resource: "service", id: 9 }
        );
        assert!(store.delete_service(9).await.is_err());
        assert!(store.update_service(9, def("Alpha", "Core"), None).await.is_err());
        assert!(store.get_role(9).await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = MemoryStore::new();
        store.create_service(def("User Data", "Users")).await.unwrap();
        let mut catalog = def("Product Catalog", "Products");
        catalog.service_type = ServiceType::StoredProcedure;
        catalog.description = Some("Lists every SKU".into());
        store.create_service(catalog).await.unwrap();

        let all = store.list_services(&ServiceFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id < all[1].id);

        let by_q = ServiceFilter {
            q: Some("sku".into()),
            ..ServiceFilter::default()
        };
        let found = store.list_services(&by_q).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].definition.name, "Product Catalog");

        let by_type = ServiceFilter {
            service_type: Some(ServiceType::DatabaseQuery),
            category: Some("USERS".into()),
            ..ServiceFilter::default()
        };
        assert_eq!(store.list_services(&by_type).await.unwrap().len(), 1);

        let none = ServiceFilter {
            status: Some(ServiceStatus::Inactive),
            ..ServiceFilter::default()
        };
        assert!(store.list_services(&none).await.unwrap().is_empty());
    }

    #[test]
    fn test_roles_continue_after_inserted_ids() {
        let store = MemoryStore::new();
        store.insert_role(Role {
            id: 3,
            name: "Viewer".into(),
            description: "Read-only access".into(),
            permissions: vec!["view:users".into()],
            created_at: Utc::now(),
        });
        let role = tokio_test::block_on(store.create_role(RoleDraft {
            name: "Auditor".into(),
            description: "Reads logs".into(),
            permissions: vec!["view:logs".into()],
        }))
        .unwrap();
        assert_eq!(role.id, 4);

        let refs = tokio_test::block_on(store.role_references()).unwrap();
        let names: Vec<_> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Viewer", "Auditor"]);

        let found = tokio_test::block_on(store.list_roles(Some("READ"))).unwrap();
        assert_eq!(found.len(), 2);
    }
}
