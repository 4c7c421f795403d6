//! Demo data loaded at startup when `SERVICEDESK_SEED_DEMO` is on.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};

use super::memory::MemoryStore;
use super::{ServiceStore, StoreResult};
use crate::models::parameter::{ParamType, ParameterSchema};
use crate::models::role::Role;
use crate::models::service::{
    Accessibility, ContentType, HttpMethod, ServiceDefinition, ServiceStatus, ServiceType,
};

fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn param(key: &str, param_type: ParamType, required: bool) -> ParameterSchema {
    ParameterSchema {
        key: key.to_string(),
        param_type,
        title: None,
        required,
    }
}

pub fn demo_roles() -> Vec<Role> {
    vec![
        Role {
            id: 1,
            name: "Admin".into(),
            description: "Full system access".into(),
            permissions: strings(&[
                "view:users",
                "create:users",
                "update:users",
                "delete:users",
                "view:roles",
                "create:roles",
                "update:roles",
                "delete:roles",
            ]),
            created_at: ts(2025, 1, 15, 10, 0),
        },
        Role {
            id: 2,
            name: "Editor".into(),
            description: "Can edit content but cannot delete".into(),
            permissions: strings(&["view:users", "update:users", "view:roles"]),
            created_at: ts(2025, 2, 20, 14, 30),
        },
        Role {
            id: 3,
            name: "Viewer".into(),
            description: "Read-only access".into(),
            permissions: strings(&["view:users", "view:roles"]),
            created_at: ts(2025, 3, 10, 9, 15),
        },
    ]
}

pub fn demo_services() -> Vec<ServiceDefinition> {
    vec![
        ServiceDefinition {
            name: "User Data Service".into(),
            service_type: ServiceType::DatabaseQuery,
            status: ServiceStatus::Active,
            category: "Users".into(),
            source: "SELECT id, username, email, role FROM users LIMIT :limit OFFSET :offset"
                .into(),
            endpoint: "/api/v1/users".into(),
            method: HttpMethod::Get,
            content_type: ContentType::Json,
            description: Some("Paged listing of console users".into()),
            accessibility: Accessibility::Public,
            selected_roles: BTreeSet::new(),
            input_params: vec![
                param("limit", ParamType::Number, false),
                param("offset", ParamType::Number, false),
            ],
            output_params: vec![
                param("data", ParamType::Array, true),
                param("meta", ParamType::Object, true),
            ],
        },
        ServiceDefinition {
            name: "Product Catalog".into(),
            service_type: ServiceType::StoredProcedure,
            status: ServiceStatus::Active,
            category: "Products".into(),
            source: "sp_get_products".into(),
            endpoint: "/api/v1/products".into(),
            method: HttpMethod::Post,
            content_type: ContentType::Json,
            description: None,
            accessibility: Accessibility::Private,
            selected_roles: [1, 2].into_iter().collect(),
            input_params: vec![param("category_id", ParamType::Number, true)],
            output_params: vec![param("products", ParamType::Array, true)],
        },
        ServiceDefinition {
            name: "Analytics Service".into(),
            service_type: ServiceType::ExternalApi,
            status: ServiceStatus::Inactive,
            category: "Analytics".into(),
            source: "https://analytics.example.com/v4/reports".into(),
            endpoint: "/api/v1/analytics".into(),
            method: HttpMethod::Get,
            content_type: ContentType::Json,
            description: Some("Proxy for the analytics reporting API".into()),
            accessibility: Accessibility::Private,
            selected_roles: [1].into_iter().collect(),
            input_params: vec![
                param("from", ParamType::Date, true),
                param("to", ParamType::Date, true),
            ],
            output_params: vec![param("rows", ParamType::Array, true)],
        },
    ]
}

/// Load the demo roles and services into an empty store.
pub async fn seed_demo(store: &MemoryStore) -> StoreResult<()> {
    for role in demo_roles() {
        store.insert_role(role);
    }
    for def in demo_services() {
        store.create_service(def).await?;
    }
    tracing::info!(
        services = store.service_count(),
        "seeded demo services and roles"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::ServiceDraft;
    use crate::store::RoleStore;
    use crate::validation::{validate_service, ValidationPolicy};

    #[test]
    fn test_demo_services_pass_validation() {
        let strict = ValidationPolicy {
            unique_param_keys: true,
            require_roles_when_private: true,
        };
        for def in demo_services() {
            let draft = ServiceDraft::from(&def);
            assert_eq!(validate_service(&draft, &strict).unwrap(), def);
        }
    }

    #[tokio::test]
    async fn test_seed_demo() {
        let store = MemoryStore::new();
        seed_demo(&store).await.unwrap();
        assert_eq!(store.service_count(), 3);
        assert_eq!(store.list_roles(None).await.unwrap().len(), 3);
        assert_eq!(store.get_service(3).await.unwrap().definition.name, "Analytics Service");
    }
}
