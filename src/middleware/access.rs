use serde::Serialize;

use crate::models::service::{Accessibility, ServiceDefinition};

/// Why a caller was or was not admitted to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    Public,
    RoleGranted { role_id: i64 },
    NoMatchingRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

/// Intended invocation rule for a service: public services admit everyone,
/// private ones admit callers holding at least one selected role.
///
/// A private service with no selected roles admits nobody.
pub fn evaluate(def: &ServiceDefinition, caller_roles: &[i64]) -> AccessDecision {
    match def.accessibility {
        Accessibility::Public => AccessDecision {
            allowed: true,
            reason: AccessReason::Public,
        },
        Accessibility::Private => match caller_roles
            .iter()
            .find(|r| def.selected_roles.contains(r))
        {
            Some(role_id) => AccessDecision {
                allowed: true,
                reason: AccessReason::RoleGranted { role_id: *role_id },
            },
            None => AccessDecision {
                allowed: false,
                reason: AccessReason::NoMatchingRole,
            },
        },
    }
}

pub fn is_accessible(def: &ServiceDefinition, caller_roles: &[i64]) -> bool {
    evaluate(def, caller_roles).allowed
}

// ── Tests ───────────────────────────────────────────────────────
