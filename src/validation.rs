//! Submission-time validation for service and role drafts.
//!
//! Validation never stops at the first problem: every violated field is
//! recorded under its path (`name`, `inputParams[2].key`, ...) so a form can
//! show each message beside its input. Nothing is committed unless the whole
//! draft passes.

use std::collections::{BTreeSet, HashSet};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::parameter::{ParamCollection, ParamType, ParameterDraft, ParameterSchema};
use crate::models::role::{split_permission, RoleDraft, AVAILABLE_PERMISSIONS};
use crate::models::service::{
    Accessibility, ContentType, HttpMethod, ServiceDefinition, ServiceDraft, ServiceStatus,
    ServiceType,
};

pub const MIN_SERVICE_NAME_LEN: usize = 3;
pub const MIN_ROLE_NAME_LEN: usize = 3;
pub const MIN_ROLE_DESCRIPTION_LEN: usize = 5;

// ── Errors ───────────────────────────────────────────────────

/// Field path → message, in the order the violations were found.
/// Only the first message per path is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("validation failed for {} field(s)", .fields.len())]
pub struct ValidationErrors {
    fields: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let path = path.into();
        if !self.fields.iter().any(|(p, _)| *p == path) {
            self.fields.push((path, message.into()));
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, m)| m.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(p, m)| (p.as_str(), m.as_str()))
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (path, message) in &self.fields {
            map.serialize_entry(path, message)?;
        }
        map.end()
    }
}

fn param_path(collection: ParamCollection, index: usize, field: &str) -> String {
    format!("{}[{}].{}", collection.field_name(), index, field)
}

// ── Policy ───────────────────────────────────────────────────

/// Optional checks beyond the baseline rules. Both are off by default: the
/// console never enforced them, and turning them on is a product decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Reject a parameter whose key repeats an earlier key in the same list.
    pub unique_param_keys: bool,
    /// Reject a private service that grants no role.
    pub require_roles_when_private: bool,
}

// ── Service ──────────────────────────────────────────────────

/// Validate a draft and produce the normalized definition.
pub fn validate_service(
    draft: &ServiceDraft,
    policy: &ValidationPolicy,
) -> Result<ServiceDefinition, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if draft.name.chars().count() < MIN_SERVICE_NAME_LEN {
        errors.add(
            "name",
            format!(
                "Service name must be at least {} characters",
                MIN_SERVICE_NAME_LEN
            ),
        );
    }
    if draft.category.is_empty() {
        errors.add("category", "Category is required");
    }
    if draft.source.is_empty() {
        errors.add("source", "Source is required");
    }
    if draft.endpoint.is_empty() {
        errors.add("endpoint", "Endpoint path is required");
    } else if !draft.endpoint.starts_with('/') || draft.endpoint.starts_with("//") {
        errors.add("endpoint", "Endpoint path must start with a single '/'");
    }

    let service_type = parse_field::<ServiceType>(&mut errors, "type", Some(&draft.service_type));
    let status = parse_field::<ServiceStatus>(&mut errors, "status", Some(&draft.status));
    let method = parse_field::<HttpMethod>(&mut errors, "method", draft.method.as_deref());
    let content_type =
        parse_field::<ContentType>(&mut errors, "contentType", draft.content_type.as_deref());
    let accessibility =
        parse_field::<Accessibility>(&mut errors, "accessibility", draft.accessibility.as_deref());

    let input_params = validate_params(
        &mut errors,
        ParamCollection::Input,
        &draft.input_params,
        policy,
    );
    let output_params = validate_params(
        &mut errors,
        ParamCollection::Output,
        &draft.output_params,
        policy,
    );

    let selected_roles: BTreeSet<i64> = draft.selected_roles.iter().copied().collect();
    if policy.require_roles_when_private
        && accessibility == Some(Accessibility::Private)
        && selected_roles.is_empty()
    {
        errors.add(
            "selectedRoles",
            "Select at least one role for a private service",
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // No error recorded means every parser returned a value.
    let (
        Some(service_type),
        Some(status),
        Some(method),
        Some(content_type),
        Some(accessibility),
    ) = (service_type, status, method, content_type, accessibility)
    else {
        return Err(errors);
    };

    Ok(ServiceDefinition {
        name: draft.name.clone(),
        service_type,
        status,
        category: draft.category.clone(),
        source: draft.source.clone(),
        endpoint: draft.endpoint.clone(),
        method,
        content_type,
        description: draft.description.clone().filter(|d| !d.is_empty()),
        accessibility,
        selected_roles,
        input_params,
        output_params,
    })
}

/// Parse an enum-valued field. `None` means the field was left unset and
/// the type's default applies.
fn parse_field<T>(errors: &mut ValidationErrors, path: &str, raw: Option<&str>) -> Option<T>
where
    T: std::str::FromStr<Err = String> + Default,
{
    match raw {
        None => Some(T::default()),
        Some(s) => match s.parse::<T>() {
            Ok(v) => Some(v),
            Err(msg) => {
                errors.add(path, msg);
                None
            }
        },
    }
}

fn validate_params(
    errors: &mut ValidationErrors,
    collection: ParamCollection,
    params: &[ParameterDraft],
    policy: &ValidationPolicy,
) -> Vec<ParameterSchema> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(params.len());

    for (i, p) in params.iter().enumerate() {
        if p.key.is_empty() {
            errors.add(param_path(collection, i, "key"), "Parameter key is required");
        } else if !seen.insert(p.key.as_str()) && policy.unique_param_keys {
            errors.add(param_path(collection, i, "key"), "Duplicate parameter key");
        }

        if matches!(&p.title, Some(t) if t.is_empty()) {
            errors.add(
                param_path(collection, i, "title"),
                "Parameter title cannot be empty",
            );
        }

        match p.param_type.parse::<ParamType>() {
            Ok(t) if t.allowed_in(collection) => out.push(ParameterSchema {
                key: p.key.clone(),
                param_type: t,
                title: p.title.clone(),
                required: p.required,
            }),
            Ok(t) => errors.add(
                param_path(collection, i, "type"),
                format!("Type '{}' is not allowed for output parameters", t),
            ),
            Err(msg) => errors.add(param_path(collection, i, "type"), msg),
        }
    }

    out
}

// ── Role ─────────────────────────────────────────────────────

/// Validate a role draft. Permissions are de-duplicated, first occurrence
/// wins.
pub fn validate_role(draft: &RoleDraft) -> Result<RoleDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if draft.name.chars().count() < MIN_ROLE_NAME_LEN {
        errors.add(
            "name",
            format!("Role name must be at least {} characters.", MIN_ROLE_NAME_LEN),
        );
    }
    if draft.description.chars().count() < MIN_ROLE_DESCRIPTION_LEN {
        errors.add(
            "description",
            format!(
                "Description must be at least {} characters.",
                MIN_ROLE_DESCRIPTION_LEN
            ),
        );
    }

    let mut seen = HashSet::new();
    let mut permissions = Vec::new();
    for (i, permission) in draft.permissions.iter().enumerate() {
        if !seen.insert(permission.as_str()) {
            continue;
        }
        let path = format!("permissions[{}]", i);
        match split_permission(permission) {
            (action, Some(resource)) if !action.is_empty() && !resource.is_empty() => {
                if AVAILABLE_PERMISSIONS.contains(&permission.as_str()) {
                    permissions.push(permission.clone());
                } else {
                    errors.add(path, format!("Unknown permission '{}'.", permission));
                }
            }
            _ => errors.add(path, "Permission must look like action:resource."),
        }
    }
    if draft.permissions.is_empty() {
        errors.add("permissions", "Select at least one permission.");
    }

    errors.into_result(RoleDraft {
        name: draft.name.clone(),
        description: draft.description.clone(),
        permissions,
    })
}
