use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parameter::{ParameterDraft, ParameterSchema};

/// Declares a closed string enum whose wire form is a fixed label.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $what:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| format!(
                        "{} must be one of: {}",
                        $what,
                        $name::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
                    ))
            }
        }
    };
}

labeled_enum! {
    /// Kind of operation a service wraps. Decides how `source` is read.
    #[derive(Default)]
    pub enum ServiceType: "Service type" {
        #[default]
        DatabaseQuery => "Database Query",
        StoredProcedure => "Stored Procedure",
        ExternalApi => "External API",
    }
}

labeled_enum! {
    #[derive(Default)]
    pub enum ServiceStatus: "Status" {
        #[default]
        Active => "Active",
        Inactive => "Inactive",
    }
}

labeled_enum! {
    #[derive(Default)]
    pub enum HttpMethod: "Method" {
        #[default]
        Get => "GET",
        Post => "POST",
        Put => "PUT",
        Delete => "DELETE",
        Patch => "PATCH",
    }
}

labeled_enum! {
    #[derive(Default)]
    pub enum ContentType: "Content type" {
        #[default]
        Json => "application/json",
        Multipart => "multipart/form-data",
        FormUrlEncoded => "application/x-www-form-urlencoded",
        PlainText => "text/plain",
    }
}

labeled_enum! {
    /// Who may invoke a service. `Private` restricts it to `selected_roles`.
    #[derive(Default)]
    pub enum Accessibility: "Accessibility" {
        #[default]
        Public => "public",
        Private => "private",
    }
}

impl HttpMethod {
    /// Methods whose test requests carry values in the query string.
    pub fn uses_query_string(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

impl ServiceType {
    pub fn source_placeholder(&self) -> &'static str {
        match self {
            ServiceType::DatabaseQuery => "SELECT * FROM users WHERE active = true",
            ServiceType::StoredProcedure => "sp_get_user_orders",
            ServiceType::ExternalApi => "https://api.example.com/v1/resource",
        }
    }

    pub fn source_help(&self) -> &'static str {
        match self {
            ServiceType::DatabaseQuery => "SQL statement executed against the service connection",
            ServiceType::StoredProcedure => "Name of the stored procedure to call",
            ServiceType::ExternalApi => "URL or connection string of the upstream API",
        }
    }
}

// ── Service Definition ───────────────────────────────────────

/// A validated, normalized service definition.
///
/// Only [`crate::validation::validate_service`] produces one from user
/// input, so every instance satisfies the field constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub status: ServiceStatus,
    pub category: String,
    pub source: String,
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub selected_roles: BTreeSet<i64>,
    #[serde(default)]
    pub input_params: Vec<ParameterSchema>,
    #[serde(default)]
    pub output_params: Vec<ParameterSchema>,
}

/// A committed service as stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: i64,
    #[serde(flatten)]
    pub definition: ServiceDefinition,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Draft ────────────────────────────────────────────────────

/// Mutable, unvalidated form state of a service.
///
/// Enum-valued fields are raw strings; `None` on an optional enum means
/// "use the default" once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_service_type")]
    pub service_type: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub accessibility: Option<String>,
    #[serde(default)]
    pub selected_roles: Vec<i64>,
    #[serde(default)]
    pub input_params: Vec<ParameterDraft>,
    #[serde(default)]
    pub output_params: Vec<ParameterDraft>,
}

fn default_service_type() -> String {
    ServiceType::DatabaseQuery.as_str().to_string()
}

fn default_status() -> String {
    ServiceStatus::Active.as_str().to_string()
}

impl Default for ServiceDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            service_type: default_service_type(),
            status: default_status(),
            category: String::new(),
            source: String::new(),
            endpoint: String::new(),
            method: None,
            content_type: None,
            description: None,
            accessibility: None,
            selected_roles: Vec::new(),
            input_params: Vec::new(),
            output_params: Vec::new(),
        }
    }
}

impl From<&ServiceDefinition> for ServiceDraft {
    fn from(def: &ServiceDefinition) -> Self {
        Self {
            name: def.name.clone(),
            service_type: def.service_type.as_str().to_string(),
            status: def.status.as_str().to_string(),
            category: def.category.clone(),
            source: def.source.clone(),
            endpoint: def.endpoint.clone(),
            method: Some(def.method.as_str().to_string()),
            content_type: Some(def.content_type.as_str().to_string()),
            description: def.description.clone(),
            accessibility: Some(def.accessibility.as_str().to_string()),
            selected_roles: def.selected_roles.iter().copied().collect(),
            input_params: def.input_params.iter().map(ParameterDraft::from).collect(),
            output_params: def.output_params.iter().map(ParameterDraft::from).collect(),
        }
    }
}
