use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Parameter Types ──────────────────────────────────────────

/// Value type of a request or response field.
///
/// Output parameters share this enum but may not use [`ParamType::File`];
/// that restriction is checked by the validation layer, not the type system,
/// so a draft can hold it until submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Boolean,
    Object,
    Array,
    Date,
    File,
}

impl ParamType {
    pub const ALL: [ParamType; 7] = [
        ParamType::String,
        ParamType::Number,
        ParamType::Boolean,
        ParamType::Object,
        ParamType::Array,
        ParamType::Date,
        ParamType::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
            ParamType::Date => "date",
            ParamType::File => "file",
        }
    }

    /// Whether this type may appear in the given collection.
    pub fn allowed_in(&self, collection: ParamCollection) -> bool {
        match collection {
            ParamCollection::Input => true,
            ParamCollection::Output => *self != ParamType::File,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown parameter type '{}'", s))
    }
}

/// Which of the two parameter lists of a service an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamCollection {
    Input,
    Output,
}

impl ParamCollection {
    /// Field-path prefix used in validation reports.
    pub fn field_name(&self) -> &'static str {
        match self {
            ParamCollection::Input => "inputParams",
            ParamCollection::Output => "outputParams",
        }
    }
}

// ── Parameter Schema ─────────────────────────────────────────

/// A validated request or response field of a service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub key: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// Editable form of a parameter. The type stays a raw string so an
/// unsupported value can be reported against its field path instead of
/// failing the whole draft at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDraft {
    #[serde(default)]
    pub key: String,
    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub required: bool,
}

fn default_param_type() -> String {
    ParamType::String.as_str().to_string()
}

impl Default for ParameterDraft {
    fn default() -> Self {
        Self {
            key: String::new(),
            param_type: default_param_type(),
            title: None,
            required: false,
        }
    }
}

impl From<&ParameterSchema> for ParameterDraft {
    fn from(p: &ParameterSchema) -> Self {
        Self {
            key: p.key.clone(),
            param_type: p.param_type.as_str().to_string(),
            title: p.title.clone(),
            required: p.required,
        }
    }
}

/// A single-field edit applied to one parameter in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "lowercase")]
pub enum ParamField {
    Key(String),
    Type(String),
    Title(Option<String>),
    Required(bool),
}

impl ParameterDraft {
    pub fn apply(&mut self, field: ParamField) {
        match field {
            ParamField::Key(k) => self.key = k,
            ParamField::Type(t) => self.param_type = t,
            ParamField::Title(t) => self.title = t,
            ParamField::Required(r) => self.required = r,
        }
    }
}
