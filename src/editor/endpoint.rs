use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lower-case `s` and replace every whitespace run with a single `-`.
///
/// Nothing else is stripped: punctuation and leading/trailing whitespace
/// survive (the latter as a leading/trailing `-`).
pub fn slugify(s: &str) -> String {
    WHITESPACE_RUN.replace_all(&s.to_lowercase(), "-").into_owned()
}

/// `/api/{slug(category)}/{slug(name)}`
pub fn derive_endpoint(category: &str, name: &str) -> String {
    format!("/api/{}/{}", slugify(category), slugify(name))
}

/// Whether the editing session may still rewrite the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointMode {
    /// Follows category and name.
    Derived,
    /// Loaded from a record that already published an endpoint.
    Locked,
}

impl EndpointMode {
    /// Locked only when editing a record whose endpoint is non-empty.
    pub fn for_existing(endpoint: &str) -> Self {
        if endpoint.is_empty() {
            EndpointMode::Derived
        } else {
            EndpointMode::Locked
        }
    }

    /// The endpoint to store after `category` or `name` changed, or `None`
    /// to keep the current one.
    pub fn rederive(&self, category: &str, name: &str) -> Option<String> {
        match self {
            EndpointMode::Locked => None,
            EndpointMode::Derived if category.is_empty() || name.is_empty() => None,
            EndpointMode::Derived => Some(derive_endpoint(category, name)),
        }
    }
}
