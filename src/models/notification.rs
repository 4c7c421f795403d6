use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// A transient message about the outcome of a top-level action
/// (create, update, delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Failure,
            title: title.into(),
            description: description.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn service_created(name: &str) -> Self {
        Self::success("Service created", format!("{} has been created successfully.", name))
    }

    pub fn service_updated(name: &str) -> Self {
        Self::success("Service updated", format!("{} has been updated successfully.", name))
    }

    pub fn service_deleted(name: &str) -> Self {
        Self::success("Service deleted", format!("{} has been deleted.", name))
    }

    pub fn role_saved(name: &str, created: bool) -> Self {
        let title = if created { "Role added" } else { "Role updated" };
        Self::success(title, format!("{} has been saved successfully.", name))
    }

    pub fn role_deleted(name: &str) -> Self {
        Self::success("Role deleted", format!("{} has been deleted.", name))
    }

    pub fn rejected(action: &str, reason: impl Into<String>) -> Self {
        Self::failure(format!("{} failed", action), reason)
    }
}
