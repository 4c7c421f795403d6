//! Editing session for a single service draft.
//!
//! A session owns its draft until `submit` hands back a validated
//! definition; nothing here touches the collection.

pub mod endpoint;
pub mod params;

use crate::models::parameter::{ParamCollection, ParamField, ParameterDraft};
use crate::models::service::{ServiceDefinition, ServiceDraft, ServiceRecord, ServiceType};
use crate::validation::{validate_service, ValidationErrors, ValidationPolicy};

pub use endpoint::{derive_endpoint, slugify, EndpointMode};
pub use params::{ParameterEditor, PendingRemoval};

#[derive(Debug)]
pub struct ServiceEditor {
    draft: ServiceDraft,
    existing_id: Option<i64>,
    endpoint_mode: EndpointMode,
    params: ParameterEditor,
}

impl Default for ServiceEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceEditor {
    /// Blank draft for a new service.
    pub fn new() -> Self {
        Self::from_draft(ServiceDraft::default())
    }

    /// Session over an arbitrary unsaved draft, e.g. one loaded from a file
    /// or posted to the API. An empty endpoint is derived from category and
    /// name.
    pub fn from_draft(draft: ServiceDraft) -> Self {
        let mut editor = Self {
            draft,
            existing_id: None,
            endpoint_mode: EndpointMode::Derived,
            params: ParameterEditor::default(),
        };
        if editor.draft.endpoint.is_empty() {
            editor.rederive_endpoint();
        }
        editor
    }

    /// Copy a committed record into a draft. A non-empty stored endpoint is
    /// locked for the whole session.
    pub fn edit(record: &ServiceRecord) -> Self {
        Self {
            draft: ServiceDraft::from(&record.definition),
            existing_id: Some(record.id),
            endpoint_mode: EndpointMode::for_existing(&record.definition.endpoint),
            params: ParameterEditor::default(),
        }
    }

    pub fn draft(&self) -> &ServiceDraft {
        &self.draft
    }

    /// Take every field from `incoming` at once. A locked endpoint is kept
    /// whatever `incoming` says; an empty unlocked one is derived.
    pub fn replace_draft(&mut self, incoming: ServiceDraft) {
        let previous = std::mem::replace(&mut self.draft, incoming);
        // Pending indices referred to the old parameter lists.
        self.params.cancel_removal();
        match self.endpoint_mode {
            EndpointMode::Locked => {
                if self.draft.endpoint != previous.endpoint {
                    tracing::debug!(
                        kept = %previous.endpoint,
                        ignored = %self.draft.endpoint,
                        "endpoint is locked"
                    );
                }
                self.draft.endpoint = previous.endpoint;
            }
            EndpointMode::Derived if self.draft.endpoint.is_empty() => self.rederive_endpoint(),
            EndpointMode::Derived => {}
        }
    }

    pub fn existing_id(&self) -> Option<i64> {
        self.existing_id
    }

    pub fn endpoint_mode(&self) -> EndpointMode {
        self.endpoint_mode
    }

    // ── Identity fields ──────────────────────────────────────

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
        self.rederive_endpoint();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.draft.category = category.into();
        self.rederive_endpoint();
    }

    pub fn set_type(&mut self, service_type: impl Into<String>) {
        self.draft.service_type = service_type.into();
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.draft.status = status.into();
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.draft.source = source.into();
    }

    /// Stored verbatim. An unlocked session still rewrites it on the next
    /// name or category change.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.draft.endpoint = endpoint.into();
    }

    pub fn set_method(&mut self, method: impl Into<String>) {
        self.draft.method = Some(method.into());
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.draft.content_type = Some(content_type.into());
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.draft.description = description;
    }

    // ── Access ───────────────────────────────────────────────

    pub fn set_accessibility(&mut self, accessibility: impl Into<String>) {
        self.draft.accessibility = Some(accessibility.into());
    }

    /// Add or remove a role from the selection. Selection survives a switch
    /// back to public.
    pub fn toggle_role(&mut self, role_id: i64, selected: bool) {
        let roles = &mut self.draft.selected_roles;
        let present = roles.contains(&role_id);
        if selected && !present {
            roles.push(role_id);
        } else if !selected && present {
            roles.retain(|r| *r != role_id);
        }
    }

    // ── Parameters ───────────────────────────────────────────

    pub fn add_parameter(&mut self, collection: ParamCollection) -> usize {
        self.params.add(&mut self.draft, collection)
    }

    pub fn update_parameter(&mut self, collection: ParamCollection, index: usize, field: ParamField) {
        self.params.update(&mut self.draft, collection, index, field);
    }

    pub fn request_parameter_removal(
        &mut self,
        collection: ParamCollection,
        index: usize,
    ) -> &PendingRemoval {
        self.params.request_removal(&self.draft, collection, index)
    }

    pub fn pending_removal(&self) -> Option<&PendingRemoval> {
        self.params.pending()
    }

    pub fn confirm_parameter_removal(&mut self) -> Option<ParameterDraft> {
        self.params.confirm_removal(&mut self.draft)
    }

    pub fn cancel_parameter_removal(&mut self) -> bool {
        self.params.cancel_removal()
    }

    // ── Hints ────────────────────────────────────────────────

    /// Placeholder for the source input; unknown types fall back to the
    /// query editor's hint.
    pub fn source_placeholder(&self) -> &'static str {
        self.current_type().source_placeholder()
    }

    pub fn source_help(&self) -> &'static str {
        self.current_type().source_help()
    }

    fn current_type(&self) -> ServiceType {
        self.draft.service_type.parse().unwrap_or_default()
    }

    // ── Submit ───────────────────────────────────────────────

    /// Validate the whole draft. On failure the draft is left as it was so
    /// the operator can fix the reported fields.
    pub fn submit(&self, policy: &ValidationPolicy) -> Result<ServiceDefinition, ValidationErrors> {
        validate_service(&self.draft, policy)
    }

    fn rederive_endpoint(&mut self) {
        if let Some(endpoint) = self
            .endpoint_mode
            .rederive(&self.draft.category, &self.draft.name)
        {
            tracing::debug!(endpoint = %endpoint, "derived endpoint");
            self.draft.endpoint = endpoint;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::ServiceStatus;
    use chrono::Utc;

    fn record_with_endpoint(endpoint: &str) -> ServiceRecord {
        ServiceRecord {
            id: 7,
            definition: ServiceDefinition {
                name: "Legacy Users".into(),
                service_type: ServiceType::DatabaseQuery,
                status: ServiceStatus::Active,
                category: "Users".into(),
                source: "users_db".into(),
                endpoint: endpoint.into(),
                method: Default::default(),
                content_type: Default::default(),
                description: None,
                accessibility: Default::default(),
                selected_roles: Default::default(),
                input_params: vec![],
                output_params: vec![],
            },
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_draft_derives_endpoint() {
        let mut ed = ServiceEditor::new();
        ed.set_category("User Accounts");
        assert_eq!(ed.draft().endpoint, "");
        ed.set_name("List Active");
        assert_eq!(ed.draft().endpoint, "/api/user-accounts/list-active");
        ed.set_name("List  Inactive");
        assert_eq!(ed.draft().endpoint, "/api/user-accounts/list-inactive");
    }

    #[test]
    fn test_manual_endpoint_overwritten_while_unlocked() {
        let mut ed = ServiceEditor::new();
        ed.set_category("Sales");
        ed.set_name("Orders");
        ed.set_endpoint("/custom/orders");
        assert_eq!(ed.draft().endpoint, "/custom/orders");
        ed.set_name("Open Orders");
        assert_eq!(ed.draft().endpoint, "/api/sales/open-orders");
    }

    #[test]
    fn test_existing_endpoint_is_locked() {
        let rec = record_with_endpoint("/api/users/legacy");
        let mut ed = ServiceEditor::edit(&rec);
        assert_eq!(ed.endpoint_mode(), EndpointMode::Locked);
        assert_eq!(ed.existing_id(), Some(7));

        ed.set_category("New Cat");
        ed.set_name("Renamed");
        assert_eq!(ed.draft().endpoint, "/api/users/legacy");
        let def = ed.submit(&ValidationPolicy::default()).unwrap();
        assert_eq!(def.endpoint, "/api/users/legacy");
    }

    #[test]
    fn test_existing_record_without_endpoint_derives() {
        let rec = record_with_endpoint("");
        let mut ed = ServiceEditor::edit(&rec);
        assert_eq!(ed.endpoint_mode(), EndpointMode::Derived);
        ed.set_category("New Cat");
        assert_eq!(ed.draft().endpoint, "/api/new-cat/legacy-users");
    }

    #[test]
    fn test_replace_draft_keeps_locked_endpoint() {
        let rec = record_with_endpoint("/api/users/legacy");
        let mut ed = ServiceEditor::edit(&rec);
        let mut incoming = ServiceDraft::from(&rec.definition);
        incoming.category = "New Cat".into();
        incoming.endpoint = "/api/new-cat/legacy-users".into();
        ed.replace_draft(incoming);
        assert_eq!(ed.draft().category, "New Cat");
        assert_eq!(ed.draft().endpoint, "/api/users/legacy");
    }

    #[test]
    fn test_replace_draft_derives_when_unlocked_and_empty() {
        let mut ed = ServiceEditor::edit(&record_with_endpoint(""));
        let mut incoming = ed.draft().clone();
        incoming.category = "Reports".into();
        ed.replace_draft(incoming);
        assert_eq!(ed.draft().endpoint, "/api/reports/legacy-users");
    }

    #[test]
    fn test_from_draft_fills_missing_endpoint() {
        let draft = ServiceDraft {
            name: "List Active".into(),
            category: "User Accounts".into(),
            ..ServiceDraft::default()
        };
        let ed = ServiceEditor::from_draft(draft);
        assert_eq!(ed.draft().endpoint, "/api/user-accounts/list-active");

        let custom = ServiceDraft {
            name: "List Active".into(),
            category: "User Accounts".into(),
            endpoint: "/custom/active".into(),
            ..ServiceDraft::default()
        };
        assert_eq!(ServiceEditor::from_draft(custom).draft().endpoint, "/custom/active");
        assert_eq!(ServiceEditor::new().draft().endpoint, "");
    }

    #[test]
    fn test_toggle_role_keeps_set_semantics() {
        let mut ed = ServiceEditor::new();
        ed.toggle_role(2, true);
        ed.toggle_role(2, true);
        ed.toggle_role(1, true);
        ed.toggle_role(2, false);
        assert_eq!(ed.draft().selected_roles, vec![1]);
    }

    #[test]
    fn test_failed_submit_keeps_draft() {
        let mut ed = ServiceEditor::new();
        ed.set_name("ab");
        let before = ed.draft().clone();
        let errs = ed.submit(&ValidationPolicy::default()).unwrap_err();
        assert!(errs.contains("name"));
        assert_eq!(ed.draft(), &before);
    }

    #[test]
    fn test_source_hints_follow_draft_type() {
        let mut ed = ServiceEditor::new();
        assert!(ed.source_placeholder().starts_with("SELECT"));
        ed.set_type("Stored Procedure");
        assert_eq!(ed.source_placeholder(), "sp_get_user_orders");
        ed.set_type("nonsense");
        assert!(ed.source_placeholder().starts_with("SELECT"));
    }
}
