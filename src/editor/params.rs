use serde::Serialize;

use crate::models::parameter::{ParamCollection, ParamField, ParameterDraft};
use crate::models::service::ServiceDraft;

/// A removal waiting for the operator to confirm it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRemoval {
    pub collection: ParamCollection,
    pub index: usize,
    pub prompt: String,
}

/// Add / update / two-phase remove on the parameter lists of a draft.
///
/// Indices only ever come from this editor, so an out-of-range index is a
/// caller bug and panics.
#[derive(Debug, Default)]
pub struct ParameterEditor {
    pending: Option<PendingRemoval>,
}

fn list_mut(draft: &mut ServiceDraft, collection: ParamCollection) -> &mut Vec<ParameterDraft> {
    match collection {
        ParamCollection::Input => &mut draft.input_params,
        ParamCollection::Output => &mut draft.output_params,
    }
}

fn list(draft: &ServiceDraft, collection: ParamCollection) -> &[ParameterDraft] {
    match collection {
        ParamCollection::Input => &draft.input_params,
        ParamCollection::Output => &draft.output_params,
    }
}

impl ParameterEditor {
    /// Append a blank parameter and return its index.
    pub fn add(&mut self, draft: &mut ServiceDraft, collection: ParamCollection) -> usize {
        let params = list_mut(draft, collection);
        params.push(ParameterDraft::default());
        params.len() - 1
    }

    pub fn update(
        &mut self,
        draft: &mut ServiceDraft,
        collection: ParamCollection,
        index: usize,
        field: ParamField,
    ) {
        let params = list_mut(draft, collection);
        let len = params.len();
        let param = params.get_mut(index).unwrap_or_else(|| {
            panic!(
                "{} index {} out of range (len {})",
                collection.field_name(),
                index,
                len
            )
        });
        param.apply(field);
    }

    /// First phase of removal. Nothing is mutated; any earlier pending
    /// request is replaced.
    pub fn request_removal(
        &mut self,
        draft: &ServiceDraft,
        collection: ParamCollection,
        index: usize,
    ) -> &PendingRemoval {
        let params = list(draft, collection);
        let param = params.get(index).unwrap_or_else(|| {
            panic!(
                "{} index {} out of range (len {})",
                collection.field_name(),
                index,
                params.len()
            )
        });
        let label = if param.key.is_empty() {
            format!("parameter #{}", index + 1)
        } else {
            format!("parameter '{}'", param.key)
        };
        self.pending.insert(PendingRemoval {
            collection,
            index,
            prompt: format!("Remove {}? This action cannot be undone.", label),
        })
    }

    pub fn pending(&self) -> Option<&PendingRemoval> {
        self.pending.as_ref()
    }

    /// Second phase: splice out the pending parameter. Returns `None` when
    /// nothing was pending or the list no longer reaches the pending index.
    pub fn confirm_removal(&mut self, draft: &mut ServiceDraft) -> Option<ParameterDraft> {
        let pending = self.pending.take()?;
        let params = list_mut(draft, pending.collection);
        if pending.index >= params.len() {
            tracing::warn!(
                index = pending.index,
                len = params.len(),
                "pending parameter removal no longer applies"
            );
            return None;
        }
        Some(params.remove(pending.index))
    }

    pub fn cancel_removal(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with_inputs(keys: &[&str]) -> ServiceDraft {
        let mut d = ServiceDraft::default();
        d.input_params = keys
            .iter()
            .map(|k| ParameterDraft {
                key: k.to_string(),
                ..ParameterDraft::default()
            })
            .collect();
        d
    }

    #[test]
    fn test_add_appends_blank() {
        let mut d = draft_with_inputs(&["a"]);
        let mut ed = ParameterEditor::default();
        let idx = ed.add(&mut d, ParamCollection::Input);
        assert_eq!(idx, 1);
        assert_eq!(d.input_params[1], ParameterDraft::default());
        assert!(d.output_params.is_empty());
    }

    #[test]
    fn test_update_only_targets_one_list() {
        let mut d = draft_with_inputs(&["a"]);
        let mut ed = ParameterEditor::default();
        ed.add(&mut d, ParamCollection::Output);
        ed.update(&mut d, ParamCollection::Output, 0, ParamField::Key("total".into()));
        assert_eq!(d.output_params[0].key, "total");
        assert_eq!(d.input_params[0].key, "a");
    }

    #[test]
    #[should_panic(expected = "inputParams index 3 out of range")]
    fn test_update_out_of_range_panics() {
        let mut d = draft_with_inputs(&["a"]);
        ParameterEditor::default().update(
            &mut d,
            ParamCollection::Input,
            3,
            ParamField::Required(true),
        );
    }

    #[test]
    #[should_panic(expected = "outputParams index 0 out of range")]
    fn test_request_removal_out_of_range_panics() {
        let d = draft_with_inputs(&["a"]);
        ParameterEditor::default().request_removal(&d, ParamCollection::Output, 0);
    }

    #[test]
    fn test_removal_is_two_phase() {
        let mut d = draft_with_inputs(&["limit", "offset"]);
        let mut ed = ParameterEditor::default();

        let pending = ed.request_removal(&d, ParamCollection::Input, 0);
        assert_eq!(pending.prompt, "Remove parameter 'limit'? This action cannot be undone.");
        assert_eq!(d.input_params.len(), 2);

        let removed = ed.confirm_removal(&mut d).unwrap();
        assert_eq!(removed.key, "limit");
        assert_eq!(d.input_params.len(), 1);
        assert_eq!(d.input_params[0].key, "offset");
        assert!(ed.pending().is_none());
    }

    #[test]
    fn test_cancel_leaves_list_untouched() {
        let mut d = draft_with_inputs(&["limit", "offset"]);
        let before = d.input_params.clone();
        let mut ed = ParameterEditor::default();

        ed.request_removal(&d, ParamCollection::Input, 1);
        assert!(ed.cancel_removal());
        assert_eq!(d.input_params, before);
        assert!(ed.confirm_removal(&mut d).is_none());
        assert_eq!(d.input_params, before);
    }

    #[test]
    fn test_confirm_against_shorter_draft_is_a_no_op() {
        let long = draft_with_inputs(&["a", "b", "c"]);
        let mut short = draft_with_inputs(&["a"]);
        let mut ed = ParameterEditor::default();
        ed.request_removal(&long, ParamCollection::Input, 2);

        assert!(ed.confirm_removal(&mut short).is_none());
        assert_eq!(short.input_params.len(), 1);
        assert!(ed.pending().is_none());
    }

    #[test]
    fn test_new_request_replaces_pending() {
        let mut d = draft_with_inputs(&["a", "b", ""]);
        let mut ed = ParameterEditor::default();
        ed.request_removal(&d, ParamCollection::Input, 0);
        let p = ed.request_removal(&d, ParamCollection::Input, 2);
        assert_eq!(p.prompt, "Remove parameter #3? This action cannot be undone.");
        ed.confirm_removal(&mut d);
        let keys: Vec<_> = d.input_params.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
