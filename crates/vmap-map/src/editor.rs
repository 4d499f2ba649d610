//! Editing session for a single mapping.
//!
//! [`MappingEditor`] owns the rule tree and applies every user edit to it.
//! Edits address nodes by [`NodeId`]; an id that no longer resolves (the
//! node was removed, or the mapping was re-hydrated after the id was handed
//! out) turns the edit into a no-op that is logged at debug level and
//! produces no change notification.
//!
//! Persistence goes through a [`MappingStore`]. Store calls are async, but
//! the rule tree is only touched after a call resolves, so every edit is
//! still a plain `&mut` mutation applied in call order.

use tracing::{debug, info, warn};
use vmap_model::{
    ArithmeticOperator, Attribute, Choice, Condition, ConditionOperator, Conversion, Group,
    Literal, LogicalOperator, Mapping, MappingId, MappingStatus, NodeId, Operand, OperandKind,
    Schema, ValidationReport, Variable, VariableRef,
};

use crate::change::{ChangeNotifier, ModelChange};
use crate::error::EditorError;
use crate::lookup::{LookupQuery, LookupResults, Vocabulary};
use crate::store::{FailureKind, MappingStore, ReviewRecord, SaveResponse, StoreFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackLevel {
    Success,
    Danger,
}

/// Outcome message of the last persistence operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
}

impl Feedback {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FeedbackLevel::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FeedbackLevel::Danger,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == FeedbackLevel::Success
    }
}

#[derive(Debug, Default)]
pub struct MappingEditor {
    mapping: Mapping,
    review: Option<ReviewRecord>,
    is_loading: bool,
    feedback: Option<Feedback>,
    next_location: Option<String>,
    notifier: ChangeNotifier,
}

impl MappingEditor {
    /// Editor for a new mapping, starting from the default skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mapping: Mapping) -> Self {
        Self {
            mapping,
            ..Self::default()
        }
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn review(&self) -> Option<&ReviewRecord> {
        self.review.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Location the server asked to navigate to after the last save.
    pub fn next_location(&self) -> Option<&str> {
        self.next_location.as_deref()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ModelChange) + Send + 'static) {
        self.notifier.subscribe(listener);
    }

    pub fn validate(&self) -> ValidationReport {
        self.mapping.validate()
    }

    // Groups

    pub fn add_group(&mut self) -> NodeId {
        let id = self.mapping.add_group();
        self.notifier.emit(ModelChange::GroupAdded(id));
        id
    }

    pub fn copy_group(&mut self, group: NodeId) -> Option<NodeId> {
        let Some(copy) = self.mapping.copy_group(group) else {
            debug!(%group, "copy of unknown group ignored");
            return None;
        };
        self.notifier.emit(ModelChange::GroupCopied {
            source: group,
            copy,
        });
        Some(copy)
    }

    pub fn remove_group(&mut self, group: NodeId) -> bool {
        if self.mapping.remove_group(group).is_none() {
            debug!(%group, "removal of unknown group ignored");
            return false;
        }
        self.notifier.emit(ModelChange::GroupRemoved(group));
        true
    }

    pub fn set_logic_operator(&mut self, group: NodeId, operator: LogicalOperator) -> bool {
        let Some(target) = self.group_mut(group) else {
            return false;
        };
        target.logic_mut_or_insert().operator = operator;
        self.notifier.emit(ModelChange::LogicOperatorChanged(group));
        true
    }

    // Conversions

    pub fn add_conversion(&mut self, group: NodeId, after: Option<NodeId>) -> Option<NodeId> {
        let conversion = self.group_mut(group)?.add_conversion(after);
        self.notifier
            .emit(ModelChange::ConversionAdded { group, conversion });
        Some(conversion)
    }

    pub fn remove_conversion(&mut self, group: NodeId, conversion: NodeId) -> bool {
        let removed = self
            .group_mut(group)
            .and_then(|g| g.remove_conversion(conversion));
        if removed.is_none() {
            debug!(%group, %conversion, "removal of unknown conversion ignored");
            return false;
        }
        self.notifier
            .emit(ModelChange::ConversionRemoved { group, conversion });
        true
    }

    /// Switches a conversion between a variable and a typed-in value. The
    /// previous operand is discarded.
    pub fn change_operand_type(&mut self, group: NodeId, conversion: NodeId, kind: OperandKind) -> bool {
        let Some(target) = self.conversion_mut(group, conversion) else {
            return false;
        };
        target.change_type(kind);
        self.notifier
            .emit(ModelChange::OperandTypeChanged { group, conversion });
        true
    }

    pub fn set_conversion_operator(
        &mut self,
        group: NodeId,
        conversion: NodeId,
        operator: Option<ArithmeticOperator>,
    ) -> bool {
        let Some(target) = self.conversion_mut(group, conversion) else {
            return false;
        };
        target.operator = operator;
        self.notifier
            .emit(ModelChange::ConversionEdited { group, conversion });
        true
    }

    /// Sets the typed-in value of a by-value conversion. Variable operands
    /// are left alone; switch the type first.
    pub fn set_conversion_value(
        &mut self,
        group: NodeId,
        conversion: NodeId,
        value: Option<Literal>,
    ) -> bool {
        let Some(target) = self.conversion_mut(group, conversion) else {
            return false;
        };
        if target.by_variable() {
            debug!(%group, %conversion, "value ignored on variable operand");
            return false;
        }
        target.value = Operand::Value(value);
        self.notifier
            .emit(ModelChange::ConversionEdited { group, conversion });
        true
    }

    // Conditions

    /// Adds a blank condition after `after` (or at the end). A group without
    /// a condition list gets one first.
    pub fn add_condition(&mut self, group: NodeId, after: Option<NodeId>) -> Option<NodeId> {
        let condition = self
            .group_mut(group)?
            .logic_mut_or_insert()
            .add_condition(after);
        self.notifier
            .emit(ModelChange::ConditionAdded { group, condition });
        Some(condition)
    }

    pub fn remove_condition(&mut self, group: NodeId, condition: NodeId) -> bool {
        let removed = self
            .group_mut(group)
            .and_then(|g| g.logic.as_mut())
            .and_then(|logic| logic.remove_condition(condition));
        if removed.is_none() {
            debug!(%group, %condition, "removal of unknown condition ignored");
            return false;
        }
        self.notifier
            .emit(ModelChange::ConditionRemoved { group, condition });
        true
    }

    pub fn edit_condition(
        &mut self,
        group: NodeId,
        condition: NodeId,
        operator: Option<ConditionOperator>,
        value: Option<Literal>,
    ) -> bool {
        let Some(target) = self.condition_mut(group, condition) else {
            return false;
        };
        target.operator = operator;
        target.value = value;
        self.notifier
            .emit(ModelChange::ConditionEdited { group, condition });
        true
    }

    // Mapping level

    /// Sets the top-level condition from a raw selector value; anything but
    /// `ANY`/`ALL` becomes `ALL`.
    pub fn set_condition(&mut self, code: &str) {
        self.mapping.set_condition_str(code);
        self.notifier.emit(ModelChange::MappingConditionChanged);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.mapping.description = Some(description.into());
        self.notifier.emit(ModelChange::DescriptionChanged);
    }

    /// Selects a schema on a variable. A different schema clears the
    /// attribute.
    pub fn set_variable_schema(&mut self, at: VariableRef, schema: Option<Schema>) -> bool {
        let Some(variable) = self.variable_mut(at) else {
            return false;
        };
        variable.set_schema(schema);
        self.after_variable_change(at);
        true
    }

    pub fn set_variable_attribute(&mut self, at: VariableRef, attribute: Option<Attribute>) -> bool {
        let Some(variable) = self.variable_mut(at) else {
            return false;
        };
        variable.set_attribute(attribute);
        self.after_variable_change(at);
        true
    }

    pub fn set_target_choice(&mut self, choice: Option<Choice>) {
        self.mapping.target_choice = choice;
        self.notifier.emit(ModelChange::TargetChoiceChanged);
    }

    fn after_variable_change(&mut self, at: VariableRef) {
        // A target that no longer has choices cannot keep a target choice.
        if at == VariableRef::Target && !self.mapping.targets_choice() {
            self.mapping.target_choice = None;
        }
        self.notifier.emit(ModelChange::VariableChanged(at));
    }

    // Lookups

    /// Typeahead query for one of the variable's selectors, or `None` when
    /// the variable is gone or lacks the selection the vocabulary needs.
    pub fn lookup_query(&self, at: VariableRef, vocabulary: Vocabulary, term: &str) -> Option<LookupQuery> {
        let variable = self.mapping.variable(at)?;
        LookupQuery::for_variable(variable, vocabulary, term, at == VariableRef::Target)
    }

    pub fn apply_schema_options(&mut self, at: VariableRef, schemata: Vec<Schema>) -> bool {
        self.apply_options(at, |variable| variable.options_mut().schemata = schemata)
    }

    pub fn apply_attribute_options(&mut self, at: VariableRef, attributes: Vec<Attribute>) -> bool {
        self.apply_options(at, |variable| variable.options_mut().attributes = attributes)
    }

    pub fn apply_choice_options(&mut self, at: VariableRef, choices: Vec<Choice>) -> bool {
        self.apply_options(at, |variable| variable.options_mut().choices = choices)
    }

    /// Stores the list matching `vocabulary` from a lookup response.
    pub fn apply_lookup(&mut self, at: VariableRef, vocabulary: Vocabulary, results: LookupResults) -> bool {
        match vocabulary {
            Vocabulary::AvailableSchemata => self.apply_schema_options(at, results.schemata),
            Vocabulary::AvailableAttributes => self.apply_attribute_options(at, results.attributes),
            Vocabulary::AvailableChoices => self.apply_choice_options(at, results.choices),
        }
    }

    fn apply_options(&mut self, at: VariableRef, apply: impl FnOnce(&mut Variable)) -> bool {
        let Some(variable) = self.mapping.variable_mut(at) else {
            debug!(?at, "lookup results for a removed variable dropped");
            return false;
        };
        apply(variable);
        self.notifier.emit(ModelChange::OptionsLoaded(at));
        true
    }

    // Persistence

    /// Fetches a stored mapping and replaces the current tree with it.
    pub async fn load<S: MappingStore>(&mut self, store: &S, id: MappingId) -> Result<(), EditorError> {
        self.is_loading = true;
        let result = store.fetch_mapping(id).await;
        self.is_loading = false;

        match result {
            Ok(data) => {
                self.mapping.update(&data);
                self.feedback = None;
                info!(%id, groups = self.mapping.groups_len(), "mapping loaded");
                self.notifier.emit(ModelChange::Hydrated);
                Ok(())
            }
            Err(error) => Err(self.fail("load", &error)),
        }
    }

    /// Validates locally and saves only when no errors are found. Errors
    /// are reported as feedback without contacting the store.
    pub async fn save_checked<S: MappingStore>(&mut self, store: &S) -> Result<(), EditorError> {
        let report = self.mapping.validate();
        if report.has_errors() {
            let message = report.first_error_message().unwrap_or_default();
            debug!(errors = report.error_count(), "save blocked by local validation");
            self.feedback = Some(Feedback::danger(message.clone()));
            return Err(EditorError::Invalid {
                errors: report.error_count(),
                message,
            });
        }
        self.save(store).await
    }

    /// Sends the full mapping: a create when it has no id yet, an update
    /// otherwise. A failed request leaves the tree untouched and is not
    /// retried.
    pub async fn save<S: MappingStore>(&mut self, store: &S) -> Result<(), EditorError> {
        let data = self.mapping.to_wire();
        self.is_loading = true;
        let result = match self.mapping.id {
            None => store.create_mapping(&data).await,
            Some(id) => store.update_mapping(id, &data).await,
        };
        self.is_loading = false;

        let response = match result {
            Ok(response) => response,
            Err(error) => return Err(self.fail("save", &error)),
        };
        match response {
            SaveResponse::Redirect(next) => self.next_location = Some(next),
            SaveResponse::Record(record) => self.mapping.update(&record),
            SaveResponse::Created(id) => self.mapping.id = Some(id),
            SaveResponse::Acknowledged => {}
        }
        info!(id = ?self.mapping.id, next = ?self.next_location, "mapping saved");
        self.feedback = Some(Feedback::success("Mapping saved."));
        self.notifier.emit(ModelChange::Saved);
        Ok(())
    }

    /// Fetches the review status and notes of the stored mapping.
    pub async fn refresh_review<S: MappingStore>(&mut self, store: &S) -> Result<(), EditorError> {
        let id = self.stored_id()?;
        match store.fetch_review(id).await {
            Ok(record) => {
                self.mapping.status = Some(record.status);
                self.review = Some(record);
                Ok(())
            }
            Err(error) => Err(self.fail("review", &error)),
        }
    }

    pub async fn update_status<S: MappingStore>(
        &mut self,
        store: &S,
        status: MappingStatus,
    ) -> Result<(), EditorError> {
        let id = self.stored_id()?;
        if let Err(error) = store.put_status(id, status).await {
            let failure = self.fail("status update", &error);
            self.feedback = Some(Feedback::danger(format!(
                "There was an error updating the status. {}",
                failure.user_message()
            )));
            return Err(failure);
        }
        self.mapping.status = Some(status);
        match &mut self.review {
            Some(review) => review.status = status,
            None => {
                self.review = Some(ReviewRecord {
                    status,
                    notes: None,
                });
            }
        }
        self.feedback = Some(Feedback::success("Status successfully updated."));
        self.notifier.emit(ModelChange::StatusChanged(status));
        Ok(())
    }

    pub async fn update_notes<S: MappingStore>(&mut self, store: &S, notes: &str) -> Result<(), EditorError> {
        let id = self.stored_id()?;
        if let Err(error) = store.put_notes(id, notes).await {
            let failure = self.fail("notes update", &error);
            self.feedback = Some(Feedback::danger(format!(
                "There was an error updating your note. {}",
                failure.user_message()
            )));
            return Err(failure);
        }
        if let Some(review) = &mut self.review {
            review.notes = Some(notes.to_string());
        }
        self.feedback = Some(Feedback::success("Your note was successfully updated."));
        self.notifier.emit(ModelChange::NotesChanged);
        Ok(())
    }

    fn stored_id(&mut self) -> Result<MappingId, EditorError> {
        self.mapping.id.ok_or_else(|| {
            self.feedback = Some(Feedback::danger(EditorError::NotSaved.user_message()));
            EditorError::NotSaved
        })
    }

    /// Records the failure as feedback and converts it.
    fn fail<E: StoreFailure>(&mut self, operation: &str, error: &E) -> EditorError {
        warn!(operation, %error, "store request failed");
        let error = classify(error);
        self.feedback = Some(Feedback::danger(error.user_message()));
        error
    }

    // Node lookup with stale-reference logging

    fn group_mut(&mut self, group: NodeId) -> Option<&mut Group> {
        let found = self.mapping.group_mut(group);
        if found.is_none() {
            debug!(%group, "edit on unknown group ignored");
        }
        found
    }

    fn conversion_mut(&mut self, group: NodeId, conversion: NodeId) -> Option<&mut Conversion> {
        let found = self
            .mapping
            .group_mut(group)
            .and_then(|g| g.conversion_mut(conversion));
        if found.is_none() {
            debug!(%group, %conversion, "edit on unknown conversion ignored");
        }
        found
    }

    fn condition_mut(&mut self, group: NodeId, condition: NodeId) -> Option<&mut Condition> {
        let found = self
            .mapping
            .group_mut(group)
            .and_then(|g| g.logic.as_mut())
            .and_then(|logic| logic.get_mut(condition));
        if found.is_none() {
            debug!(%group, %condition, "edit on unknown condition ignored");
        }
        found
    }

    fn variable_mut(&mut self, at: VariableRef) -> Option<&mut Variable> {
        let found = self.mapping.variable_mut(at);
        if found.is_none() {
            debug!(?at, "edit on unknown variable ignored");
        }
        found
    }
}

fn classify<E: StoreFailure>(error: &E) -> EditorError {
    match error.failure_kind() {
        FailureKind::Validation(message) => EditorError::Rejected(message),
        FailureKind::Transport => EditorError::Unavailable(error.to_string()),
    }
}

impl From<Mapping> for MappingEditor {
    fn from(mapping: Mapping) -> Self {
        Self::with_mapping(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use vmap_model::Node;

    fn recording(editor: &mut MappingEditor) -> Arc<Mutex<Vec<ModelChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        editor.subscribe(move |change| sink.lock().unwrap().push(change.clone()));
        seen
    }

    fn first_group(editor: &MappingEditor) -> NodeId {
        editor.mapping().groups()[0].id()
    }

    #[test]
    fn each_edit_notifies_once() {
        let mut editor = MappingEditor::new();
        let seen = recording(&mut editor);
        let group = first_group(&editor);

        let copy = editor.copy_group(group).unwrap();
        let conversion = editor.add_conversion(copy, None).unwrap();
        editor.remove_group(group);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ModelChange::GroupCopied { source: group, copy },
                ModelChange::ConversionAdded {
                    group: copy,
                    conversion
                },
                ModelChange::GroupRemoved(group),
            ]
        );
    }

    #[test]
    fn stale_references_are_silent() {
        let mut editor = MappingEditor::new();
        let group = first_group(&editor);
        let conversion = editor.mapping().groups()[0].conversions()[0].id();
        editor.remove_group(group);
        let seen = recording(&mut editor);

        assert!(editor.add_conversion(group, None).is_none());
        assert!(!editor.remove_conversion(group, conversion));
        assert!(editor.add_condition(group, None).is_none());
        assert!(editor.copy_group(group).is_none());
        assert!(!editor.change_operand_type(group, conversion, OperandKind::Value));
        assert!(!editor.apply_schema_options(
            VariableRef::Conversion { group, conversion },
            vec![Schema::new("vitals")]
        ));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn add_condition_attaches_logic() {
        let mut editor = MappingEditor::new();
        let group = editor.add_group();
        editor.mapping.group_mut(group).unwrap().logic = None;

        let condition = editor.add_condition(group, None).unwrap();
        let logic = editor.mapping().group(group).unwrap().logic.as_ref().unwrap();
        assert!(logic.contains(condition));
    }

    #[test]
    fn value_edit_skips_variable_operand() {
        let mut editor = MappingEditor::new();
        let group = first_group(&editor);
        let conversion = editor.mapping().groups()[0].conversions()[0].id();
        assert!(!editor.set_conversion_value(group, conversion, Some(1.into())));

        editor.change_operand_type(group, conversion, OperandKind::Value);
        assert!(editor.set_conversion_value(group, conversion, Some(1.into())));
    }

    #[test]
    fn target_change_drops_target_choice() {
        let mut editor = MappingEditor::new();
        editor.set_variable_schema(VariableRef::Target, Some(Schema::new("history")));
        editor.set_variable_attribute(
            VariableRef::Target,
            Some(Attribute::new("smoker", vmap_model::AttributeType::Choice)),
        );
        editor.set_target_choice(Some(Choice::new("1", "Yes")));
        assert!(editor.mapping().target_choice.is_some());

        editor.set_variable_schema(VariableRef::Target, Some(Schema::new("vitals")));
        assert!(editor.mapping().target.attribute().is_none());
        assert!(editor.mapping().target_choice.is_none());
    }

    #[test]
    fn lookup_query_marks_target() {
        let editor = MappingEditor::new();
        let query = editor
            .lookup_query(VariableRef::Target, Vocabulary::AvailableSchemata, "vi")
            .unwrap();
        assert_eq!(query.is_target, Some(true));
        assert!(editor
            .lookup_query(VariableRef::Target, Vocabulary::AvailableChoices, "")
            .is_none());
    }
}
