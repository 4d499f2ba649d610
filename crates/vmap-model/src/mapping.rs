//! The mapping aggregate: a target variable derived from source variables
//! through one or more rule groups.

use crate::enums::{LogicalOperator, MappingStatus};
use crate::group::Group;
use crate::ids::{self, MappingId, Node, NodeId};
use crate::reference::Choice;
use crate::variable::Variable;
use crate::wire::{MappingData, TargetChoiceData};

/// Address of a variable inside a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableRef {
    /// The mapping's target variable.
    Target,
    /// The operand of a conversion (only while it is a variable operand).
    Conversion { group: NodeId, conversion: NodeId },
}

/// Root of a rule tree.
///
/// `condition` is private so that it can only hold `ANY` or `ALL`: raw
/// strings go through [`Mapping::set_condition_str`], which snaps anything
/// else back to `ALL`.
#[derive(Debug)]
pub struct Mapping {
    pub id: Option<MappingId>,
    /// `Some("")` is kept apart from `None`; the server sends an empty
    /// description for mappings that never had one.
    pub description: Option<String>,
    pub status: Option<MappingStatus>,
    pub target: Variable,
    pub target_choice: Option<Choice>,
    /// Whether the loaded record carried a `targetChoice` slot; an empty
    /// slot is written back as `{}`.
    choice_slot: bool,
    condition: LogicalOperator,
    groups: Vec<Group>,
}

impl Mapping {
    /// A new mapping with the default first-edit skeleton: a single group
    /// holding one variable conversion and an empty condition list.
    pub fn new() -> Self {
        let mut mapping = Self::empty();
        mapping.add_group();
        mapping
    }

    fn empty() -> Self {
        Self {
            id: None,
            description: None,
            status: None,
            target: Variable::default(),
            target_choice: None,
            choice_slot: false,
            condition: LogicalOperator::default(),
            groups: Vec::new(),
        }
    }

    pub fn from_wire(data: &MappingData) -> Self {
        let mut mapping = Self::empty();
        mapping.update(data);
        mapping
    }

    pub fn to_wire(&self) -> MappingData {
        MappingData {
            id: self.id,
            description: self.description.clone(),
            status: self.status,
            target: self.target.to_wire(),
            target_choice: match &self.target_choice {
                Some(choice) => Some(TargetChoiceData::Choice(choice.clone())),
                None if self.choice_slot => Some(TargetChoiceData::Empty),
                None => None,
            },
            condition: self.condition,
            groups: self.groups.iter().map(Group::to_wire).collect(),
        }
    }

    /// Full hydration from wire data. Every group is rebuilt, so node ids
    /// handed out before the call no longer resolve afterwards.
    pub fn update(&mut self, data: &MappingData) {
        self.id = data.id;
        self.status = data.status;
        self.description = data.description.clone();
        self.target = Variable::from_wire(&data.target);
        self.target_choice = data
            .target_choice
            .as_ref()
            .and_then(TargetChoiceData::choice)
            .cloned();
        self.choice_slot = data.target_choice.is_some();
        self.set_condition(data.condition);
        self.groups = data.groups.iter().map(Group::from_wire).collect();
    }

    pub fn condition(&self) -> LogicalOperator {
        self.condition
    }

    pub fn set_condition(&mut self, condition: LogicalOperator) {
        self.condition = condition;
    }

    /// Sets the top-level condition from a raw code. Anything other than
    /// `ANY`/`ALL` becomes `ALL`.
    pub fn set_condition_str(&mut self, code: &str) {
        self.condition = LogicalOperator::coerce(code);
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn groups_len(&self) -> usize {
        self.groups.len()
    }

    pub fn has_multiple_groups(&self) -> bool {
        self.groups_len() > 1
    }

    pub fn group_position(&self, id: NodeId) -> Option<usize> {
        ids::position_of(&self.groups, id)
    }

    pub fn group(&self, id: NodeId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id() == id)
    }

    pub fn group_mut(&mut self, id: NodeId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id() == id)
    }

    /// Appends a skeleton group and returns its id.
    pub fn add_group(&mut self) -> NodeId {
        let group = Group::skeleton();
        let id = group.id();
        self.groups.push(group);
        id
    }

    /// Deep-copies a group through its wire form and inserts the copy right
    /// after the original. The copy shares nothing with the original.
    pub fn copy_group(&mut self, id: NodeId) -> Option<NodeId> {
        let index = self.group_position(id)?;
        let copy = Group::from_wire(&self.groups[index].to_wire());
        let copy_id = copy.id();
        self.groups.insert(index + 1, copy);
        Some(copy_id)
    }

    pub fn remove_group(&mut self, id: NodeId) -> Option<Group> {
        ids::remove_node(&mut self.groups, id)
    }

    pub fn variable(&self, at: VariableRef) -> Option<&Variable> {
        match at {
            VariableRef::Target => Some(&self.target),
            VariableRef::Conversion { group, conversion } => {
                self.group(group)?.conversion(conversion)?.variable()
            }
        }
    }

    pub fn variable_mut(&mut self, at: VariableRef) -> Option<&mut Variable> {
        match at {
            VariableRef::Target => Some(&mut self.target),
            VariableRef::Conversion { group, conversion } => self
                .group_mut(group)?
                .conversion_mut(conversion)?
                .variable_mut(),
        }
    }

    /// Whether the target is a choice attribute; such mappings assert a
    /// single target choice rather than compute a value.
    pub fn targets_choice(&self) -> bool {
        self.target.has_choices()
    }

    /// Every source variable referenced by a conversion, in rule order.
    pub fn source_variables(&self) -> impl Iterator<Item = &Variable> {
        self.groups
            .iter()
            .flat_map(|g| g.conversions().iter())
            .filter_map(|c| c.variable())
    }
}

impl Default for Mapping {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mapping_has_skeleton() {
        let mapping = Mapping::new();
        assert_eq!(mapping.groups_len(), 1);
        assert!(!mapping.has_multiple_groups());
        assert_eq!(mapping.condition(), LogicalOperator::All);
        let group = &mapping.groups()[0];
        assert_eq!(group.len(), 1);
        assert!(group.conversions()[0].variable().unwrap().schema().is_none());
        assert_eq!(group.logic.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn condition_clamps() {
        let mut mapping = Mapping::new();
        mapping.set_condition_str("ANY");
        assert_eq!(mapping.condition(), LogicalOperator::Any);
        mapping.set_condition_str("NONE");
        assert_eq!(mapping.condition(), LogicalOperator::All);
    }

    #[test]
    fn copy_is_inserted_after_original() {
        let mut mapping = Mapping::new();
        let first = mapping.groups()[0].id();
        let second = mapping.add_group();
        let copy = mapping.copy_group(first).unwrap();

        let order: Vec<NodeId> = mapping.groups().iter().map(Node::id).collect();
        assert_eq!(order, vec![first, copy, second]);
    }

    #[test]
    fn copy_of_missing_group_is_none() {
        let mut mapping = Mapping::new();
        let gone = mapping.add_group();
        mapping.remove_group(gone);
        assert!(mapping.copy_group(gone).is_none());
        assert_eq!(mapping.groups_len(), 1);
    }

    #[test]
    fn variable_lookup_by_ref() {
        let mut mapping = Mapping::new();
        let group = mapping.groups()[0].id();
        let conversion = mapping.groups()[0].conversions()[0].id();
        let at = VariableRef::Conversion { group, conversion };
        assert!(mapping.variable_mut(at).is_some());

        mapping.remove_group(group);
        assert!(mapping.variable(at).is_none());
        assert!(mapping.variable(VariableRef::Target).is_some());
    }
}
