use crate::condition::ConditionList;
use crate::conversion::Conversion;
use crate::ids::{self, Node, NodeId};
use crate::wire::GroupData;

/// A chain of conversions evaluated left to right, optionally gated by a
/// condition list. One alternative rule of a mapping.
#[derive(Debug)]
pub struct Group {
    id: NodeId,
    conversions: Vec<Conversion>,
    pub logic: Option<ConditionList>,
}

impl Group {
    /// An empty group: no conversions, no logic.
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            conversions: Vec::new(),
            logic: None,
        }
    }

    /// The starting point for a new rule: one conversion referencing an
    /// empty variable and an attached, empty condition list.
    pub fn skeleton() -> Self {
        let mut group = Self::new();
        group.conversions.push(Conversion::by_variable_empty());
        group.logic = Some(ConditionList::default());
        group
    }

    pub fn from_wire(data: &GroupData) -> Self {
        let mut group = Self::new();
        group.update(data);
        group
    }

    pub fn to_wire(&self) -> GroupData {
        GroupData {
            conversions: self.conversions.iter().map(Conversion::to_wire).collect(),
            logic: self.logic.as_ref().map(ConditionList::to_wire),
        }
    }

    pub fn update(&mut self, data: &GroupData) {
        self.conversions = data.conversions.iter().map(Conversion::from_wire).collect();
        self.logic = data.logic.as_ref().map(ConditionList::from_wire);
    }

    pub fn conversions(&self) -> &[Conversion] {
        &self.conversions
    }

    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    pub fn has_multiple(&self) -> bool {
        self.len() > 1
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        ids::position_of(&self.conversions, id)
    }

    pub fn conversion(&self, id: NodeId) -> Option<&Conversion> {
        self.conversions.iter().find(|c| c.id() == id)
    }

    pub fn conversion_mut(&mut self, id: NodeId) -> Option<&mut Conversion> {
        self.conversions.iter_mut().find(|c| c.id() == id)
    }

    /// Inserts a blank conversion right after `after`, or at the end.
    pub fn add_conversion(&mut self, after: Option<NodeId>) -> NodeId {
        self.insert_conversion(after, Conversion::default())
    }

    pub fn insert_conversion(&mut self, after: Option<NodeId>, conversion: Conversion) -> NodeId {
        let id = conversion.id();
        ids::insert_after(&mut self.conversions, after, conversion);
        id
    }

    pub fn remove_conversion(&mut self, id: NodeId) -> Option<Conversion> {
        ids::remove_node(&mut self.conversions, id)
    }

    /// The logic list, attaching an empty one first if the group has none.
    pub fn logic_mut_or_insert(&mut self) -> &mut ConditionList {
        self.logic.get_or_insert_with(ConditionList::default)
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Group {
    fn id(&self) -> NodeId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::Operand;

    #[test]
    fn skeleton_shape() {
        let group = Group::skeleton();
        assert_eq!(group.len(), 1);
        assert!(group.conversions()[0].variable().unwrap().is_empty());
        assert!(group.conversions()[0].operator.is_none());
        assert!(group.logic.as_ref().unwrap().is_empty());
    }

    #[test]
    fn add_conversion_defaults_to_blank_value() {
        let mut group = Group::skeleton();
        let id = group.add_conversion(None);
        let conversion = group.conversion(id).unwrap();
        assert_eq!(conversion.value, Operand::Value(None));
        assert!(group.has_multiple());
    }

    #[test]
    fn remove_unknown_conversion_is_noop() {
        let mut group = Group::skeleton();
        let other = Group::skeleton();
        let foreign = other.conversions()[0].id();
        assert!(group.remove_conversion(foreign).is_none());
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn logic_is_attached_on_demand() {
        let mut group = Group::new();
        assert!(group.logic.is_none());
        group.logic_mut_or_insert().add_condition(None);
        assert_eq!(group.logic.as_ref().unwrap().len(), 1);
    }
}
