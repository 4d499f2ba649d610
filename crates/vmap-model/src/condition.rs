use crate::enums::{ConditionOperator, LogicalOperator};
use crate::ids::{self, Node, NodeId};
use crate::literal::Literal;
use crate::wire::{ConditionData, ConditionListData};

/// A single comparison against a literal.
#[derive(Debug)]
pub struct Condition {
    id: NodeId,
    pub operator: Option<ConditionOperator>,
    pub value: Option<Literal>,
}

impl Condition {
    pub fn new(operator: ConditionOperator, value: impl Into<Literal>) -> Self {
        Self {
            id: NodeId::next(),
            operator: Some(operator),
            value: Some(value.into()),
        }
    }

    pub fn from_wire(data: &ConditionData) -> Self {
        Self {
            id: NodeId::next(),
            operator: data.operator,
            value: data.value.clone(),
        }
    }

    pub fn to_wire(&self) -> ConditionData {
        ConditionData {
            operator: self.operator,
            value: self.value.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.operator.is_some() && self.value.is_some()
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            id: NodeId::next(),
            operator: None,
            value: None,
        }
    }
}

impl Node for Condition {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// Conditions combined with ANY or ALL.
#[derive(Debug, Default)]
pub struct ConditionList {
    pub operator: LogicalOperator,
    conditions: Vec<Condition>,
}

impl ConditionList {
    pub fn new(operator: LogicalOperator) -> Self {
        Self {
            operator,
            conditions: Vec::new(),
        }
    }

    pub fn from_wire(data: &ConditionListData) -> Self {
        let mut list = Self::default();
        list.update(data);
        list
    }

    pub fn to_wire(&self) -> ConditionListData {
        ConditionListData {
            operator: self.operator,
            conditions: self.conditions.iter().map(Condition::to_wire).collect(),
        }
    }

    /// Rebuilds the list from wire data with fresh conditions.
    pub fn update(&mut self, data: &ConditionListData) {
        self.operator = data.operator;
        self.conditions = data.conditions.iter().map(Condition::from_wire).collect();
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The ANY/ALL selector only means something with two or more
    /// conditions.
    pub fn has_multiple(&self) -> bool {
        self.len() > 1
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        ids::position_of(&self.conditions, id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Condition> {
        self.conditions.iter_mut().find(|c| c.id() == id)
    }

    /// Inserts a blank condition right after `after`, or at the end.
    pub fn add_condition(&mut self, after: Option<NodeId>) -> NodeId {
        self.insert_condition(after, Condition::default())
    }

    pub fn insert_condition(&mut self, after: Option<NodeId>, condition: Condition) -> NodeId {
        let id = condition.id();
        ids::insert_after(&mut self.conditions, after, condition);
        id
    }

    /// Removes the condition with this identity. Other conditions with the
    /// same operator and value are untouched.
    pub fn remove_condition(&mut self, id: NodeId) -> Option<Condition> {
        ids::remove_node(&mut self.conditions, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_condition_after_reference() {
        let mut list = ConditionList::default();
        let first = list.add_condition(None);
        let last = list.add_condition(None);
        let middle = list.add_condition(Some(first));

        let order: Vec<NodeId> = list.conditions().iter().map(Node::id).collect();
        assert_eq!(order, vec![first, middle, last]);
        assert!(list.has_multiple());
    }

    #[test]
    fn new_condition_is_blank() {
        let mut list = ConditionList::default();
        let id = list.add_condition(None);
        let condition = list.get(id).unwrap();
        assert!(condition.operator.is_none());
        assert!(condition.value.is_none());
        assert!(!condition.is_complete());
    }

    #[test]
    fn equal_conditions_removed_independently() {
        let mut list = ConditionList::default();
        let a = list.insert_condition(None, Condition::new(ConditionOperator::Eq, 1));
        let b = list.insert_condition(None, Condition::new(ConditionOperator::Eq, 1));

        assert!(list.remove_condition(a).is_some());
        assert_eq!(list.len(), 1);
        assert!(list.contains(b));
        assert!(list.remove_condition(a).is_none());
    }

    #[test]
    fn default_operator_is_all() {
        assert_eq!(ConditionList::default().operator, LogicalOperator::All);
    }
}
