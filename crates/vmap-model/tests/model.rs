//! Tests for the vmap-model rule tree.

use vmap_model::{
    Attribute, AttributeType, Condition, ConditionOperator, Conversion, LogicalOperator, Mapping,
    Node, NodeId, Operand, OperandKind, Schema, Variable, VariableRef,
};

fn first_group(mapping: &Mapping) -> NodeId {
    mapping.groups()[0].id()
}

#[test]
fn default_skeleton() {
    let mapping = Mapping::new();
    assert_eq!(mapping.groups_len(), 1);
    let group = &mapping.groups()[0];
    assert_eq!(group.len(), 1);
    let operand = group.conversions()[0].variable().unwrap();
    assert!(operand.schema().is_none());
    assert!(group.logic.as_ref().unwrap().conditions().is_empty());
}

#[test]
fn schema_change_clears_attribute_through_variable_ref() {
    let mut mapping = Mapping::new();
    let group = first_group(&mapping);
    let conversion = mapping.groups()[0].conversions()[0].id();
    let at = VariableRef::Conversion { group, conversion };

    let variable = mapping.variable_mut(at).unwrap();
    variable.set_schema(Some(Schema::new("labs")));
    variable.set_attribute(Some(Attribute::new("glucose", AttributeType::Number)));
    variable.set_schema(Some(Schema::new("vitals")));

    let variable = mapping.variable(at).unwrap();
    assert_eq!(variable.schema().unwrap().name, "vitals");
    assert!(variable.attribute().is_none());
}

#[test]
fn copy_is_independent_of_original() {
    let mut mapping = Mapping::new();
    let original = first_group(&mapping);
    mapping
        .group_mut(original)
        .unwrap()
        .logic_mut_or_insert()
        .insert_condition(None, Condition::new(ConditionOperator::Gt, 10));

    let copy = mapping.copy_group(original).unwrap();
    assert_ne!(copy, original);

    let copied = mapping.group_mut(copy).unwrap();
    let condition = copied.logic.as_ref().unwrap().conditions()[0].id();
    copied
        .logic_mut_or_insert()
        .get_mut(condition)
        .unwrap()
        .operator = Some(ConditionOperator::Lt);
    copied.add_conversion(None);

    let original = mapping.group(original).unwrap();
    assert_eq!(original.len(), 1);
    assert_eq!(
        original.logic.as_ref().unwrap().conditions()[0].operator,
        Some(ConditionOperator::Gt)
    );
    assert_ne!(original.logic.as_ref().unwrap().conditions()[0].id(), condition);
}

#[test]
fn conversions_keep_order_and_remove_by_identity() {
    let mut mapping = Mapping::new();
    let group_id = first_group(&mapping);
    let group = mapping.group_mut(group_id).unwrap();
    let first = group.conversions()[0].id();

    let last = group.add_conversion(None);
    let middle = group.add_conversion(Some(first));
    let order: Vec<NodeId> = group.conversions().iter().map(Node::id).collect();
    assert_eq!(order, vec![first, middle, last]);

    assert!(group.remove_conversion(middle).is_some());
    assert!(group.remove_conversion(middle).is_none());
    assert_eq!(group.len(), 2);
}

#[test]
fn change_type_round_trips_through_kinds() {
    let mut conversion = Conversion::with_operand(
        None,
        Operand::Variable(Variable::new(
            Schema::new("vitals"),
            Attribute::new("height", AttributeType::Number),
        )),
    );
    conversion.change_type(OperandKind::Value);
    conversion.value = Operand::Value(Some(12.into()));
    conversion.change_type("VAR".parse().unwrap());
    assert!(conversion.variable().unwrap().is_empty());
}

#[test]
fn removing_every_group_leaves_an_empty_mapping() {
    let mut mapping = Mapping::new();
    let only = first_group(&mapping);
    assert!(mapping.remove_group(only).is_some());
    assert_eq!(mapping.groups_len(), 0);
    assert!(mapping.validate().has_errors());
}

#[test]
fn condition_setter_clamps() {
    let mut mapping = Mapping::new();
    for code in ["ANY", "any", "OR", "", "ALL"] {
        mapping.set_condition_str(code);
        let expected = if code == "ANY" {
            LogicalOperator::Any
        } else {
            LogicalOperator::All
        };
        assert_eq!(mapping.condition(), expected, "code {code:?}");
    }
}
