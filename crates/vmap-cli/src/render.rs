//! One-line text forms of rule parts for terminal output.

use vmap_map::{Outcome, Progress};
use vmap_model::{Condition, ConditionList, Group, Mapping, Operand};

pub fn operand_text(operand: &Operand) -> String {
    match operand {
        Operand::Variable(variable) => variable.label(),
        Operand::Value(Some(literal)) => literal.to_string(),
        Operand::Value(None) => "?".to_string(),
    }
}

/// The group's conversions as an expression, e.g.
/// `site.weight_lb / 2.2`. Missing operators show as `?`.
pub fn expression_text(group: &Group) -> String {
    let mut parts = Vec::with_capacity(group.len() * 2);
    for (index, conversion) in group.conversions().iter().enumerate() {
        if index > 0 {
            parts.push(conversion.operator.map_or("?", |op| op.symbol()).to_string());
        }
        parts.push(operand_text(&conversion.value));
    }
    if parts.is_empty() {
        return "(empty)".to_string();
    }
    parts.join(" ")
}

fn condition_text(condition: &Condition) -> String {
    format!(
        "{} {}",
        condition.operator.map_or("?", |op| op.as_code()),
        condition.value.as_ref().map_or_else(|| "?".to_string(), ToString::to_string)
    )
}

/// `ALL(GT 0, LT 500)`, or `None` when there is nothing to check.
pub fn gate_text(logic: Option<&ConditionList>) -> Option<String> {
    let list = logic?;
    if list.conditions().is_empty() {
        return None;
    }
    let conditions: Vec<String> = list.conditions().iter().map(condition_text).collect();
    Some(format!("{}({})", list.operator, conditions.join(", ")))
}

pub fn group_text(group: &Group) -> String {
    match gate_text(group.logic.as_ref()) {
        Some(gate) => format!("{} when {gate}", expression_text(group)),
        None => expression_text(group),
    }
}

/// The mapping's target, with the asserted choice if any.
pub fn target_text(mapping: &Mapping) -> String {
    match &mapping.target_choice {
        Some(choice) => format!("{} = {}", mapping.target.label(), choice.name),
        None => mapping.target.label(),
    }
}

pub fn outcome_text(mapping: &Mapping, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Value(value) => format!("{} = {value}", mapping.target.label()),
        Outcome::Choice(choice) => format!("{} = {choice}", mapping.target.label()),
        Outcome::Skipped => format!("{} not imputed", mapping.target.label()),
    }
}

pub fn progress_text(progress: Progress) -> String {
    format!("{progress} mappings applied")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmap_model::{
        ArithmeticOperator, Attribute, AttributeType, ConditionOperator, Conversion, Literal,
        Schema, Variable,
    };

    fn weight_group() -> Group {
        let mut group = Group::new();
        group.insert_conversion(
            None,
            Conversion::with_operand(
                None,
                Operand::Variable(Variable::new(
                    Schema::new("site"),
                    Attribute::new("weight_lb", AttributeType::Number),
                )),
            ),
        );
        group.insert_conversion(
            None,
            Conversion::with_operand(
                Some(ArithmeticOperator::Div),
                Operand::Value(Some(Literal::number(2.2).unwrap())),
            ),
        );
        group
    }

    #[test]
    fn group_without_gate() {
        assert_eq!(group_text(&weight_group()), "site.weight_lb / 2.2");
        assert_eq!(expression_text(&Group::new()), "(empty)");
    }

    #[test]
    fn group_with_gate() {
        let mut group = weight_group();
        let logic = group.logic_mut_or_insert();
        logic.insert_condition(None, Condition::new(ConditionOperator::Gt, 0));
        logic.insert_condition(None, Condition::default());
        assert_eq!(group_text(&group), "site.weight_lb / 2.2 when ALL(GT 0, ? ?)");
    }

    #[test]
    fn skeleton_renders_placeholders() {
        let mapping = Mapping::new();
        assert_eq!(group_text(&mapping.groups()[0]), "?.?");
        assert_eq!(outcome_text(&mapping, &Outcome::Skipped), "?.? not imputed");
    }
}
