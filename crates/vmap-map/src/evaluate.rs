//! Local evaluation of mapping rules against one subject's values.
//!
//! A group folds its conversions left to right: the first operand is the
//! starting value, and every later conversion applies its operator to the
//! running value and its own operand. The group's condition list then gates
//! the folded value.
//!
//! How groups combine depends on the target:
//! - a choice target treats every group as an assertion; the gate results
//!   are combined with the mapping's `condition` and, when that holds, the
//!   result is the target choice;
//! - any other target uses the first group only, and its folded value is
//!   the result when its gate passes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use vmap_model::{Condition, ConditionList, Group, Literal, Mapping, Operand, Variable};

/// A resolved value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Number(f64),
    Text(String),
    Missing,
}

impl Datum {
    pub fn is_missing(&self) -> bool {
        matches!(self, Datum::Missing)
    }

    /// Numeric view; text that spells a number counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Number(value) => Some(*value),
            Datum::Text(text) => text.trim().parse().ok(),
            Datum::Missing => None,
        }
    }

    /// Parses a raw value as given on a command line or in a data file.
    /// Blank input is missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Datum::Missing;
        }
        trimmed
            .parse::<f64>()
            .map_or_else(|_| Datum::Text(trimmed.to_string()), Datum::Number)
    }

    fn compare(&self, literal: &Literal) -> Option<Ordering> {
        match (self, literal) {
            (Datum::Missing, _) => None,
            (Datum::Text(text), Literal::Text(other)) => Some(text.as_str().cmp(other.as_str())),
            (datum, Literal::Bool(flag)) => datum
                .as_f64()
                .and_then(|value| value.partial_cmp(&f64::from(u8::from(*flag)))),
            (datum, literal) => datum.as_f64()?.partial_cmp(&literal.as_f64()?),
        }
    }
}

impl From<&Literal> for Datum {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(number) => number.as_f64().map_or(Datum::Missing, Datum::Number),
            Literal::Text(text) => Datum::Text(text.clone()),
            Literal::Bool(flag) => Datum::Number(f64::from(u8::from(*flag))),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Number(value) => write!(f, "{value}"),
            Datum::Text(text) => f.write_str(text),
            Datum::Missing => f.write_str("(missing)"),
        }
    }
}

/// Supplies the value a source variable has for the subject being
/// evaluated.
pub trait ValueResolver {
    fn resolve(&self, variable: &Variable) -> Datum;
}

impl<F> ValueResolver for F
where
    F: Fn(&Variable) -> Datum,
{
    fn resolve(&self, variable: &Variable) -> Datum {
        self(variable)
    }
}

/// Values keyed by `schema.attribute`.
impl ValueResolver for BTreeMap<String, Datum> {
    fn resolve(&self, variable: &Variable) -> Datum {
        self.get(&variable.label()).cloned().unwrap_or(Datum::Missing)
    }
}

/// Result of evaluating a whole mapping for one subject.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The computed value for a non-choice target.
    Value(Datum),
    /// The target choice asserted by a choice mapping.
    Choice(String),
    /// Nothing is written for this subject.
    Skipped,
}

fn resolve_operand(operand: &Operand, resolver: &impl ValueResolver) -> Datum {
    match operand {
        Operand::Variable(variable) => resolver.resolve(variable),
        Operand::Value(Some(literal)) => Datum::from(literal),
        Operand::Value(None) => Datum::Missing,
    }
}

/// Folds a group's conversions. Any missing operand or operator, a
/// non-numeric operand in arithmetic, or a division by zero makes the
/// result missing.
pub fn fold_group(group: &Group, resolver: &impl ValueResolver) -> Datum {
    let mut conversions = group.conversions().iter();
    let Some(first) = conversions.next() else {
        return Datum::Missing;
    };
    let mut running = resolve_operand(&first.value, resolver);

    for conversion in conversions {
        let Some(operator) = conversion.operator else {
            return Datum::Missing;
        };
        let operand = resolve_operand(&conversion.value, resolver);
        running = match (running.as_f64(), operand.as_f64()) {
            (Some(left), Some(right)) => operator
                .apply(left, right)
                .map_or(Datum::Missing, Datum::Number),
            _ => Datum::Missing,
        };
        if running.is_missing() {
            break;
        }
    }
    running
}

/// Whether a single condition holds for `value`. Incomplete conditions
/// never hold.
pub fn condition_holds(condition: &Condition, value: &Datum) -> bool {
    match (condition.operator, &condition.value) {
        (Some(operator), Some(literal)) => value
            .compare(literal)
            .is_some_and(|ordering| operator.holds(ordering)),
        _ => false,
    }
}

pub fn list_holds(list: &ConditionList, value: &Datum) -> bool {
    list.operator
        .combine(list.conditions().iter().map(|c| condition_holds(c, value)))
}

/// Whether the group's gate passes for its folded value. A group without
/// conditions always passes.
pub fn gate_passes(group: &Group, value: &Datum) -> bool {
    group.logic.as_ref().is_none_or(|list| list_holds(list, value))
}

pub fn evaluate(mapping: &Mapping, resolver: &impl ValueResolver) -> Outcome {
    if mapping.targets_choice() {
        let gates = mapping.groups().iter().map(|group| {
            let value = fold_group(group, resolver);
            gate_passes(group, &value)
        });
        let accepted = !mapping.groups().is_empty() && mapping.condition().combine(gates);
        return match (&mapping.target_choice, accepted) {
            (Some(choice), true) => Outcome::Choice(choice.name.clone()),
            _ => Outcome::Skipped,
        };
    }

    let Some(group) = mapping.groups().first() else {
        return Outcome::Skipped;
    };
    let value = fold_group(group, resolver);
    if value.is_missing() || !gate_passes(group, &value) {
        return Outcome::Skipped;
    }
    Outcome::Value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmap_model::{
        ArithmeticOperator, Attribute, AttributeType, Choice, ConditionOperator, Conversion,
        LogicalOperator, Node, Schema,
    };

    fn weight() -> Variable {
        Variable::new(
            Schema::new("site"),
            Attribute::new("weight_lb", AttributeType::Number),
        )
    }

    fn values(weight: f64) -> BTreeMap<String, Datum> {
        BTreeMap::from([("site.weight_lb".to_string(), Datum::Number(weight))])
    }

    /// weight_lb / 2.2, gated on `op value`.
    fn weight_group(gate: Option<(ConditionOperator, i64)>) -> Group {
        let mut group = Group::new();
        group.insert_conversion(None, Conversion::with_operand(None, Operand::Variable(weight())));
        group.insert_conversion(
            None,
            Conversion::with_operand(
                Some(ArithmeticOperator::Div),
                Operand::Value(Some(Literal::number(2.2).unwrap())),
            ),
        );
        if let Some((operator, value)) = gate {
            group
                .logic_mut_or_insert()
                .insert_condition(None, Condition::new(operator, value));
        }
        group
    }

    fn mapping_with(groups: Vec<Group>) -> Mapping {
        let mut mapping = Mapping::new();
        let skeleton = mapping.groups()[0].id();
        mapping.remove_group(skeleton);
        for group in groups {
            let id = mapping.add_group();
            *mapping.group_mut(id).unwrap() = group;
        }
        mapping
    }

    #[test]
    fn fold_applies_operators_in_order() {
        let mut group = weight_group(None);
        group.insert_conversion(
            None,
            Conversion::with_operand(Some(ArithmeticOperator::Add), Operand::Value(Some(1.into()))),
        );
        let value = fold_group(&group, &values(220.0));
        assert!((value.as_f64().unwrap() - 101.0).abs() < 1e-9);
    }

    #[test]
    fn fold_missing_cases() {
        let group = weight_group(None);
        assert_eq!(fold_group(&group, &BTreeMap::new()), Datum::Missing);

        let mut by_zero = Group::new();
        by_zero.insert_conversion(None, Conversion::with_operand(None, Operand::Value(Some(4.into()))));
        by_zero.insert_conversion(
            None,
            Conversion::with_operand(Some(ArithmeticOperator::Div), Operand::Value(Some(0.into()))),
        );
        assert_eq!(fold_group(&by_zero, &values(1.0)), Datum::Missing);

        let mut no_operator = Group::new();
        no_operator.insert_conversion(None, Conversion::with_operand(None, Operand::Value(Some(4.into()))));
        no_operator.insert_conversion(None, Conversion::default());
        assert_eq!(fold_group(&no_operator, &values(1.0)), Datum::Missing);
    }

    #[test]
    fn conditions_compare_folded_value() {
        let list = {
            let mut list = ConditionList::new(LogicalOperator::Any);
            list.insert_condition(None, Condition::new(ConditionOperator::Lt, 10));
            list.insert_condition(None, Condition::new(ConditionOperator::Eq, 100));
            list
        };
        assert!(list_holds(&list, &Datum::Number(100.0)));
        assert!(list_holds(&list, &Datum::Number(5.0)));
        assert!(!list_holds(&list, &Datum::Number(50.0)));
        assert!(!list_holds(&list, &Datum::Missing));
        assert!(list_holds(&ConditionList::default(), &Datum::Missing));
    }

    #[test]
    fn text_conditions() {
        let condition = Condition::new(ConditionOperator::Eq, "yes");
        assert!(condition_holds(&condition, &Datum::Text("yes".to_string())));
        assert!(!condition_holds(&condition, &Datum::Number(1.0)));
        assert!(!condition_holds(&Condition::default(), &Datum::Number(1.0)));
    }

    #[test]
    fn value_target_uses_first_group_only() {
        let mut mapping = mapping_with(vec![
            weight_group(Some((ConditionOperator::Gt, 0))),
            weight_group(Some((ConditionOperator::Lt, 0))),
        ]);
        mapping.target = Variable::new(
            Schema::new("vitals"),
            Attribute::new("weight_kg", AttributeType::Number),
        );
        match evaluate(&mapping, &values(22.0)) {
            Outcome::Value(Datum::Number(kg)) => assert!((kg - 10.0).abs() < 1e-9),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(evaluate(&mapping, &values(-22.0)), Outcome::Skipped);
    }

    #[test]
    fn choice_target_combines_groups() {
        let mut mapping = mapping_with(vec![
            weight_group(Some((ConditionOperator::Gte, 100))),
            weight_group(Some((ConditionOperator::Lt, 200))),
        ]);
        mapping.target = Variable::new(
            Schema::new("vitals"),
            Attribute::new("obese", AttributeType::Choice),
        );
        mapping.target_choice = Some(Choice::new("1", "Yes"));

        assert_eq!(evaluate(&mapping, &values(330.0)), Outcome::Choice("1".to_string()));
        assert_eq!(evaluate(&mapping, &values(110.0)), Outcome::Skipped);

        mapping.set_condition(LogicalOperator::Any);
        assert_eq!(evaluate(&mapping, &values(110.0)), Outcome::Choice("1".to_string()));

        mapping.target_choice = None;
        assert_eq!(evaluate(&mapping, &values(330.0)), Outcome::Skipped);
    }

    #[test]
    fn closures_resolve_values() {
        let group = weight_group(None);
        let resolver = |variable: &Variable| {
            if variable.label() == "site.weight_lb" {
                Datum::parse("44")
            } else {
                Datum::Missing
            }
        };
        assert_eq!(fold_group(&group, &resolver).as_f64().map(f64::round), Some(20.0));
    }
}
