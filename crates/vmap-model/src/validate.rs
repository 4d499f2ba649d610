//! Local checks run before a mapping is sent to the server.
//!
//! The server remains authoritative; these checks catch the rules it would
//! reject anyway so the editor can report them inline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conversion::Operand;
use crate::enums::ArithmeticOperator;
use crate::group::Group;
use crate::mapping::Mapping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Where in the rule tree an issue was found. Indexes are zero based;
/// `Display` renders them one based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePath {
    Mapping,
    Target,
    TargetChoice,
    Group { group: usize },
    Conversion { group: usize, conversion: usize },
    Condition { group: usize, condition: usize },
}

impl fmt::Display for RulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulePath::Mapping => f.write_str("mapping"),
            RulePath::Target => f.write_str("target"),
            RulePath::TargetChoice => f.write_str("target choice"),
            RulePath::Group { group } => write!(f, "group {}", group + 1),
            RulePath::Conversion { group, conversion } => {
                write!(f, "group {}, conversion {}", group + 1, conversion + 1)
            }
            RulePath::Condition { group, condition } => {
                write!(f, "group {}, condition {}", group + 1, condition + 1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Stable check identifier (e.g., "VM003").
    pub code: String,
    pub message: String,
    pub severity: IssueSeverity,
    pub location: RulePath,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
    }

    /// First error rendered as `location: message`, for one-line feedback.
    pub fn first_error_message(&self) -> Option<String> {
        self.errors()
            .next()
            .map(|issue| format!("{}: {}", issue.location, issue.message))
    }

    fn push(&mut self, code: &str, severity: IssueSeverity, location: RulePath, message: String) {
        self.issues.push(ValidationIssue {
            code: code.to_string(),
            message,
            severity,
            location,
        });
    }

    fn error(&mut self, code: &str, location: RulePath, message: impl Into<String>) {
        self.push(code, IssueSeverity::Error, location, message.into());
    }

    fn warning(&mut self, code: &str, location: RulePath, message: impl Into<String>) {
        self.push(code, IssueSeverity::Warning, location, message.into());
    }
}

impl Mapping {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        check_target(self, &mut report);

        if self.groups().is_empty() {
            report.error("VM010", RulePath::Mapping, "Mapping has no rule groups");
        }
        for (index, group) in self.groups().iter().enumerate() {
            check_group(index, group, &mut report);
        }

        let lead = self
            .groups()
            .first()
            .and_then(|group| group.conversions().first());
        let first_conversion = RulePath::Conversion {
            group: 0,
            conversion: 0,
        };
        match lead.and_then(|conversion| conversion.variable()) {
            None if !self.groups().is_empty() => report.error(
                "VM012",
                first_conversion,
                "The first conversion must reference a source variable",
            ),
            // The server finds the study through this form's version.
            Some(variable) => {
                if let Some(schema) = variable.schema().filter(|s| s.publish_date.is_none()) {
                    report.error(
                        "VM013",
                        first_conversion,
                        format!("Source schema {} has no publish date", schema.name),
                    );
                }
            }
            None => {}
        }
        report
    }
}

fn check_target(mapping: &Mapping, report: &mut ValidationReport) {
    match mapping.target.schema() {
        None => report.error("VM001", RulePath::Target, "Select a target schema"),
        Some(schema) if schema.publish_date.is_none() => report.error(
            "VM005",
            RulePath::Target,
            format!("Target schema {} has no publish date", schema.name),
        ),
        Some(_) => {}
    }
    if mapping.target.schema().is_some() && mapping.target.attribute().is_none() {
        report.error("VM002", RulePath::Target, "Select a target attribute");
    }

    match (mapping.targets_choice(), &mapping.target_choice) {
        (true, None) => report.warning(
            "VM003",
            RulePath::TargetChoice,
            "Target attribute has choices but no target choice is selected",
        ),
        (false, Some(choice)) if mapping.target.attribute().is_some() => report.error(
            "VM004",
            RulePath::TargetChoice,
            format!("Target choice {choice} set for an attribute without choices"),
        ),
        _ => {}
    }
}

fn check_group(index: usize, group: &Group, report: &mut ValidationReport) {
    if group.is_empty() {
        report.error(
            "VM011",
            RulePath::Group { group: index },
            "Group has no conversions",
        );
    }

    for (position, conversion) in group.conversions().iter().enumerate() {
        let location = RulePath::Conversion {
            group: index,
            conversion: position,
        };
        match (position, conversion.operator) {
            (0, Some(operator)) => report.warning(
                "VM020",
                location,
                format!("Operator {operator} on the first conversion is ignored"),
            ),
            (0, None) => {}
            (_, None) => report.error("VM021", location, "Select an operator"),
            (_, Some(_)) => {}
        }

        match &conversion.value {
            Operand::Variable(variable) if !variable.is_complete() => report.error(
                "VM022",
                location,
                format!("Incomplete variable {}", variable.label()),
            ),
            Operand::Variable(_) => {}
            Operand::Value(None) => report.error("VM023", location, "Enter a value"),
            Operand::Value(Some(literal)) if literal.as_f64().is_none() => {
                report.error("VM024", location, format!("{literal} is not a number"))
            }
            Operand::Value(Some(literal)) => {
                if position > 0
                    && conversion.operator == Some(ArithmeticOperator::Div)
                    && literal.is_zero()
                {
                    report.error("VM025", location, "Division by zero");
                }
            }
        }
    }

    let Some(logic) = &group.logic else {
        return;
    };
    for (position, condition) in logic.conditions().iter().enumerate() {
        let location = RulePath::Condition {
            group: index,
            condition: position,
        };
        if condition.operator.is_none() {
            report.error("VM030", location, "Select a comparison operator");
        }
        if condition.value.is_none() {
            report.error("VM031", location, "Enter a comparison value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::Conversion;
    use crate::ids::Node;
    use crate::reference::{Attribute, AttributeType, Choice, Schema};
    use crate::variable::Variable;
    use chrono::NaiveDate;

    fn dated(name: &str) -> Schema {
        Schema::new(name).with_publish_date(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())
    }

    fn complete_mapping() -> Mapping {
        let mut mapping = Mapping::new();
        mapping.target = Variable::new(
            dated("vitals"),
            Attribute::new("weight_kg", AttributeType::Number),
        );
        let group = mapping.groups()[0].id();
        let group = mapping.group_mut(group).unwrap();
        let first = group.conversions()[0].id();
        *group.conversion_mut(first).unwrap().variable_mut().unwrap() = Variable::new(
            dated("site_vitals"),
            Attribute::new("weight_lb", AttributeType::Number),
        );
        mapping
    }

    #[test]
    fn complete_mapping_is_clean() {
        let report = complete_mapping().validate();
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }

    #[test]
    fn fresh_mapping_reports_missing_selections() {
        let report = Mapping::new().validate();
        assert!(report.has_errors());
        let codes: Vec<&str> = report.issues.iter().map(|i| i.code.as_str()).collect();
        assert!(codes.contains(&"VM001"));
        assert!(codes.contains(&"VM022"));
    }

    #[test]
    fn division_by_literal_zero() {
        let mut mapping = complete_mapping();
        let group = mapping.groups()[0].id();
        mapping.group_mut(group).unwrap().insert_conversion(
            None,
            Conversion::with_operand(Some(ArithmeticOperator::Div), Operand::Value(Some(0.into()))),
        );
        let report = mapping.validate();
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].code, "VM025");
        assert_eq!(
            report.first_error_message().unwrap(),
            "group 1, conversion 2: Division by zero"
        );
    }

    #[test]
    fn later_conversion_needs_operator() {
        let mut mapping = complete_mapping();
        let group = mapping.groups()[0].id();
        mapping
            .group_mut(group)
            .unwrap()
            .insert_conversion(None, Conversion::with_operand(None, Operand::Value(Some(2.into()))));
        let report = mapping.validate();
        assert_eq!(report.issues[0].code, "VM021");
    }

    #[test]
    fn target_choice_rules() {
        let mut mapping = complete_mapping();
        mapping.target_choice = Some(Choice::new("1", "Yes"));
        assert_eq!(mapping.validate().issues[0].code, "VM004");

        mapping.target.set_attribute(Some(Attribute::new("smoker", AttributeType::Choice)));
        mapping.target_choice = None;
        let report = mapping.validate();
        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn blank_condition_is_reported_twice() {
        let mut mapping = complete_mapping();
        let group = mapping.groups()[0].id();
        mapping
            .group_mut(group)
            .unwrap()
            .logic_mut_or_insert()
            .add_condition(None);
        let report = mapping.validate();
        assert_eq!(report.error_count(), 2);
        assert!(report
            .issues
            .iter()
            .all(|i| i.location == RulePath::Condition { group: 0, condition: 0 }));
    }

    #[test]
    fn undated_schemas_are_errors() {
        let mut mapping = complete_mapping();
        mapping.target.set_schema(Some(Schema::new("vitals")));
        let report = mapping.validate();
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].code, "VM005");
        assert_eq!(report.issues[0].location, RulePath::Target);

        let mut mapping = complete_mapping();
        let group = mapping.groups()[0].id();
        let group = mapping.group_mut(group).unwrap();
        let first = group.conversions()[0].id();
        *group.conversion_mut(first).unwrap().variable_mut().unwrap() = Variable::new(
            Schema::new("site_vitals"),
            Attribute::new("weight_lb", AttributeType::Number),
        );
        let report = mapping.validate();
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].code, "VM013");
    }
}
