//! Operator and status enumerations of the rule language.
//!
//! Each operator category is its own closed enum so a comparison operator can
//! never end up where an arithmetic one is expected. Wire spellings are the
//! upper-case codes the server stores (`EQ`, `MUL`, `ALL`, ...).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Combinator over a list of conditions (or over groups, at mapping level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    /// Logical OR: at least one member must hold.
    Any,
    /// Logical AND: every member must hold.
    #[default]
    All,
}

impl LogicalOperator {
    pub const ALL_VARIANTS: [LogicalOperator; 2] = [LogicalOperator::Any, LogicalOperator::All];

    pub fn as_code(&self) -> &'static str {
        match self {
            LogicalOperator::Any => "ANY",
            LogicalOperator::All => "ALL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogicalOperator::Any => "Any",
            LogicalOperator::All => "All",
        }
    }

    /// Reads an operator code, snapping anything that is not `ANY`/`ALL`
    /// back to the default `ALL`.
    pub fn coerce(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }

    /// Combines member results. An empty set holds for both operators:
    /// an `ANY` list with no conditions passes, unlike a plain `any` over
    /// nothing, so a group whose gate is still empty does not block.
    pub fn combine<I>(&self, results: I) -> bool
    where
        I: IntoIterator<Item = bool>,
    {
        let mut results = results.into_iter().peekable();
        if results.peek().is_none() {
            return true;
        }
        match self {
            LogicalOperator::Any => results.any(|r| r),
            LogicalOperator::All => results.all(|r| r),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for LogicalOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ANY" => Ok(LogicalOperator::Any),
            "ALL" => Ok(LogicalOperator::All),
            _ => Err(format!("Unknown logical operator: {s}")),
        }
    }
}

/// Deserializes a logical operator leniently: missing, null or unknown
/// values become `ALL`.
pub fn deserialize_logical_clamped<'de, D>(deserializer: D) -> Result<LogicalOperator, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(code)) => LogicalOperator::coerce(&code),
        _ => LogicalOperator::default(),
    })
}

/// Comparison applied by a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionOperator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ConditionOperator {
    pub const ALL_VARIANTS: [ConditionOperator; 6] = [
        ConditionOperator::Eq,
        ConditionOperator::Ne,
        ConditionOperator::Lt,
        ConditionOperator::Lte,
        ConditionOperator::Gt,
        ConditionOperator::Gte,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            ConditionOperator::Eq => "EQ",
            ConditionOperator::Ne => "NE",
            ConditionOperator::Lt => "LT",
            ConditionOperator::Lte => "LTE",
            ConditionOperator::Gt => "GT",
            ConditionOperator::Gte => "GTE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConditionOperator::Eq => "is equal to",
            ConditionOperator::Ne => "is not equal to",
            ConditionOperator::Lt => "is less than",
            ConditionOperator::Lte => "is less than or equal to",
            ConditionOperator::Gt => "is greater than",
            ConditionOperator::Gte => "is greater than or equal to",
        }
    }

    /// Applies the comparison to an already computed ordering of
    /// `left` against `right`.
    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            ConditionOperator::Eq => ordering == Equal,
            ConditionOperator::Ne => ordering != Equal,
            ConditionOperator::Lt => ordering == Less,
            ConditionOperator::Lte => ordering != Greater,
            ConditionOperator::Gt => ordering == Greater,
            ConditionOperator::Gte => ordering != Less,
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for ConditionOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        ConditionOperator::ALL_VARIANTS
            .into_iter()
            .find(|op| op.as_code() == normalized)
            .ok_or_else(|| format!("Unknown condition operator: {s}"))
    }
}

/// One arithmetic step of a conversion chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArithmeticOperator {
    Mul,
    Div,
    Add,
    Sub,
}

impl ArithmeticOperator {
    pub const ALL_VARIANTS: [ArithmeticOperator; 4] = [
        ArithmeticOperator::Mul,
        ArithmeticOperator::Div,
        ArithmeticOperator::Add,
        ArithmeticOperator::Sub,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            ArithmeticOperator::Mul => "MUL",
            ArithmeticOperator::Div => "DIV",
            ArithmeticOperator::Add => "ADD",
            ArithmeticOperator::Sub => "SUB",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOperator::Mul => "*",
            ArithmeticOperator::Div => "/",
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Sub => "-",
        }
    }

    /// Applies the operator. Division by zero has no result.
    pub fn apply(&self, left: f64, right: f64) -> Option<f64> {
        match self {
            ArithmeticOperator::Mul => Some(left * right),
            ArithmeticOperator::Div if right == 0.0 => None,
            ArithmeticOperator::Div => Some(left / right),
            ArithmeticOperator::Add => Some(left + right),
            ArithmeticOperator::Sub => Some(left - right),
        }
    }
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for ArithmeticOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        ArithmeticOperator::ALL_VARIANTS
            .into_iter()
            .find(|op| op.as_code() == normalized || op.symbol() == normalized)
            .ok_or_else(|| format!("Unknown arithmetic operator: {s}"))
    }
}

/// Review status of a mapping. Owned by the server; the client only caches
/// it and asks the server to change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingStatus {
    Review,
    InProgress,
    Approved,
    Rejected,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Review => "review",
            MappingStatus::InProgress => "in-progress",
            MappingStatus::Approved => "approved",
            MappingStatus::Rejected => "rejected",
        }
    }

    /// Badge level used by review screens.
    pub fn level(&self) -> &'static str {
        match self {
            MappingStatus::Review => "warning",
            MappingStatus::InProgress => "primary",
            MappingStatus::Approved => "approved",
            MappingStatus::Rejected => "danger",
        }
    }

    /// True once the review has reached a final decision.
    pub fn is_final(&self) -> bool {
        matches!(self, MappingStatus::Approved | MappingStatus::Rejected)
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "review" => Ok(MappingStatus::Review),
            "in-progress" => Ok(MappingStatus::InProgress),
            "approved" => Ok(MappingStatus::Approved),
            "rejected" => Ok(MappingStatus::Rejected),
            _ => Err(format!("Unknown mapping status: {s}")),
        }
    }
}
