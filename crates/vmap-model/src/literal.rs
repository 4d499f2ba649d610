use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ModelError, Result};

/// A scalar value typed into a rule: a conversion operand or a comparison
/// value.
///
/// Numbers keep the server's spelling (`100` stays an integer, `1.5` a
/// float) so that stored rules are written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Literal {
    /// Builds a numeric literal. Non-finite values have no JSON spelling.
    pub fn number(value: f64) -> Result<Self> {
        serde_json::Number::from_f64(value)
            .map(Literal::Number)
            .ok_or_else(|| ModelError::InvalidLiteral(value.to_string()))
    }

    /// Parses user input: booleans and numbers are recognised, everything
    /// else is kept as text. Blank input has no literal.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed {
            "true" => return Some(Literal::Bool(true)),
            "false" => return Some(Literal::Bool(false)),
            _ => {}
        }
        if let Ok(int) = trimmed.parse::<i64>() {
            return Some(Literal::Number(int.into()));
        }
        if let Some(number) = trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return Some(Literal::Number(number));
        }
        Some(Literal::Text(trimmed.to_string()))
    }

    /// Numeric view of the literal. Text that spells a number counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Number(number) => number.as_f64(),
            Literal::Text(text) => text.trim().parse().ok(),
            Literal::Bool(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == Some(0.0)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Number(value.into())
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Number(value.into())
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Number(value) => write!(f, "{value}"),
            Literal::Text(value) => write!(f, "{value:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_input() {
        assert_eq!(Literal::parse("100"), Some(Literal::from(100)));
        assert_eq!(Literal::parse(" 2.5 ").and_then(|l| l.as_f64()), Some(2.5));
        assert_eq!(Literal::parse("true"), Some(Literal::Bool(true)));
        assert_eq!(Literal::parse("abc"), Some(Literal::from("abc")));
        assert_eq!(Literal::parse("   "), None);
    }

    #[test]
    fn number_spelling_survives_json() {
        let int: Literal = serde_json::from_str("100").unwrap();
        let float: Literal = serde_json::from_str("1.5").unwrap();
        assert_eq!(serde_json::to_string(&int).unwrap(), "100");
        assert_eq!(serde_json::to_string(&float).unwrap(), "1.5");
    }

    #[test]
    fn non_finite_numbers_rejected() {
        assert!(Literal::number(f64::NAN).is_err());
        assert!(Literal::number(0.0).unwrap().is_zero());
    }
}
