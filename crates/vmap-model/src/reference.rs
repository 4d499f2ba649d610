//! Reference data supplied by the server: forms, their fields and the
//! enumerated values of choice fields.
//!
//! These types are never fabricated by the editor. They arrive from a
//! vocabulary lookup or inside a stored mapping, and are plain data on the
//! wire as well as in memory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, versioned form definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<NaiveDate>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            publish_date: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_publish_date(mut self, date: NaiveDate) -> Self {
        self.publish_date = Some(date);
        self
    }

    /// Schemata are identified by name; the publish date only versions them.
    pub fn same_as(&self, other: &Schema) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.publish_date {
            Some(date) => write!(f, "{} ({date})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Data type of an attribute.
///
/// The server's type vocabulary is open ended; unknown spellings are kept
/// verbatim so a stored mapping survives a load/save cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeType {
    Text,
    String,
    Number,
    Date,
    Datetime,
    Choice,
    Blob,
    Section,
    Other(String),
}

impl AttributeType {
    pub fn as_str(&self) -> &str {
        match self {
            AttributeType::Text => "text",
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Date => "date",
            AttributeType::Datetime => "datetime",
            AttributeType::Choice => "choice",
            AttributeType::Blob => "blob",
            AttributeType::Section => "section",
            AttributeType::Other(other) => other,
        }
    }
}

impl From<String> for AttributeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => AttributeType::Text,
            "string" => AttributeType::String,
            "number" => AttributeType::Number,
            "date" => AttributeType::Date,
            "datetime" => AttributeType::Datetime,
            "choice" => AttributeType::Choice,
            "blob" => AttributeType::Blob,
            "section" => AttributeType::Section,
            _ => AttributeType::Other(value),
        }
    }
}

impl From<AttributeType> for String {
    fn from(value: AttributeType) -> Self {
        match value {
            AttributeType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field within a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AttributeType>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            name: name.into(),
            title: None,
            kind: Some(kind),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn has_choices(&self) -> bool {
        self.kind == Some(AttributeType::Choice)
    }
}

/// An enumerated value of a choice attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Choice {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: Some(title.into()),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.title.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_type_keeps_unknown_spelling() {
        let kind: AttributeType = serde_json::from_str("\"decimal\"").unwrap();
        assert_eq!(kind, AttributeType::Other("decimal".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"decimal\"");
    }

    #[test]
    fn has_choices_only_for_choice_type() {
        assert!(Attribute::new("sex", AttributeType::Choice).has_choices());
        assert!(!Attribute::new("age", AttributeType::Number).has_choices());
        let untyped = Attribute {
            name: "x".to_string(),
            title: None,
            kind: None,
        };
        assert!(!untyped.has_choices());
    }

    #[test]
    fn schema_publish_date_wire_key() {
        let schema = Schema::new("demographics")
            .with_publish_date(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "demographics", "publish_date": "2015-01-01"})
        );
    }

    #[test]
    fn choice_display() {
        assert_eq!(Choice::new("1", "Yes").to_string(), "1 - Yes");
    }
}
