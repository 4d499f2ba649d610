//! Typeahead queries for the schema, attribute and choice selectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vmap_model::{Attribute, Choice, Schema, Variable};

/// Which option list a lookup asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    AvailableSchemata,
    AvailableAttributes,
    AvailableChoices,
}

impl Vocabulary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vocabulary::AvailableSchemata => "available_schemata",
            Vocabulary::AvailableAttributes => "available_attributes",
            Vocabulary::AvailableChoices => "available_choices",
        }
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vocabulary {
    type Err = String;

    /// Accepts the wire spelling or the short forms `schemata`,
    /// `attributes` and `choices`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.trim_start_matches("available_") {
            "schemata" | "schemas" => Ok(Vocabulary::AvailableSchemata),
            "attributes" => Ok(Vocabulary::AvailableAttributes),
            "choices" => Ok(Vocabulary::AvailableChoices),
            _ => Err(format!("Unknown vocabulary: {s}")),
        }
    }
}

/// Query string of a vocabulary lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupQuery {
    pub vocabulary: Vocabulary,
    pub term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_target: Option<bool>,
}

impl LookupQuery {
    /// Builds the query for `vocabulary` from the variable's current
    /// selection. Attributes need a schema; choices need both a schema and
    /// an attribute.
    pub fn for_variable(
        variable: &Variable,
        vocabulary: Vocabulary,
        term: &str,
        is_target: bool,
    ) -> Option<Self> {
        let mut query = Self {
            vocabulary,
            term: term.trim().to_string(),
            schema: None,
            attribute: None,
            is_target: None,
        };
        match vocabulary {
            Vocabulary::AvailableSchemata => query.is_target = Some(is_target),
            Vocabulary::AvailableAttributes => {
                query.schema = Some(variable.schema()?.name.clone());
            }
            Vocabulary::AvailableChoices => {
                query.schema = Some(variable.schema()?.name.clone());
                query.attribute = Some(variable.attribute()?.name.clone());
            }
        }
        Some(query)
    }
}

/// Body of a vocabulary lookup response. Only the list matching the
/// requested vocabulary is present; an invalid query yields `{}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LookupResults {
    #[serde(default)]
    pub schemata: Vec<Schema>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl LookupResults {
    pub fn len(&self) -> usize {
        self.schemata.len() + self.attributes.len() + self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
