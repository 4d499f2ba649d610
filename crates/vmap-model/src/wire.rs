//! Wire representation of mapping rules.
//!
//! These are the plain JSON shapes exchanged with the server. They carry no
//! node identities and no lookup caches; the in-memory rule tree converts to
//! and from them through explicit `to_wire`/`from_wire` functions, so nothing
//! internal can leak into a payload by accident.
//!
//! Top-level optional fields are omitted when unset, while operator/value
//! pairs and variable references are always present (as `null` when empty),
//! matching what the server stores.

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::enums::{
    ArithmeticOperator, ConditionOperator, LogicalOperator, MappingStatus,
    deserialize_logical_clamped,
};
use crate::ids::MappingId;
use crate::literal::Literal;
use crate::reference::{Attribute, Choice, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MappingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MappingStatus>,
    #[serde(default)]
    pub target: VariableData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_choice: Option<TargetChoiceData>,
    #[serde(default, deserialize_with = "deserialize_logical_clamped")]
    pub condition: LogicalOperator,
    #[serde(default)]
    pub groups: Vec<GroupData>,
}

impl MappingData {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The `targetChoice` slot. Stored mappings without a choice carry `{}`,
/// which is kept apart from a missing key so it is written back as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetChoiceData {
    Empty,
    Choice(Choice),
}

impl TargetChoiceData {
    pub fn choice(&self) -> Option<&Choice> {
        match self {
            TargetChoiceData::Empty => None,
            TargetChoiceData::Choice(choice) => Some(choice),
        }
    }
}

impl Serialize for TargetChoiceData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TargetChoiceData::Empty => serializer.serialize_map(Some(0))?.end(),
            TargetChoiceData::Choice(choice) => choice.serialize(serializer),
        }
    }
}

/// Nameless objects count as empty.
impl<'de> Deserialize<'de> for TargetChoiceData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let choice = Choice::deserialize(deserializer)?;
        if choice.name.is_empty() {
            Ok(TargetChoiceData::Empty)
        } else {
            Ok(TargetChoiceData::Choice(choice))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableData {
    #[serde(default)]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub attribute: Option<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    #[serde(default)]
    pub conversions: Vec<ConversionData>,
    #[serde(default)]
    pub logic: Option<ConditionListData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionData {
    #[serde(default)]
    pub operator: Option<ArithmeticOperator>,
    #[serde(default)]
    pub value: OperandData,
}

/// A conversion operand: an object is a variable reference, anything else
/// (including `null`) is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperandData {
    Variable(VariableData),
    Literal(Option<Literal>),
}

impl Default for OperandData {
    fn default() -> Self {
        OperandData::Literal(None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionListData {
    #[serde(default, deserialize_with = "deserialize_logical_clamped")]
    pub operator: LogicalOperator,
    #[serde(default, alias = "imputations")]
    pub conditions: Vec<ConditionData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionData {
    #[serde(default)]
    pub operator: Option<ConditionOperator>,
    #[serde(default)]
    pub value: Option<Literal>,
}

/// Body of a direct mapping: one source variable copied onto one target
/// variable, with the target choice each source choice becomes.
///
/// Field names are snake case, unlike [`MappingData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMappingData {
    pub source_schema: String,
    pub source_schema_publish_date: NaiveDate,
    pub source_variable: String,
    pub target_schema: String,
    pub target_schema_publish_date: NaiveDate,
    pub target_variable: String,
    /// `null` for variables without choices.
    #[serde(default)]
    pub choices_mapping: Option<Vec<ChoiceMappingData>>,
}

impl DirectMappingData {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Names of the required text fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("source_schema", &self.source_schema),
            ("source_variable", &self.source_variable),
            ("target_schema", &self.target_schema),
            ("target_variable", &self.target_variable),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Target choice a source choice is mapped to. Unmapped choices, and
    /// every value of a mapping without choices, have none.
    pub fn translate(&self, source_choice: &str) -> Option<&str> {
        self.choices_mapping
            .iter()
            .flatten()
            .find(|entry| entry.sources().any(|source| source == source_choice))
            .map(|entry| entry.name.as_str())
    }
}

/// One target choice and the source choices mapped onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMappingData {
    /// Comma-separated source choice names.
    pub mapped: String,
    /// Target choice name.
    pub name: String,
}

impl ChoiceMappingData {
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.mapped
            .split(',')
            .map(str::trim)
            .filter(|source| !source.is_empty())
    }
}
