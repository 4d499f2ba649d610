use crate::reference::{Attribute, Choice, Schema};
use crate::wire::VariableData;

/// Option lists fetched for a variable's selectors.
///
/// UI-only state: it is refreshed by lookups and never written to the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupCache {
    pub schemata: Vec<Schema>,
    pub attributes: Vec<Attribute>,
    pub choices: Vec<Choice>,
}

/// A reference to one attribute of one schema.
///
/// The attribute always belongs to the current schema: replacing the schema
/// with a different one clears the attribute.
#[derive(Debug, Clone, Default)]
pub struct Variable {
    schema: Option<Schema>,
    attribute: Option<Attribute>,
    options: LookupCache,
}

impl Variable {
    pub fn new(schema: Schema, attribute: Attribute) -> Self {
        Self {
            schema: Some(schema),
            attribute: Some(attribute),
            options: LookupCache::default(),
        }
    }

    pub fn from_wire(data: &VariableData) -> Self {
        let mut variable = Self::default();
        variable.update(data);
        variable
    }

    pub fn to_wire(&self) -> VariableData {
        VariableData {
            schema: self.schema.clone(),
            attribute: self.attribute.clone(),
        }
    }

    /// Replaces schema and attribute from wire data. Calling it twice with
    /// the same data leaves the same variable.
    pub fn update(&mut self, data: &VariableData) {
        self.set_schema(data.schema.clone());
        self.attribute = data.attribute.clone();
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn attribute(&self) -> Option<&Attribute> {
        self.attribute.as_ref()
    }

    /// Sets the schema. Switching to a different schema (by name) drops the
    /// selected attribute together with the attribute and choice options
    /// fetched for the old schema.
    pub fn set_schema(&mut self, schema: Option<Schema>) {
        let changed = match (&self.schema, &schema) {
            (Some(old), Some(new)) => !old.same_as(new),
            (None, None) => false,
            _ => true,
        };
        self.schema = schema;
        if changed {
            self.attribute = None;
            self.options.attributes.clear();
            self.options.choices.clear();
        }
    }

    /// Sets the attribute. Choice options belong to the old attribute and
    /// are dropped when it changes.
    pub fn set_attribute(&mut self, attribute: Option<Attribute>) {
        let changed = self.attribute.as_ref().map(|a| &a.name) != attribute.as_ref().map(|a| &a.name);
        self.attribute = attribute;
        if changed {
            self.options.choices.clear();
        }
    }

    /// True when nothing has been selected yet.
    pub fn is_empty(&self) -> bool {
        self.schema.is_none() && self.attribute.is_none()
    }

    /// True when both schema and attribute are selected.
    pub fn is_complete(&self) -> bool {
        self.schema.is_some() && self.attribute.is_some()
    }

    pub fn has_choices(&self) -> bool {
        self.attribute.as_ref().is_some_and(Attribute::has_choices)
    }

    pub fn options(&self) -> &LookupCache {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut LookupCache {
        &mut self.options
    }

    /// `schema.attribute` label for display, `?` for missing parts.
    pub fn label(&self) -> String {
        format!(
            "{}.{}",
            self.schema.as_ref().map_or("?", |s| s.name.as_str()),
            self.attribute.as_ref().map_or("?", |a| a.name.as_str())
        )
    }
}

/// Variables compare by their selection only; cached options are ignored.
impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.attribute == other.attribute
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::AttributeType;

    fn demographics() -> Variable {
        Variable::new(
            Schema::new("demographics"),
            Attribute::new("gender", AttributeType::Choice),
        )
    }

    #[test]
    fn schema_change_clears_attribute() {
        let mut variable = demographics();
        variable.set_schema(Some(Schema::new("vitals")));
        assert_eq!(variable.schema().unwrap().name, "vitals");
        assert!(variable.attribute().is_none());
    }

    #[test]
    fn same_schema_keeps_attribute() {
        let mut variable = demographics();
        variable.set_schema(Some(Schema::new("demographics").with_title("Demographics")));
        assert_eq!(variable.attribute().unwrap().name, "gender");
    }

    #[test]
    fn clearing_schema_clears_attribute() {
        let mut variable = demographics();
        variable.set_schema(None);
        assert!(variable.is_empty());
    }

    #[test]
    fn update_is_idempotent() {
        let data = demographics().to_wire();
        let mut variable = Variable::default();
        variable.update(&data);
        let once = variable.clone();
        variable.update(&data);
        assert_eq!(variable, once);
        assert_eq!(variable.to_wire(), data);
    }

    #[test]
    fn options_never_reach_the_wire() {
        let mut variable = demographics();
        variable
            .options_mut()
            .schemata
            .push(Schema::new("vitals"));
        let json = serde_json::to_value(variable.to_wire()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "schema": {"name": "demographics"},
                "attribute": {"name": "gender", "type": "choice"}
            })
        );
    }
}
