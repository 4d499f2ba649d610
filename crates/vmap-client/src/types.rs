//! Response and request bodies of the mapping list endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use vmap_model::MappingId;

/// One row of the mapping overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRow {
    #[serde(rename = "mapped_id")]
    pub id: MappingId,
    pub target_form: String,
    pub target_variable: String,
    /// Source `[form, variable]` pairs of an imputation mapping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<(String, String)>,
    /// Source form of a direct mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_variable: Option<String>,
    #[serde(default)]
    pub study: String,
    #[serde(default)]
    pub date_mapped: Option<NaiveDate>,
    /// Review status name as stored by the server.
    pub status: String,
    #[serde(default, rename = "note")]
    pub notes: Option<String>,
}

impl MappingRow {
    /// `form.variable` pairs the mapping reads from.
    pub fn sources(&self) -> Vec<String> {
        if !self.forms.is_empty() {
            return self
                .forms
                .iter()
                .map(|(form, variable)| format!("{form}.{variable}"))
                .collect();
        }
        match (&self.study_form, &self.study_variable) {
            (Some(form), Some(variable)) => vec![format!("{form}.{variable}")],
            _ => Vec::new(),
        }
    }

    pub fn target(&self) -> String {
        format!("{}.{}", self.target_form, self.target_variable)
    }
}

/// Body of the mapping overview.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MappingList {
    #[serde(default)]
    pub rows: Vec<MappingRow>,
    /// Present when the session may delete mappings.
    #[serde(default, rename = "$deleteUrl")]
    pub delete_url: Option<String>,
}

impl MappingList {
    pub fn can_delete(&self) -> bool {
        self.delete_url.is_some()
    }
}

/// Body returned when the server creates a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct CreatedResponse {
    pub id: MappingId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteEntry {
    pub mapped_id: MappingId,
    pub delete_row: bool,
}

/// Deletion request. The server deletes all listed mappings or none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DeleteRequest {
    pub mapped_delete: Vec<DeleteEntry>,
}

impl DeleteRequest {
    pub fn new(ids: &[MappingId]) -> Self {
        Self {
            mapped_delete: ids
                .iter()
                .map(|&mapped_id| DeleteEntry {
                    mapped_id,
                    delete_row: true,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn imputation_row() {
        let list: MappingList = serde_json::from_value(json!({
            "$deleteUrl": "/imports/mappings/view",
            "rows": [{
                "target_form": "vitals",
                "target_variable": "weight_kg",
                "forms": [["site_vitals", "weight_lb"]],
                "study": "Cohort A",
                "date_mapped": "2016-03-01",
                "mapped_id": 42,
                "status": "review",
                "note": null
            }]
        }))
        .unwrap();
        assert!(list.can_delete());
        let row = &list.rows[0];
        assert_eq!(row.id, MappingId::new(42));
        assert_eq!(row.sources(), vec!["site_vitals.weight_lb"]);
        assert_eq!(row.target(), "vitals.weight_kg");
        assert_eq!(row.date_mapped, NaiveDate::from_ymd_opt(2016, 3, 1));
    }

    #[test]
    fn direct_row_without_delete_permission() {
        let list: MappingList = serde_json::from_value(json!({
            "rows": [{
                "target_form": "vitals",
                "target_variable": "height",
                "study_form": "site_vitals",
                "study_variable": "height_cm",
                "mapped_id": 3,
                "status": "approved",
                "note": "ok"
            }]
        }))
        .unwrap();
        assert!(!list.can_delete());
        assert_eq!(list.rows[0].sources(), vec!["site_vitals.height_cm"]);
        assert_eq!(list.rows[0].notes.as_deref(), Some("ok"));
    }

    #[test]
    fn delete_request_shape() {
        let request = DeleteRequest::new(&[MappingId::new(4), MappingId::new(9)]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"mapped_delete": [
                {"mappedId": 4, "deleteRow": true},
                {"mappedId": 9, "deleteRow": true}
            ]})
        );
    }
}
