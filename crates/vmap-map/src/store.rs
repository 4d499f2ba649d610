//! Persistence seam between the editor and the mapping server.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vmap_model::{MappingData, MappingId, MappingStatus};

/// How a store failure should be reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The server rejected the request; the message is shown as is.
    Validation(String),
    /// Connection or server failure.
    Transport,
}

/// Implemented by store error types so the editor can classify failures
/// without knowing the transport.
pub trait StoreFailure: std::error::Error + Send + Sync + 'static {
    fn failure_kind(&self) -> FailureKind;
}

/// What the server answered to a save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveResponse {
    /// `{"__next__": "/imports"}`: navigate there.
    Redirect(String),
    /// The canonical stored record.
    Record(Box<MappingData>),
    /// `{"id": 7}`: the id assigned to a new mapping.
    Created(MappingId),
    /// Any other success body.
    Acknowledged,
}

impl SaveResponse {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(map) = &value else {
            return Ok(Self::Acknowledged);
        };
        if let Some(Value::String(next)) = map.get("__next__") {
            return Ok(Self::Redirect(next.clone()));
        }
        if map.contains_key("groups") || map.contains_key("target") {
            return Ok(Self::Record(Box::new(serde_json::from_value(value)?)));
        }
        if let Some(id) = map.get("id").and_then(Value::as_i64) {
            return Ok(Self::Created(MappingId::new(id)));
        }
        Ok(Self::Acknowledged)
    }
}

/// Review state of a stored mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub status: MappingStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Remote storage for mappings.
pub trait MappingStore {
    type Error: StoreFailure;

    fn fetch_mapping(
        &self,
        id: MappingId,
    ) -> impl Future<Output = Result<MappingData, Self::Error>> + Send;

    fn create_mapping(
        &self,
        data: &MappingData,
    ) -> impl Future<Output = Result<SaveResponse, Self::Error>> + Send;

    fn update_mapping(
        &self,
        id: MappingId,
        data: &MappingData,
    ) -> impl Future<Output = Result<SaveResponse, Self::Error>> + Send;

    fn fetch_review(
        &self,
        id: MappingId,
    ) -> impl Future<Output = Result<ReviewRecord, Self::Error>> + Send;

    fn put_status(
        &self,
        id: MappingId,
        status: MappingStatus,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn put_notes(
        &self,
        id: MappingId,
        notes: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_response_shapes() {
        assert_eq!(
            SaveResponse::from_value(json!({"__next__": "/imports"})).unwrap(),
            SaveResponse::Redirect("/imports".to_string())
        );
        assert_eq!(
            SaveResponse::from_value(json!({"id": 7})).unwrap(),
            SaveResponse::Created(MappingId::new(7))
        );
        assert_eq!(
            SaveResponse::from_value(json!({})).unwrap(),
            SaveResponse::Acknowledged
        );
        assert!(matches!(
            SaveResponse::from_value(json!({"id": 7, "groups": []})).unwrap(),
            SaveResponse::Record(_)
        ));
    }

    #[test]
    fn review_record_allows_missing_notes() {
        let record: ReviewRecord = serde_json::from_value(json!({"status": "approved"})).unwrap();
        assert_eq!(record.status, MappingStatus::Approved);
        assert!(record.notes.is_none());
    }
}
