//! Async client for the mapping server's JSON and event-stream endpoints.

use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};
use vmap_map::{
    ApplyKind, JobEvent, LookupQuery, LookupResults, MappingStore, ReviewRecord, SaveResponse,
};
use vmap_model::{DirectMappingData, MappingData, MappingId, MappingStatus};

use crate::config::ClientSettings;
use crate::error::{ClientError, Result, rejection_message};
use crate::sse::{SseDecoder, SseEvent};
use crate::types::{CreatedResponse, DeleteRequest, MappingList};

const SAVE_PATH: &str = "/imports/mappings/imputation";
const DIRECT_SAVE_PATH: &str = "/imports/mappings/direct/map";
const STATUS_PATH: &str = "/imports/mapping/status";
const NOTES_PATH: &str = "/imports/mapping/notes";
const SCHEMAS_PATH: &str = "/imports/schemas";
const LIST_PATH: &str = "/imports/mappings/view";
const DELETE_PATH: &str = "/imports/mappings/delete";
const JOBS_PATH: &str = "/imports/api/jobs";
const PROGRESS_PATH: &str = "/imports/api/progress";

/// Longest server body kept in a [`ClientError::Server`].
const MAX_ERROR_BODY: usize = 512;

/// Client for one mapping server and session.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl ApiClient {
    /// Builds a client that sends the session headers on every request.
    pub fn new(mut settings: ClientSettings) -> Result<Self> {
        settings.normalize();
        let headers = default_headers(&settings)?;
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Fetches a stored mapping in editor shape.
    pub async fn get_mapping(&self, id: MappingId) -> Result<MappingData> {
        let path = format!("/imports/api/mappings/{id}");
        let response = self.send(self.request(Method::GET, &path)).await?;
        read_json(response).await
    }

    /// Creates (`id` unset) or updates a mapping.
    pub async fn save_mapping(&self, data: &MappingData) -> Result<SaveResponse> {
        let method = if data.id.is_some() {
            Method::PATCH
        } else {
            Method::POST
        };
        info!(id = ?data.id, %method, "saving mapping");
        let response = self
            .send(self.request(method, SAVE_PATH).json(data))
            .await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(SaveResponse::Acknowledged);
        }
        let value: Value = serde_json::from_str(&body)?;
        Ok(SaveResponse::from_value(value)?)
    }

    /// Creates a direct mapping and returns its id.
    pub async fn save_direct_mapping(&self, data: &DirectMappingData) -> Result<MappingId> {
        info!(
            source = %data.source_variable,
            target = %data.target_variable,
            "saving direct mapping"
        );
        let response = self
            .send(self.request(Method::POST, DIRECT_SAVE_PATH).json(data))
            .await?;
        let created: CreatedResponse = read_json(response).await?;
        Ok(created.id)
    }

    /// Current review status and notes.
    pub async fn get_status(&self, id: MappingId) -> Result<ReviewRecord> {
        let request = self.request(Method::GET, STATUS_PATH).query(&[("id", id)]);
        read_json(self.send(request).await?).await
    }

    pub async fn put_status(&self, id: MappingId, status: MappingStatus) -> Result<()> {
        let request = self
            .request(Method::PUT, STATUS_PATH)
            .query(&[("id", id)])
            .json(&json!({ "status": status }));
        self.send(request).await?;
        Ok(())
    }

    pub async fn put_notes(&self, id: MappingId, notes: &str) -> Result<()> {
        let request = self
            .request(Method::PUT, NOTES_PATH)
            .query(&[("id", id)])
            .json(&json!({ "notes": notes }));
        self.send(request).await?;
        Ok(())
    }

    /// Typeahead options for a schema, attribute or choice selector.
    pub async fn lookup(&self, query: &LookupQuery) -> Result<LookupResults> {
        let request = self.request(Method::GET, SCHEMAS_PATH).query(query);
        read_json(self.send(request).await?).await
    }

    /// The mapping overview.
    pub async fn list_mappings(&self) -> Result<MappingList> {
        read_json(self.send(self.request(Method::GET, LIST_PATH)).await?).await
    }

    /// Deletes all `ids` or, when any is unknown, none of them.
    pub async fn delete_mappings(&self, ids: &[MappingId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        info!(count = ids.len(), "deleting mappings");
        let request = self
            .request(Method::DELETE, DELETE_PATH)
            .json(&DeleteRequest::new(ids));
        self.send(request).await?;
        Ok(())
    }

    /// Asks the server to apply every approved mapping of `kind`.
    pub async fn start_apply_job(&self, kind: ApplyKind) -> Result<()> {
        info!(%kind, "starting apply job");
        let path = format!("{JOBS_PATH}/{kind}");
        self.send(self.request(Method::POST, &path)).await?;
        Ok(())
    }

    /// Subscribes to the progress channel of `kind`'s apply job.
    ///
    /// Events whose data is neither a progress update nor a job message are
    /// skipped. A failed connect yields one error; a connection that drops
    /// later simply ends the stream. Dropping the stream unsubscribes.
    pub fn progress_events(
        &self,
        kind: ApplyKind,
    ) -> impl Stream<Item = Result<JobEvent>> + Send + 'static {
        let request = self
            .http
            .get(self.settings.url(&format!("{PROGRESS_PATH}/{kind}")))
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"));

        async_stream::stream! {
            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };
            let response = match check_status(response).await {
                Ok(r) => r,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut decoder = SseDecoder::new();
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        debug!(error = %e, "progress channel closed");
                        break;
                    }
                };
                for event in decoder.push(&chunk) {
                    if let Some(job_event) = job_event(&event) {
                        yield Ok(job_event);
                    }
                }
            }
            if let Some(job_event) = decoder.finish().as_ref().and_then(job_event) {
                yield Ok(job_event);
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.settings.url(path))
            .timeout(self.settings.timeout())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        debug!(url = %response.url(), status = %response.status(), "response");
        check_status(response).await
    }
}

impl MappingStore for ApiClient {
    type Error = ClientError;

    async fn fetch_mapping(&self, id: MappingId) -> Result<MappingData> {
        self.get_mapping(id).await
    }

    async fn create_mapping(&self, data: &MappingData) -> Result<SaveResponse> {
        self.save_mapping(data).await
    }

    async fn update_mapping(&self, id: MappingId, data: &MappingData) -> Result<SaveResponse> {
        if data.id == Some(id) {
            return self.save_mapping(data).await;
        }
        let mut data = data.clone();
        data.id = Some(id);
        self.save_mapping(&data).await
    }

    async fn fetch_review(&self, id: MappingId) -> Result<ReviewRecord> {
        self.get_status(id).await
    }

    async fn put_status(&self, id: MappingId, status: MappingStatus) -> Result<()> {
        ApiClient::put_status(self, id, status).await
    }

    async fn put_notes(&self, id: MappingId, notes: &str) -> Result<()> {
        ApiClient::put_notes(self, id, notes).await
    }
}

fn default_headers(settings: &ClientSettings) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(USER_AGENT, header_value("User-Agent", &settings.user_agent)?);
    if let Some(token) = &settings.csrf_token {
        headers.insert(
            HeaderName::from_static("x-csrf-token"),
            header_value("X-CSRF-Token", token)?,
        );
    }
    if let Some(cookie) = &settings.session_cookie {
        let mut value = header_value("Cookie", cookie)?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
    }
    Ok(headers)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value.trim()).map_err(|_| ClientError::InvalidHeader(name))
}

/// Maps non-success statuses onto [`ClientError`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::BAD_REQUEST => {
            let message = rejection_message(&body);
            if message.is_empty() {
                ClientError::Rejected("The server rejected the request.".to_string())
            } else {
                ClientError::Rejected(message)
            }
        }
        StatusCode::NOT_FOUND => ClientError::NotFound(url),
        _ => ClientError::Server {
            status: status.as_u16(),
            body: truncate(body),
        },
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

fn job_event(event: &SseEvent) -> Option<JobEvent> {
    match JobEvent::from_json(&event.data) {
        Ok(job_event) => Some(job_event),
        Err(e) => {
            debug!(event = %event.event, error = %e, "skipping unrecognized progress event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_session() {
        let settings = ClientSettings {
            csrf_token: Some("t0k3n".to_string()),
            session_cookie: Some("session=abc".to_string()),
            ..ClientSettings::default()
        };
        let headers = default_headers(&settings).unwrap();
        assert_eq!(headers["x-csrf-token"], "t0k3n");
        assert_eq!(headers["x-requested-with"], "XMLHttpRequest");
        assert!(headers[COOKIE].is_sensitive());
    }

    #[test]
    fn invalid_header_is_reported() {
        let settings = ClientSettings {
            csrf_token: Some("bad\ntoken".to_string()),
            ..ClientSettings::default()
        };
        assert!(matches!(
            default_headers(&settings),
            Err(ClientError::InvalidHeader("X-CSRF-Token"))
        ));
    }

    #[test]
    fn long_bodies_are_truncated() {
        assert_eq!(truncate("é".repeat(400)).len(), MAX_ERROR_BODY);
        assert_eq!(truncate("short".to_string()), "short");
    }
}
