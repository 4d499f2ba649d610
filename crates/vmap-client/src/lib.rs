//! HTTP client for the variable mapping server.
//!
//! [`ApiClient`] speaks the server's JSON endpoints and implements
//! [`vmap_map::MappingStore`], so a [`vmap_map::MappingEditor`] can load and
//! save through it directly. Direct mappings are created with
//! [`ApiClient::save_direct_mapping`]. Each apply job's progress arrives as a
//! server-sent event stream, decoded by [`SseDecoder`].
//!
//! # Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use vmap_client::{ApiClient, ClientSettings};
//! use vmap_map::{ApplyKind, MappingEditor, ProgressTracker};
//! use vmap_model::MappingId;
//!
//! async fn run() -> vmap_client::Result<()> {
//!     let client = ApiClient::new(ClientSettings::new("http://localhost:6543"))?;
//!
//!     let mut editor = MappingEditor::new();
//!     if editor.load(&client, MappingId::new(42)).await.is_ok() {
//!         editor.add_group();
//!         let _ = editor.save(&client).await;
//!     }
//!
//!     client.start_apply_job(ApplyKind::Imputation).await?;
//!     let mut tracker = ProgressTracker::new();
//!     let mut events = std::pin::pin!(client.progress_events(ApplyKind::Imputation));
//!     while let Some(event) = events.next().await {
//!         tracker.apply(event?);
//!         if tracker.is_complete() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod types;

pub use client::ApiClient;
pub use config::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{ClientError, Result};
pub use sse::{SseDecoder, SseEvent};
pub use types::{MappingList, MappingRow};
