#![deny(unsafe_code)]

//! Editing, evaluation and apply-job tracking for variable mappings.
//!
//! - [`MappingEditor`]: structural edits with change notifications, lookup
//!   plumbing and persistence through a [`MappingStore`].
//! - [`evaluate`]: the group fold and gating rules, run locally.
//! - [`progress`]: counters and messages of the apply job.

pub mod change;
pub mod editor;
pub mod error;
pub mod evaluate;
pub mod lookup;
pub mod progress;
pub mod store;

pub use change::{ChangeNotifier, Listener, ModelChange};
pub use editor::{Feedback, FeedbackLevel, MappingEditor};
pub use error::EditorError;
pub use evaluate::{Datum, Outcome, ValueResolver};
pub use lookup::{LookupQuery, LookupResults, Vocabulary};
pub use progress::{ApplyKind, JobEvent, JobMessage, Progress, ProgressTracker};
pub use store::{FailureKind, MappingStore, ReviewRecord, SaveResponse, StoreFailure};
