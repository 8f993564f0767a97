//! Feenox Sync Library
//!
//! Periodically pulls toll and invoice document records from the Feenox
//! billing API into a local SQLite store.
//! Provides the following capabilities:
//! - Acquire, cache and refresh the API session token
//! - Typed remote operations (toll groups, toll search, document search, download)
//! - Windowed, idempotent toll ingestion with a derived deduplication key
//! - Existence-checked document ingestion followed by download
//!
//! Pipeline: Groups -> Daily tolls -> Invoice tolls -> Documents (per type)

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod sync;

// Re-export main types
pub use api::{DateWindow, DocumentDateAxis, FeenoxClient, RemoteApi, TollDateAxis};
pub use auth::{Session, SessionManager};
pub use clock::{Clock, SystemClock};
pub use config::{Config, Credentials};
pub use error::ApiError;
pub use models::{DocumentRecord, TollGenre, TollGroup, TollRecord};
pub use storage::{Database, StoreScope, SyncStore};
pub use sync::{JobPlan, SyncEngine};
