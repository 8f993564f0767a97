//! Remote client for the Feenox billing API.
//!
//! `RemoteApi` is the seam the sync engine talks to; `FeenoxClient` is the
//! HTTP implementation that keeps its own `SessionManager`.

pub mod client;
pub mod types;
pub mod window;

pub use client::FeenoxClient;
pub use types::{DocumentItem, TollGroupItem, TollItem};
pub use window::{DateWindow, DocumentDateAxis, TollDateAxis, MAX_LOOKBACK_DAYS, MAX_WINDOW_DAYS};

use crate::models::TollGenre;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Typed operations against the remote API.
///
/// Each operation validates its arguments, then makes sure the session is
/// fresh, then performs exactly one request. Non-success responses are errors.
pub trait RemoteApi {
    /// List all toll groups.
    fn list_toll_groups(&mut self) -> Result<Vec<TollGroupItem>>;

    /// Search tolls of one genre on one date axis, optionally restricted to groups.
    fn search_tolls(
        &mut self,
        genre: TollGenre,
        groups: &[String],
        axis: &TollDateAxis,
    ) -> Result<Vec<TollItem>>;

    /// Search documents by type, optional category and optional date axis.
    fn search_documents(
        &mut self,
        document_type: &str,
        category: Option<&str>,
        axis: Option<&DocumentDateAxis>,
    ) -> Result<Vec<DocumentItem>>;

    /// Download a document into `destination`, returning the written file.
    fn download_document(&mut self, document_id: &str, destination: &Path) -> Result<PathBuf>;
}
