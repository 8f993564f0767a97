//! Persistence gateway.
//!
//! The sync engine only sees `SyncStore`; `StoreScope` implements it over one
//! SQLite transaction opened from a `Database`.

pub mod db;

pub use db::{Database, StoreScope};

use crate::models::{DocumentRecord, TollGenre, TollGroup, TollRecord};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// Independent match counts for a toll about to be inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateCheck {
    /// Rows with the same id.
    pub by_id: u64,
    /// Rows with the same global identifier.
    pub by_global_identifier: u64,
}

impl DuplicateCheck {
    pub fn already_saved(&self) -> bool {
        self.by_id > 0
    }

    /// Same global identifier stored under another id.
    pub fn is_duplicate(&self) -> bool {
        self.by_id == 0 && self.by_global_identifier > 0
    }
}

/// Store operations used by the sync engine.
///
/// Insert methods return the number of affected rows; anything other than 1
/// means the row did not take.
pub trait SyncStore {
    fn toll_group_codes(&self) -> Result<HashSet<String>>;

    fn insert_toll_group(&self, group: &TollGroup) -> Result<usize>;

    /// Highest stored exit date for a genre.
    fn max_exit_date(&self, genre: TollGenre) -> Result<Option<NaiveDateTime>>;

    fn duplicate_check(&self, id: &str, global_identifier: &str) -> Result<DuplicateCheck>;

    fn insert_toll(&self, toll: &TollRecord) -> Result<usize>;

    fn document_ids(&self) -> Result<HashSet<String>>;

    fn insert_document(&self, document: &DocumentRecord) -> Result<usize>;

    /// Whether writes will be kept. Off for dry runs.
    fn saves_changes(&self) -> bool {
        true
    }
}
