//! Document sync.

use super::SyncEngine;
use crate::api::RemoteApi;
use crate::models::DocumentRecord;
use crate::storage::SyncStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default)]
pub struct DocumentSyncReport {
    pub fetched: usize,
    pub inserted: usize,
    /// Files written to the resource directory (none in a dry run).
    pub downloaded: Vec<PathBuf>,
    /// Inserts that did not take; their content was not downloaded.
    pub failed: usize,
}

impl<R: RemoteApi + ?Sized> SyncEngine<'_, R> {
    /// Save and download documents of one type that are not stored yet.
    pub fn sync_documents(
        &mut self,
        store: &dyn SyncStore,
        document_type: &str,
        category: Option<&str>,
    ) -> Result<DocumentSyncReport> {
        std::fs::create_dir_all(&self.resource_dir).with_context(|| {
            format!(
                "Cannot create resource directory: {}",
                self.resource_dir.display()
            )
        })?;

        let items = self.api.search_documents(document_type, category, None)?;
        let mut stored = store.document_ids()?;
        let mut report = DocumentSyncReport {
            fetched: items.len(),
            ..Default::default()
        };

        let download = store.saves_changes();
        for item in &items {
            if stored.contains(&item.document_id) {
                continue;
            }
            let record = DocumentRecord::from_item(item, self.job_begin)?;
            if store.insert_document(&record)? != 1 {
                error!(critical = true, id = %record.id, "document was not saved");
                report.failed += 1;
                continue;
            }
            stored.insert(record.id.clone());
            report.inserted += 1;

            if !download {
                debug!(id = %record.id, "dry run, download skipped");
                continue;
            }
            let path = self.api.download_document(&record.id, &self.resource_dir)?;
            info!(id = %record.id, path = %path.display(), "document downloaded");
            report.downloaded.push(path);
        }

        info!(
            document_type,
            category = category.unwrap_or("-"),
            fetched = report.fetched,
            inserted = report.inserted,
            failed = report.failed,
            "document sync finished"
        );
        Ok(report)
    }
}
