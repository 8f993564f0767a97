//! Toll group sync.

use super::SyncEngine;
use crate::api::RemoteApi;
use crate::models::TollGroup;
use crate::storage::SyncStore;
use anyhow::Result;
use tracing::{error, info};

#[derive(Debug, Clone, Default)]
pub struct GroupSyncReport {
    pub fetched: usize,
    /// Codes added by this run.
    pub inserted: Vec<String>,
    /// Codes already stored before this run.
    pub stored: usize,
}

impl<R: RemoteApi + ?Sized> SyncEngine<'_, R> {
    /// Add remote groups that are not stored yet. Existing groups are left alone.
    pub fn sync_toll_groups(&mut self, store: &dyn SyncStore) -> Result<GroupSyncReport> {
        let remote: Vec<TollGroup> = self
            .api
            .list_toll_groups()?
            .iter()
            .map(TollGroup::from)
            .collect();
        let stored = store.toll_group_codes()?;

        let mut report = GroupSyncReport {
            fetched: remote.len(),
            stored: stored.len(),
            ..Default::default()
        };

        for group in remote.iter().filter(|g| !stored.contains(&g.code)) {
            if report.inserted.contains(&group.code) {
                continue;
            }
            if store.insert_toll_group(group)? == 1 {
                report.inserted.push(group.code.clone());
            } else {
                error!(critical = true, code = %group.code, "toll group was not saved");
            }
        }

        if report.inserted.is_empty() {
            info!(stored = report.stored, "no new toll groups");
        } else {
            info!(codes = ?report.inserted, "new toll groups saved");
        }
        Ok(report)
    }
}
