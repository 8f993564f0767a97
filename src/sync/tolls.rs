//! Windowed toll sync.

use super::SyncEngine;
use crate::api::{DateWindow, RemoteApi, TollDateAxis, MAX_WINDOW_DAYS};
use crate::models::{TollGenre, TollRecord};
use crate::storage::SyncStore;
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct TollSyncReport {
    /// Search windows requested.
    pub windows: usize,
    pub fetched: usize,
    pub inserted: usize,
    pub already_saved: usize,
    pub duplicates: usize,
    /// Inserts that did not affect exactly one row.
    pub failed: usize,
}

/// Where the next toll sync starts for a stored high-water mark.
///
/// Absent or future marks start at the lookback horizon; older marks are
/// clamped to it.
pub fn resume_date(last_exit: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    let horizon = DateWindow::earliest_start(today);
    match last_exit {
        Some(last) if last <= today => {
            if last < horizon {
                warn!(%last, %horizon, "last exit date is beyond the lookback horizon, clamping");
                horizon
            } else {
                last
            }
        }
        _ => horizon,
    }
}

impl<R: RemoteApi + ?Sized> SyncEngine<'_, R> {
    /// Pull tolls of one genre from the last stored exit date up to today.
    pub fn sync_tolls(&mut self, store: &dyn SyncStore, genre: TollGenre) -> Result<TollSyncReport> {
        let today = self.clock.today();
        let last_exit = store.max_exit_date(genre)?;
        let mut start = resume_date(last_exit.map(|ts| ts.date()), today);
        info!(genre = %genre, %start, %today, "syncing {} tolls", genre.label());

        let mut report = TollSyncReport::default();
        loop {
            // A run can cross midnight
            let today = self.clock.today();
            let horizon = DateWindow::earliest_start(today);
            if start < horizon {
                warn!(%start, %horizon, "window start fell behind the lookback horizon, clamping");
                start = horizon;
            }
            if start >= today {
                break;
            }

            let end = (start + Duration::days(MAX_WINDOW_DAYS)).min(today);
            let axis = TollDateAxis::Exit(DateWindow::new(start, end));
            let items = self.api.search_tolls(genre, &[], &axis)?;
            report.windows += 1;
            report.fetched += items.len();
            debug!(genre = %genre, from = %start, to = %end, count = items.len(), "toll window fetched");

            for item in &items {
                let record = TollRecord::from_item(item, genre, self.job_begin)?;
                self.store_toll(store, &record, &mut report)?;
            }

            start = end;
        }

        info!(
            genre = %genre,
            windows = report.windows,
            fetched = report.fetched,
            inserted = report.inserted,
            already_saved = report.already_saved,
            duplicates = report.duplicates,
            failed = report.failed,
            "toll sync finished"
        );
        Ok(report)
    }

    fn store_toll(
        &self,
        store: &dyn SyncStore,
        record: &TollRecord,
        report: &mut TollSyncReport,
    ) -> Result<()> {
        let check = store.duplicate_check(record.id(), record.global_identifier())?;
        if check.already_saved() {
            warn!(id = record.id(), "toll already saved");
            report.already_saved += 1;
        } else if check.is_duplicate() {
            error!(
                id = record.id(),
                global_identifier = record.global_identifier(),
                "duplicate toll"
            );
            report.duplicates += 1;
        } else if store.insert_toll(record)? == 1 {
            report.inserted += 1;
        } else {
            error!(critical = true, id = record.id(), "toll was not saved");
            report.failed += 1;
        }
        Ok(())
    }
}
