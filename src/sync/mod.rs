//! Sync engine - pulls remote records into the store.
//!
//! A full job runs: toll groups -> daily tolls -> invoice tolls -> documents
//! (one step per configured type). Each step runs in its own store scope; an
//! error aborts the remaining steps, and the next run resumes from what was
//! committed.

pub mod documents;
pub mod groups;
pub mod tolls;

pub use documents::DocumentSyncReport;
pub use groups::GroupSyncReport;
pub use tolls::TollSyncReport;

use crate::api::RemoteApi;
use crate::clock::Clock;
use crate::config::{Config, DocumentSelector};
use crate::models::TollGenre;
use crate::storage::{Database, SyncStore};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Steps and persistence mode of a full job.
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub documents: Vec<DocumentSelector>,
    /// Commit each step; off for dry runs.
    pub save_changes: bool,
}

impl JobPlan {
    pub fn from_config(config: &Config) -> Self {
        Self {
            documents: config.documents.clone(),
            save_changes: config.save_changes,
        }
    }
}

/// Reports of every step of a finished job.
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    pub groups: GroupSyncReport,
    pub tolls: Vec<(TollGenre, TollSyncReport)>,
    pub documents: Vec<(DocumentSelector, DocumentSyncReport)>,
}

/// Drives remote operations into a store.
pub struct SyncEngine<'a, R: RemoteApi + ?Sized> {
    api: &'a mut R,
    clock: Arc<dyn Clock>,
    resource_dir: PathBuf,
    /// Recording timestamp for every record written in this run.
    job_begin: NaiveDateTime,
}

impl<'a, R: RemoteApi + ?Sized> SyncEngine<'a, R> {
    /// Create an engine, capturing the run start time from `clock`.
    pub fn new(api: &'a mut R, clock: Arc<dyn Clock>, resource_dir: impl Into<PathBuf>) -> Self {
        let job_begin = clock.now().naive_local();
        Self {
            api,
            clock,
            resource_dir: resource_dir.into(),
            job_begin,
        }
    }

    pub fn job_begin(&self) -> NaiveDateTime {
        self.job_begin
    }

    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    /// Run every step, each in its own scope.
    pub fn run_job(&mut self, db: &mut Database, plan: &JobPlan) -> Result<JobReport> {
        info!(job_begin = %self.job_begin, save_changes = plan.save_changes, "sync job started");
        let mut report = JobReport::default();

        report.groups = in_scope(db, plan.save_changes, |store| self.sync_toll_groups(store))
            .context("Toll group sync failed")?;

        for genre in TollGenre::ALL {
            let tolls = in_scope(db, plan.save_changes, |store| self.sync_tolls(store, genre))
                .with_context(|| format!("Toll sync failed for genre {}", genre))?;
            report.tolls.push((genre, tolls));
        }

        for selector in &plan.documents {
            let documents = in_scope(db, plan.save_changes, |store| {
                self.sync_documents(
                    store,
                    &selector.document_type,
                    selector.category.as_deref(),
                )
            })
            .with_context(|| format!("Document sync failed for type {}", selector.document_type))?;
            report.documents.push((selector.clone(), documents));
        }

        info!("sync job finished");
        Ok(report)
    }
}

/// Run one step in a fresh scope, finishing it only when the step succeeds.
pub fn in_scope<T>(
    db: &mut Database,
    save_changes: bool,
    step: impl FnOnce(&dyn SyncStore) -> Result<T>,
) -> Result<T> {
    let scope = db.scope(save_changes)?;
    let out = step(&scope)?;
    scope.finish()?;
    Ok(out)
}
