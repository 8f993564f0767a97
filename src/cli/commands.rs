//! Command implementations for the feenox CLI.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use colored::Colorize;
use feenox::api::DateWindow;
use feenox::sync::{
    in_scope, DocumentSyncReport, GroupSyncReport, JobPlan, JobReport, TollSyncReport,
};
use feenox::{
    Clock, Config, Database, FeenoxClient, RemoteApi, SyncEngine, SystemClock, TollDateAxis,
    TollGenre,
};
use std::sync::Arc;

/// Everything a command needs for one run.
struct Runtime {
    config: Config,
    clock: Arc<dyn Clock>,
    client: FeenoxClient,
}

impl Runtime {
    fn new(config: Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let client = FeenoxClient::from_config(&config, clock.clone())?;
        Ok(Self {
            config,
            clock,
            client,
        })
    }

    fn open_database(&self) -> Result<Database> {
        Database::open(&self.config.database_path)
    }

    fn engine(&mut self) -> SyncEngine<'_, FeenoxClient> {
        SyncEngine::new(
            &mut self.client,
            self.clock.clone(),
            self.config.resource_dir.clone(),
        )
    }
}

/// Run the full job.
pub fn sync(config: Config, dry_run: bool) -> Result<()> {
    println!("{}", "Syncing Feenox records...".cyan().bold());

    let mut plan = JobPlan::from_config(&config);
    if dry_run {
        plan.save_changes = false;
        println!(
            "  {}",
            "dry run: changes will be rolled back, documents are not downloaded".yellow()
        );
    }

    let mut runtime = Runtime::new(config)?;
    let mut db = runtime.open_database()?;
    let report = runtime.engine().run_job(&mut db, &plan)?;

    print_job_report(&report);
    println!("\n{}", "Sync complete!".green().bold());
    Ok(())
}

/// Toll group sync only.
pub fn groups(config: Config) -> Result<()> {
    let save_changes = config.save_changes;
    let mut runtime = Runtime::new(config)?;
    let mut db = runtime.open_database()?;
    let mut engine = runtime.engine();
    let report = in_scope(&mut db, save_changes, |store| engine.sync_toll_groups(store))?;
    print_groups(&report);
    Ok(())
}

/// One toll-genre sync.
pub fn tolls(config: Config, genre: TollGenre) -> Result<()> {
    let save_changes = config.save_changes;
    let mut runtime = Runtime::new(config)?;
    let mut db = runtime.open_database()?;
    let mut engine = runtime.engine();
    let report = in_scope(&mut db, save_changes, |store| engine.sync_tolls(store, genre))?;
    print_tolls(genre, &report);
    Ok(())
}

/// One document-type sync.
pub fn documents(config: Config, document_type: &str, category: Option<&str>) -> Result<()> {
    let save_changes = config.save_changes;
    let mut runtime = Runtime::new(config)?;
    let mut db = runtime.open_database()?;
    let mut engine = runtime.engine();
    let report = in_scope(&mut db, save_changes, |store| {
        engine.sync_documents(store, document_type, category)
    })?;
    print_documents(document_type, category, &report);
    Ok(())
}

/// Acquire or refresh the session token.
pub fn token(config: Config, force: bool) -> Result<()> {
    let source = config.credentials_path.clone();
    let mut runtime = Runtime::new(config)?;
    let now = runtime.clock.now();
    let session = runtime
        .client
        .session_mut()
        .acquire(Some(&source), force)
        .context("Cannot acquire session")?;

    let remaining = session.remaining(now.with_timezone(&Utc));
    println!("{} Session ready", "✓".green());
    println!(
        "  expires at {} ({} min left)",
        session
            .expires_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .cyan(),
        remaining.num_minutes()
    );
    Ok(())
}

/// Ad hoc toll search.
pub fn search_tolls(
    config: Config,
    genre: TollGenre,
    exit: Option<Vec<NaiveDate>>,
    acquisition: Option<Vec<NaiveDate>>,
    invoice: Option<Vec<NaiveDate>>,
    groups: &[String],
) -> Result<()> {
    let axis = TollDateAxis::from_filters(
        window_arg(exit),
        window_arg(acquisition),
        window_arg(invoice),
    )?;

    let mut runtime = Runtime::new(config)?;
    let items = runtime.client.search_tolls(genre, groups, &axis)?;

    println!(
        "{} {} {} toll(s)",
        "Found".green(),
        items.len().to_string().green().bold(),
        genre.label()
    );
    Ok(())
}

fn window_arg(dates: Option<Vec<NaiveDate>>) -> Option<DateWindow> {
    match dates.as_deref() {
        Some([from, to]) => Some(DateWindow::new(*from, *to)),
        _ => None,
    }
}

fn print_job_report(report: &JobReport) {
    print_groups(&report.groups);
    for (genre, tolls) in &report.tolls {
        print_tolls(*genre, tolls);
    }
    for (selector, documents) in &report.documents {
        print_documents(
            &selector.document_type,
            selector.category.as_deref(),
            documents,
        );
    }
}

fn print_groups(report: &GroupSyncReport) {
    if report.inserted.is_empty() {
        println!(
            "  {} toll groups: no new groups ({} stored)",
            "•".cyan(),
            report.stored
        );
    } else {
        println!(
            "  {} toll groups: {} new ({})",
            "✓".green(),
            report.inserted.len().to_string().green().bold(),
            report.inserted.join(", ")
        );
    }
}

fn print_tolls(genre: TollGenre, report: &TollSyncReport) {
    let marker = if report.failed > 0 || report.duplicates > 0 {
        "!".yellow()
    } else {
        "✓".green()
    };
    println!(
        "  {} {} tolls: {} new, {} already saved, {} duplicate, {} failed ({} window(s))",
        marker,
        genre.label(),
        report.inserted.to_string().green().bold(),
        report.already_saved,
        report.duplicates,
        report.failed,
        report.windows
    );
}

fn print_documents(document_type: &str, category: Option<&str>, report: &DocumentSyncReport) {
    let label = match category {
        Some(category) => format!("{}/{}", document_type, category),
        None => document_type.to_string(),
    };
    println!(
        "  {} {}: {} new, {} downloaded, {} failed",
        if report.failed > 0 { "!".yellow() } else { "✓".green() },
        label,
        report.inserted.to_string().green().bold(),
        report.downloaded.len(),
        report.failed
    );
    for path in &report.downloaded {
        println!("     {}", path.display().to_string().dimmed());
    }
}
