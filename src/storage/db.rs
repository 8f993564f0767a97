//! SQLite store for toll groups, tolls and documents.

use super::{DuplicateCheck, SyncStore};
use crate::models::{DocumentRecord, TollGenre, TollGroup, TollRecord};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// SQLite database holding the synced records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Cannot create database directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Cannot open database: {}", path.display()))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open database in memory (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS toll_group (
                code TEXT PRIMARY KEY NOT NULL,
                description TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS toll (
                id TEXT PRIMARY KEY NOT NULL,
                toll_country TEXT NOT NULL,
                toll_group TEXT NOT NULL,
                toll_genre TEXT NOT NULL,
                toll_source TEXT,
                acquisition_date TEXT NOT NULL,
                customer_code TEXT NOT NULL,
                contract_code TEXT NOT NULL,
                sign_of_transaction TEXT NOT NULL,
                net_amount TEXT NOT NULL,
                gross_amount TEXT NOT NULL,
                vat_rate TEXT NOT NULL,
                currency_code TEXT NOT NULL,
                exchange_rate TEXT,
                network_code TEXT,
                entry_gate_code TEXT,
                entry_gate_description TEXT,
                entry_date TEXT,
                exit_gate_code TEXT NOT NULL,
                exit_gate_description TEXT NOT NULL,
                exit_date TEXT NOT NULL,
                distance TEXT,
                device_type TEXT NOT NULL,
                device_serial_number TEXT NOT NULL,
                device_service_pan TEXT,
                vehicle_plate TEXT NOT NULL,
                vehicle_country TEXT NOT NULL,
                vehicle_euro_class TEXT,
                tariff_class TEXT,
                invoice_article TEXT,
                invoice_number TEXT,
                invoice_date TEXT,
                global_identifier TEXT NOT NULL,
                recording_date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_toll_genre_exit ON toll(toll_genre, exit_date);
            CREATE INDEX IF NOT EXISTS idx_toll_global_identifier ON toll(global_identifier);

            CREATE TABLE IF NOT EXISTS document (
                id TEXT PRIMARY KEY NOT NULL,
                customer_code TEXT NOT NULL,
                company_name TEXT NOT NULL,
                filename TEXT NOT NULL,
                document_date TEXT NOT NULL,
                publication_date TEXT NOT NULL,
                document_type TEXT NOT NULL,
                document_category TEXT,
                recording_date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_document_type ON document(document_type);
        ",
        )?;
        Ok(())
    }

    /// Open a transaction scope for one sync step.
    ///
    /// With `save_changes` off the scope always rolls back.
    pub fn scope(&mut self, save_changes: bool) -> Result<StoreScope<'_>> {
        let tx = self
            .conn
            .transaction()
            .context("Cannot begin store transaction")?;
        Ok(StoreScope { tx, save_changes })
    }

    pub fn toll_group_count(&self) -> Result<usize> {
        count(&self.conn, "SELECT COUNT(*) FROM toll_group", [])
    }

    /// Count stored tolls, optionally of one genre.
    pub fn toll_count(&self, genre: Option<TollGenre>) -> Result<usize> {
        match genre {
            Some(genre) => count(
                &self.conn,
                "SELECT COUNT(*) FROM toll WHERE toll_genre = ?1",
                params![genre.code()],
            ),
            None => count(&self.conn, "SELECT COUNT(*) FROM toll", []),
        }
    }

    pub fn document_count(&self) -> Result<usize> {
        count(&self.conn, "SELECT COUNT(*) FROM document", [])
    }
}

fn count<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<usize> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(n as usize)
}

fn decimal_text(value: &Decimal) -> String {
    value.to_string()
}

/// One transaction over the store.
///
/// `finish` commits when changes are saved; dropping an unfinished scope
/// rolls it back.
pub struct StoreScope<'conn> {
    tx: Transaction<'conn>,
    save_changes: bool,
}

impl StoreScope<'_> {
    /// Commit (or, for a dry run, roll back) the scope.
    pub fn finish(self) -> Result<()> {
        if self.save_changes {
            self.tx.commit().context("Cannot commit store transaction")
        } else {
            debug!("changes discarded");
            self.tx
                .rollback()
                .context("Cannot roll back store transaction")
        }
    }
}

impl SyncStore for StoreScope<'_> {
    fn saves_changes(&self) -> bool {
        self.save_changes
    }

    fn toll_group_codes(&self) -> Result<HashSet<String>> {
        let mut stmt = self.tx.prepare("SELECT code FROM toll_group")?;
        let codes = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(codes)
    }

    fn insert_toll_group(&self, group: &TollGroup) -> Result<usize> {
        let n = self
            .tx
            .execute(
                "INSERT OR IGNORE INTO toll_group (code, description) VALUES (?1, ?2)",
                params![group.code, group.description],
            )
            .with_context(|| format!("Cannot insert toll group {}", group.code))?;
        Ok(n)
    }

    fn max_exit_date(&self, genre: TollGenre) -> Result<Option<NaiveDateTime>> {
        let max: Option<NaiveDateTime> = self
            .tx
            .query_row(
                "SELECT MAX(exit_date) FROM toll WHERE toll_genre = ?1",
                params![genre.code()],
                |row| row.get(0),
            )
            .context("Cannot read last exit date")?;
        Ok(max)
    }

    fn duplicate_check(&self, id: &str, global_identifier: &str) -> Result<DuplicateCheck> {
        let (by_id, by_global_identifier): (i64, i64) = self.tx.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN id = ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN global_identifier = ?2 THEN 1 ELSE 0 END), 0)
             FROM toll
             WHERE id = ?1 OR global_identifier = ?2",
            params![id, global_identifier],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(DuplicateCheck {
            by_id: by_id as u64,
            by_global_identifier: by_global_identifier as u64,
        })
    }

    fn insert_toll(&self, toll: &TollRecord) -> Result<usize> {
        let f = toll.fields();
        let n = self
            .tx
            .execute(
                "INSERT OR IGNORE INTO toll (
                    id, toll_country, toll_group, toll_genre, toll_source,
                    acquisition_date, customer_code, contract_code, sign_of_transaction,
                    net_amount, gross_amount, vat_rate, currency_code, exchange_rate,
                    network_code, entry_gate_code, entry_gate_description, entry_date,
                    exit_gate_code, exit_gate_description, exit_date, distance,
                    device_type, device_serial_number, device_service_pan,
                    vehicle_plate, vehicle_country, vehicle_euro_class, tariff_class,
                    invoice_article, invoice_number, invoice_date,
                    global_identifier, recording_date
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                           ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                           ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34)",
                params![
                    f.id,
                    f.toll_country,
                    f.toll_group,
                    f.toll_genre,
                    f.toll_source,
                    f.acquisition_date,
                    f.customer_code,
                    f.contract_code,
                    f.sign_of_transaction,
                    decimal_text(&f.net_amount),
                    decimal_text(&f.gross_amount),
                    decimal_text(&f.vat_rate),
                    f.currency_code,
                    f.exchange_rate.as_ref().map(decimal_text),
                    f.network_code,
                    f.entry_gate_code,
                    f.entry_gate_description,
                    f.entry_date,
                    f.exit_gate_code,
                    f.exit_gate_description,
                    f.exit_date,
                    f.distance.as_ref().map(decimal_text),
                    f.device_type,
                    f.device_serial_number,
                    f.device_service_pan,
                    f.vehicle_plate,
                    f.vehicle_country,
                    f.vehicle_euro_class,
                    f.tariff_class,
                    f.invoice_article,
                    f.invoice_number,
                    f.invoice_date,
                    toll.global_identifier(),
                    f.recording_date,
                ],
            )
            .with_context(|| format!("Cannot insert toll {}", toll.id()))?;
        Ok(n)
    }

    fn document_ids(&self) -> Result<HashSet<String>> {
        let mut stmt = self.tx.prepare("SELECT id FROM document")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(ids)
    }

    fn insert_document(&self, document: &DocumentRecord) -> Result<usize> {
        let n = self
            .tx
            .execute(
                "INSERT OR IGNORE INTO document (
                    id, customer_code, company_name, filename, document_date,
                    publication_date, document_type, document_category, recording_date
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    document.id,
                    document.customer_code,
                    document.company_name,
                    document.filename,
                    document.document_date,
                    document.publication_date,
                    document.document_type,
                    document.document_category,
                    document.recording_date,
                ],
            )
            .with_context(|| format!("Cannot insert document {}", document.id))?;
        Ok(n)
    }
}
