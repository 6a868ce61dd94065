// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "TripLog", "triplog"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("triplog.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    open_at(&path)
}

pub fn open_at(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Fresh schema in memory; used by tests and dry runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    -- one snapshot per currency per day; home currency is implicit
    CREATE TABLE IF NOT EXISTS currency_rates(
        id TEXT PRIMARY KEY,
        currency_code TEXT NOT NULL,
        currency_name TEXT NOT NULL,
        base_rate TEXT NOT NULL,
        snapshot_date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(currency_code, snapshot_date)
    );
    CREATE INDEX IF NOT EXISTS idx_currency_rates_date ON currency_rates(snapshot_date);

    CREATE TABLE IF NOT EXISTS cash_books(
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        budget TEXT NOT NULL, -- stored in HOME currency
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        CHECK(start_date <= end_date)
    );

    CREATE TABLE IF NOT EXISTS expense_entries(
        id TEXT PRIMARY KEY,
        cash_book_id TEXT NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        payment_method TEXT NOT NULL,
        foreign_amount TEXT,
        currency_code TEXT NOT NULL,
        home_amount TEXT NOT NULL,
        expense_date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(cash_book_id) REFERENCES cash_books(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_expense_entries_book
        ON expense_entries(cash_book_id, expense_date);
    "#,
    )?;
    Ok(())
}
