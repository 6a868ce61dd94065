// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed persistence for the three record kinds.
//!
//! Every operation takes the unit of work explicitly. Pass a
//! [`rusqlite::Transaction`] (it derefs to [`Connection`]) and commit it when
//! the staged changes should become durable; dropping it rolls them back.

use crate::models::{CashBook, CurrencyRate, ExpenseEntry};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Staged-changes context handed to every store operation.
pub type UnitOfWork<'conn> = rusqlite::Transaction<'conn>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    fn not_found(kind: &'static str, id: impl Display) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// A persisted record kind, addressed by `Id` and queried with `Filter`.
pub trait Entity: Sized {
    type Id: Display;
    type Filter;

    const KIND: &'static str;

    fn id_filter(id: &Self::Id) -> Self::Filter;

    /// Inserts a new record.
    fn save(&self, uow: &Connection) -> Result<(), StoreError>;

    /// All records matching `filter`, or every record when `None`.
    fn fetch(uow: &Connection, filter: Option<&Self::Filter>) -> Result<Vec<Self>, StoreError>;

    /// Replaces the mutable fields of the record identified by `id` with `self`'s.
    /// Yields [`StoreError::NotFound`] and changes nothing when `id` is unknown.
    fn update(&self, id: &Self::Id, uow: &Connection) -> Result<(), StoreError>;

    /// Removes the record identified by `id`, cascading to owned records.
    fn delete(id: &Self::Id, uow: &Connection) -> Result<(), StoreError>;

    fn find(uow: &Connection, id: &Self::Id) -> Result<Option<Self>, StoreError> {
        Ok(Self::fetch(uow, Some(&Self::id_filter(id)))?
            .into_iter()
            .next())
    }

    fn get(uow: &Connection, id: &Self::Id) -> Result<Self, StoreError> {
        Self::find(uow, id)?.ok_or_else(|| StoreError::not_found(Self::KIND, id))
    }
}

fn conversion_failure(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = r.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conversion_failure(idx, e))
}

fn decimal_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>().map_err(|e| conversion_failure(idx, e))
}

fn opt_decimal_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = r.get(idx)?;
    s.map(|s| s.parse::<Decimal>().map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

fn query_all<T>(
    uow: &Connection,
    sql: &str,
    args: &[String],
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, StoreError> {
    let mut stmt = uow.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), map)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Cash books

#[derive(Debug, Clone)]
pub enum CashBookFilter {
    Id(Uuid),
    NameContains(String),
    /// Books whose date range includes the day.
    ActiveOn(NaiveDate),
}

impl CashBook {
    fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidRecord("cash book name is empty".into()));
        }
        if self.start_date > self.end_date {
            return Err(StoreError::InvalidRecord(format!(
                "cash book '{}' starts {} after it ends {}",
                self.name, self.start_date, self.end_date
            )));
        }
        Ok(())
    }

    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CashBook {
            id: uuid_at(r, 0)?,
            name: r.get(1)?,
            budget: decimal_at(r, 2)?,
            start_date: r.get(3)?,
            end_date: r.get(4)?,
            note: r.get(5)?,
        })
    }
}

impl Entity for CashBook {
    type Id = Uuid;
    type Filter = CashBookFilter;

    const KIND: &'static str = "Cash book";

    fn id_filter(id: &Uuid) -> CashBookFilter {
        CashBookFilter::Id(*id)
    }

    fn save(&self, uow: &Connection) -> Result<(), StoreError> {
        self.validate()?;
        uow.execute(
            "INSERT INTO cash_books(id, name, budget, start_date, end_date, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.id.to_string(),
                self.name,
                self.budget.to_string(),
                self.start_date,
                self.end_date,
                self.note
            ],
        )?;
        debug!(id = %self.id, name = %self.name, "cash book staged");
        Ok(())
    }

    fn fetch(uow: &Connection, filter: Option<&CashBookFilter>) -> Result<Vec<Self>, StoreError> {
        let mut sql = String::from(
            "SELECT id, name, budget, start_date, end_date, note FROM cash_books WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();
        match filter {
            Some(CashBookFilter::Id(id)) => {
                sql.push_str(" AND id=?");
                args.push(id.to_string());
            }
            Some(CashBookFilter::NameContains(s)) => {
                sql.push_str(" AND instr(lower(name), lower(?)) > 0");
                args.push(s.clone());
            }
            Some(CashBookFilter::ActiveOn(d)) => {
                sql.push_str(" AND start_date<=? AND end_date>=?");
                args.push(d.to_string());
                args.push(d.to_string());
            }
            None => {}
        }
        sql.push_str(" ORDER BY start_date DESC, name");
        query_all(uow, &sql, &args, CashBook::from_row)
    }

    fn update(&self, id: &Uuid, uow: &Connection) -> Result<(), StoreError> {
        self.validate()?;
        let changed = uow.execute(
            "UPDATE cash_books SET name=?1, budget=?2, start_date=?3, end_date=?4, note=?5
             WHERE id=?6",
            params![
                self.name,
                self.budget.to_string(),
                self.start_date,
                self.end_date,
                self.note,
                id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(Self::KIND, id));
        }
        Ok(())
    }

    fn delete(id: &Uuid, uow: &Connection) -> Result<(), StoreError> {
        // entries go with the book via ON DELETE CASCADE
        let changed = uow.execute("DELETE FROM cash_books WHERE id=?1", params![id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::not_found(Self::KIND, id));
        }
        debug!(%id, "cash book deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Expense entries

#[derive(Debug, Clone)]
pub enum ExpenseFilter {
    Id(Uuid),
    CashBook(Uuid),
    CashBookBetween {
        cash_book_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    },
    Category(String),
}

impl ExpenseEntry {
    fn validate(&self, uow: &Connection) -> Result<(), StoreError> {
        if self.currency_code.trim().is_empty() {
            return Err(StoreError::InvalidRecord("expense currency is empty".into()));
        }
        let owner: Option<i64> = uow
            .query_row(
                "SELECT 1 FROM cash_books WHERE id=?1",
                params![self.cash_book_id.to_string()],
                |r| r.get(0),
            )
            .optional()?;
        if owner.is_none() {
            return Err(StoreError::not_found(CashBook::KIND, self.cash_book_id));
        }
        Ok(())
    }

    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ExpenseEntry {
            id: uuid_at(r, 0)?,
            cash_book_id: uuid_at(r, 1)?,
            note: r.get(2)?,
            category: r.get(3)?,
            payment_method: r.get(4)?,
            foreign_amount: opt_decimal_at(r, 5)?,
            currency_code: r.get(6)?,
            home_amount: decimal_at(r, 7)?,
            expense_date: r.get(8)?,
        })
    }
}

impl Entity for ExpenseEntry {
    type Id = Uuid;
    type Filter = ExpenseFilter;

    const KIND: &'static str = "Expense";

    fn id_filter(id: &Uuid) -> ExpenseFilter {
        ExpenseFilter::Id(*id)
    }

    fn save(&self, uow: &Connection) -> Result<(), StoreError> {
        self.validate(uow)?;
        uow.execute(
            "INSERT INTO expense_entries(id, cash_book_id, note, category, payment_method,
                foreign_amount, currency_code, home_amount, expense_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.id.to_string(),
                self.cash_book_id.to_string(),
                self.note,
                self.category,
                self.payment_method,
                self.foreign_amount.map(|d| d.to_string()),
                self.currency_code,
                self.home_amount.to_string(),
                self.expense_date
            ],
        )?;
        debug!(id = %self.id, book = %self.cash_book_id, "expense staged");
        Ok(())
    }

    fn fetch(uow: &Connection, filter: Option<&ExpenseFilter>) -> Result<Vec<Self>, StoreError> {
        let mut sql = String::from(
            "SELECT id, cash_book_id, note, category, payment_method, foreign_amount,
                    currency_code, home_amount, expense_date
             FROM expense_entries WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();
        match filter {
            Some(ExpenseFilter::Id(id)) => {
                sql.push_str(" AND id=?");
                args.push(id.to_string());
            }
            Some(ExpenseFilter::CashBook(book)) => {
                sql.push_str(" AND cash_book_id=?");
                args.push(book.to_string());
            }
            Some(ExpenseFilter::CashBookBetween {
                cash_book_id,
                from,
                to,
            }) => {
                sql.push_str(" AND cash_book_id=? AND expense_date>=? AND expense_date<=?");
                args.push(cash_book_id.to_string());
                args.push(from.to_string());
                args.push(to.to_string());
            }
            Some(ExpenseFilter::Category(c)) => {
                sql.push_str(" AND category=?");
                args.push(c.clone());
            }
            None => {}
        }
        sql.push_str(" ORDER BY expense_date, rowid");
        query_all(uow, &sql, &args, ExpenseEntry::from_row)
    }

    fn update(&self, id: &Uuid, uow: &Connection) -> Result<(), StoreError> {
        self.validate(uow)?;
        let changed = uow.execute(
            "UPDATE expense_entries SET cash_book_id=?1, note=?2, category=?3, payment_method=?4,
                foreign_amount=?5, currency_code=?6, home_amount=?7, expense_date=?8
             WHERE id=?9",
            params![
                self.cash_book_id.to_string(),
                self.note,
                self.category,
                self.payment_method,
                self.foreign_amount.map(|d| d.to_string()),
                self.currency_code,
                self.home_amount.to_string(),
                self.expense_date,
                id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(Self::KIND, id));
        }
        Ok(())
    }

    fn delete(id: &Uuid, uow: &Connection) -> Result<(), StoreError> {
        let changed = uow.execute(
            "DELETE FROM expense_entries WHERE id=?1",
            params![id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(Self::KIND, id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Currency rates

#[derive(Debug, Clone)]
pub enum RateFilter {
    Id(Uuid),
    Code(String),
    Date(NaiveDate),
    /// Snapshots for `code` dated on or before `date`, newest first.
    CodeOnOrBefore { code: String, date: NaiveDate },
}

impl CurrencyRate {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CurrencyRate {
            id: uuid_at(r, 0)?,
            currency_code: r.get(1)?,
            currency_name: r.get(2)?,
            base_rate: decimal_at(r, 3)?,
            snapshot_date: r.get(4)?,
        })
    }

    /// Inserts the snapshot, or replaces name and rate of the existing
    /// snapshot for the same (code, day). The existing row keeps its id.
    pub fn upsert(&self, uow: &Connection) -> Result<(), StoreError> {
        uow.execute(
            "INSERT INTO currency_rates(id, currency_code, currency_name, base_rate, snapshot_date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(currency_code, snapshot_date) DO UPDATE SET
                currency_name=excluded.currency_name, base_rate=excluded.base_rate",
            params![
                self.id.to_string(),
                self.currency_code,
                self.currency_name,
                self.base_rate.to_string(),
                self.snapshot_date
            ],
        )?;
        Ok(())
    }

    /// The snapshot in effect for `code` on `date`.
    pub fn in_effect(
        uow: &Connection,
        code: &str,
        date: NaiveDate,
    ) -> Result<Option<CurrencyRate>, StoreError> {
        let filter = RateFilter::CodeOnOrBefore {
            code: code.to_string(),
            date,
        };
        Ok(Self::fetch(uow, Some(&filter))?.into_iter().next())
    }
}

impl Entity for CurrencyRate {
    type Id = Uuid;
    type Filter = RateFilter;

    const KIND: &'static str = "Currency rate";

    fn id_filter(id: &Uuid) -> RateFilter {
        RateFilter::Id(*id)
    }

    fn save(&self, uow: &Connection) -> Result<(), StoreError> {
        uow.execute(
            "INSERT INTO currency_rates(id, currency_code, currency_name, base_rate, snapshot_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.id.to_string(),
                self.currency_code,
                self.currency_name,
                self.base_rate.to_string(),
                self.snapshot_date
            ],
        )?;
        Ok(())
    }

    fn fetch(uow: &Connection, filter: Option<&RateFilter>) -> Result<Vec<Self>, StoreError> {
        let mut sql = String::from(
            "SELECT id, currency_code, currency_name, base_rate, snapshot_date
             FROM currency_rates WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();
        match filter {
            Some(RateFilter::Id(id)) => {
                sql.push_str(" AND id=?");
                args.push(id.to_string());
            }
            Some(RateFilter::Code(code)) => {
                sql.push_str(" AND currency_code=?");
                args.push(code.clone());
            }
            Some(RateFilter::Date(d)) => {
                sql.push_str(" AND snapshot_date=?");
                args.push(d.to_string());
            }
            Some(RateFilter::CodeOnOrBefore { code, date }) => {
                sql.push_str(" AND currency_code=? AND snapshot_date<=?");
                args.push(code.clone());
                args.push(date.to_string());
            }
            None => {}
        }
        sql.push_str(" ORDER BY snapshot_date DESC, currency_code");
        query_all(uow, &sql, &args, CurrencyRate::from_row)
    }

    fn update(&self, id: &Uuid, uow: &Connection) -> Result<(), StoreError> {
        let changed = uow.execute(
            "UPDATE currency_rates SET currency_code=?1, currency_name=?2, base_rate=?3,
                snapshot_date=?4
             WHERE id=?5",
            params![
                self.currency_code,
                self.currency_name,
                self.base_rate.to_string(),
                self.snapshot_date,
                id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(Self::KIND, id));
        }
        Ok(())
    }

    fn delete(id: &Uuid, uow: &Connection) -> Result<(), StoreError> {
        let changed = uow.execute(
            "DELETE FROM currency_rates WHERE id=?1",
            params![id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(Self::KIND, id));
        }
        Ok(())
    }
}
