// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One day's rate for one currency, in home-currency units per provider unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub id: Uuid,
    pub currency_code: String, // may carry a scale suffix, e.g. JPY(100)
    pub currency_name: String,
    pub base_rate: Decimal,
    pub snapshot_date: NaiveDate,
}

impl CurrencyRate {
    pub fn new(
        currency_code: impl Into<String>,
        currency_name: impl Into<String>,
        base_rate: Decimal,
        snapshot_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            currency_code: currency_code.into(),
            currency_name: currency_name.into(),
            base_rate,
            snapshot_date,
        }
    }
}

/// A trip: budget plus the date range it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashBook {
    pub id: Uuid,
    pub name: String,
    pub budget: Decimal, // home currency
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub note: String,
}

impl CashBook {
    pub fn new(
        name: impl Into<String>,
        budget: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            budget,
            start_date,
            end_date,
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A single expense recorded against a cash book.
///
/// `home_amount` is derived from `foreign_amount` and the rate in effect on
/// `expense_date`; see [`crate::utils::home_amount`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub id: Uuid,
    pub cash_book_id: Uuid,
    pub note: String,
    pub category: String,
    pub payment_method: String,
    pub foreign_amount: Option<Decimal>,
    pub currency_code: String,
    pub home_amount: Decimal,
    pub expense_date: NaiveDate,
}

impl ExpenseEntry {
    pub fn new(
        cash_book_id: Uuid,
        expense_date: NaiveDate,
        currency_code: impl Into<String>,
        foreign_amount: Option<Decimal>,
        home_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cash_book_id,
            note: String::new(),
            category: String::new(),
            payment_method: String::new(),
            foreign_amount,
            currency_code: currency_code.into(),
            home_amount,
            expense_date,
        }
    }

    pub fn categorized(
        mut self,
        category: impl Into<String>,
        payment_method: impl Into<String>,
    ) -> Self {
        self.category = category.into();
        self.payment_method = payment_method.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}
