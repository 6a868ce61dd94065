// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::books::spent;
use crate::models::{CashBook, ExpenseEntry};
use crate::session::Session;
use crate::store::Entity;
use crate::utils::{ConversionError, home_amount, pretty_table};
use anyhow::{Context, Result};
use rust_decimal::Decimal;

/// (issue, detail) pairs; empty when everything checks out.
pub fn diagnose(session: &Session) -> Result<Vec<Vec<String>>> {
    let conn = session.conn();
    let home = session.home_currency();
    let mut rows = Vec::new();

    // 1) FX coverage gaps: foreign entries with no rate on or before their date
    for e in ExpenseEntry::fetch(conn, None)? {
        if e.currency_code == home {
            continue;
        }
        match home_amount(conn, home, Decimal::ONE, &e.currency_code, e.expense_date) {
            Ok(_) => {}
            Err(ConversionError::MissingRate { code, date }) => {
                rows.push(vec!["missing_fx".into(), format!("{} {} ({})", date, code, e.id)]);
            }
            Err(other) => return Err(other.into()),
        }
    }

    // 2) Books spent past their budget
    for b in CashBook::fetch(conn, None)? {
        let spent = spent(conn, &b)?;
        if spent > b.budget {
            let over = spent
                .checked_sub(b.budget)
                .context("Budget overrun is out of range")?;
            rows.push(vec![
                "over_budget".into(),
                format!("{} by {:.2} {}", b.name, over, home),
            ]);
        }
    }
    Ok(rows)
}

pub fn handle(session: &Session) -> Result<()> {
    let rows = diagnose(session)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
