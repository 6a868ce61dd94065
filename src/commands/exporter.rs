// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ExpenseEntry;
use crate::session::Session;
use crate::store::{Entity, ExpenseFilter};
use crate::utils::find_book;
use anyhow::{Result, bail};
use serde_json::json;

pub fn handle(session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => export_expenses(session, sub),
        _ => Ok(()),
    }
}

fn export_expenses(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let conn = session.conn();
    let book = find_book(conn, sub.get_one::<String>("book").unwrap())?;
    let entries = ExpenseEntry::fetch(conn, Some(&ExpenseFilter::CashBook(book.id)))?;

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record([
            "date",
            "category",
            "payment_method",
            "amount",
            "currency",
            "home_amount",
            "note",
        ])?;
        for e in &entries {
            wtr.write_record([
                e.expense_date.to_string(),
                e.category.clone(),
                e.payment_method.clone(),
                e.foreign_amount.map(|a| a.to_string()).unwrap_or_default(),
                e.currency_code.clone(),
                e.home_amount.to_string(),
                e.note.clone(),
            ])?;
        }
        wtr.flush()?;
    } else {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "date": e.expense_date.to_string(),
                    "category": e.category,
                    "payment_method": e.payment_method,
                    "amount": e.foreign_amount.map(|a| a.to_string()),
                    "currency": e.currency_code,
                    "home_amount": e.home_amount.to_string(),
                    "note": e.note,
                })
            })
            .collect();
        std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
    }
    println!("Exported {} expense(s) of '{}' to {}", entries.len(), book.name, out);
    Ok(())
}
