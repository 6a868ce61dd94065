// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{CashBook, ExpenseEntry};
use crate::session::Session;
use crate::store::{Entity, ExpenseFilter};
use crate::utils::{find_book, fmt_money, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub book: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub entries: usize,
    /// Home amounts, largest first.
    pub by_category: Vec<(String, Decimal)>,
    pub by_method: Vec<(String, Decimal)>,
    /// Foreign amounts per currency as entered.
    pub by_currency: Vec<(String, Decimal)>,
}

fn accumulate(map: &mut BTreeMap<String, Decimal>, key: String, v: Decimal) -> Result<()> {
    let slot = map.entry(key).or_insert(Decimal::ZERO);
    *slot = slot.checked_add(v).context("Total is out of range")?;
    Ok(())
}

fn ranked(map: BTreeMap<String, Decimal>) -> Vec<(String, Decimal)> {
    let mut items: Vec<_> = map.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items
}

pub fn summarize(conn: &Connection, book: &CashBook) -> Result<BookSummary> {
    let entries = ExpenseEntry::fetch(conn, Some(&ExpenseFilter::CashBook(book.id)))?;
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_method: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_currency: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut spent = Decimal::ZERO;
    for e in &entries {
        spent = spent
            .checked_add(e.home_amount)
            .context("Total spent is out of range")?;
        let cat = if e.category.is_empty() {
            "(uncategorized)".to_string()
        } else {
            e.category.clone()
        };
        accumulate(&mut by_category, cat, e.home_amount)?;
        accumulate(&mut by_method, e.payment_method.clone(), e.home_amount)?;
        if let Some(foreign) = e.foreign_amount {
            accumulate(&mut by_currency, e.currency_code.clone(), foreign)?;
        }
    }
    let remaining = book
        .budget
        .checked_sub(spent)
        .context("Remaining budget is out of range")?;
    Ok(BookSummary {
        book: book.name.clone(),
        budget: book.budget,
        spent,
        remaining,
        entries: entries.len(),
        by_category: ranked(by_category),
        by_method: ranked(by_method),
        by_currency: ranked(by_currency),
    })
}

pub fn handle(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let conn = session.conn();
    let book = find_book(conn, sub.get_one::<String>("book").unwrap())?;
    let s = summarize(conn, &book)?;
    if maybe_print_json(sub.get_flag("json"), &s)? {
        return Ok(());
    }
    let home = session.home_currency();
    println!(
        "{}: spent {} of {} ({} left, {} entries)",
        s.book,
        fmt_money(&s.spent, home),
        fmt_money(&s.budget, home),
        fmt_money(&s.remaining, home),
        s.entries
    );
    let to_rows = |items: &[(String, Decimal)]| -> Vec<Vec<String>> {
        items
            .iter()
            .map(|(k, v)| vec![k.clone(), format!("{:.2}", v)])
            .collect()
    };
    println!(
        "{}",
        pretty_table(&["Category", "Spent (HOME)"], to_rows(s.by_category.as_slice()))
    );
    println!(
        "{}",
        pretty_table(&["Method", "Spent (HOME)"], to_rows(s.by_method.as_slice()))
    );
    if !s.by_currency.is_empty() {
        println!(
            "{}",
            pretty_table(
                &["Currency", "Spent (FOREIGN)"],
                to_rows(s.by_currency.as_slice())
            )
        );
    }
    Ok(())
}
