// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ExpenseEntry;
use crate::session::Session;
use crate::store::{Entity, ExpenseFilter};
use crate::utils::{
    find_book, home_amount, maybe_print_json, normalize_currency, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(session, sub)?,
        Some(("list", sub)) => list(session, sub)?,
        Some(("edit", sub)) => edit(session, sub)?,
        Some(("rm", sub)) => remove(session, sub)?,
        _ => {}
    }
    Ok(())
}

/// Splits an entered amount into (foreign amount, home amount).
/// Home-currency entries carry no foreign amount.
pub fn price(
    conn: &Connection,
    home_currency: &str,
    amount: Decimal,
    currency: &str,
    date: NaiveDate,
) -> Result<(Option<Decimal>, Decimal)> {
    if currency == home_currency {
        return Ok((None, amount));
    }
    let home = home_amount(conn, home_currency, amount, currency, date)?;
    Ok((Some(amount), home))
}

pub fn find_expense(conn: &Connection, reference: &str) -> Result<ExpenseEntry> {
    let reference = reference.trim();
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(ExpenseEntry::get(conn, &id)?);
    }
    let mut matches: Vec<ExpenseEntry> = ExpenseEntry::fetch(conn, None)?
        .into_iter()
        .filter(|e| e.id.to_string().starts_with(reference))
        .collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => bail!("Expense '{}' not found", reference),
        _ => bail!("Expense reference '{}' is ambiguous", reference),
    }
}

fn add(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let book = find_book(session.conn(), sub.get_one::<String>("book").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount <= Decimal::ZERO {
        bail!("Expense amount must be positive, got {}", amount);
    }
    let home = session.home_currency().to_string();
    let currency = match sub.get_one::<String>("currency") {
        Some(c) => normalize_currency(c)?,
        None => home.clone(),
    };
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    if !book.covers(date) {
        warn!(book = %book.name, %date, "expense date falls outside the trip");
    }

    let (foreign, home_amt) = price(session.conn(), &home, amount, &currency, date)?;
    let mut entry = ExpenseEntry::new(book.id, date, currency.as_str(), foreign, home_amt)
        .categorized(
            sub.get_one::<String>("category").unwrap().trim(),
            sub.get_one::<String>("method").unwrap().trim(),
        );
    if let Some(note) = sub.get_one::<String>("note") {
        entry = entry.with_note(note.trim());
    }

    let uow = session.unit_of_work()?;
    entry.save(&uow)?;
    uow.commit()?;
    println!(
        "Recorded {} {} on {} in '{}' ({:.2} {}) [{}]",
        amount, currency, date, book.name, home_amt, home, entry.id
    );
    Ok(())
}

fn list(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let conn = session.conn();
    let book = find_book(conn, sub.get_one::<String>("book").unwrap())?;
    let from = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    let filter = match (from, to) {
        (Some(from), Some(to)) => ExpenseFilter::CashBookBetween {
            cash_book_id: book.id,
            from,
            to,
        },
        _ => ExpenseFilter::CashBook(book.id),
    };
    let mut entries = ExpenseEntry::fetch(conn, Some(&filter))?;
    entries.retain(|e| {
        from.is_none_or(|f| e.expense_date >= f) && to.is_none_or(|t| e.expense_date <= t)
    });
    if let Some(cat) = sub.get_one::<String>("category") {
        entries.retain(|e| e.category == *cat);
    }

    if maybe_print_json(sub.get_flag("json"), &entries)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.id.to_string()[..8].to_string(),
                e.expense_date.to_string(),
                e.category.clone(),
                e.payment_method.clone(),
                e.foreign_amount
                    .map(|a| format!("{:.2}", a))
                    .unwrap_or_default(),
                e.currency_code.clone(),
                format!("{:.2}", e.home_amount),
                e.note.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Date", "Category", "Method", "Amount", "CCY", "Home", "Note"],
            rows,
        )
    );
    Ok(())
}

fn edit(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let mut entry = find_expense(session.conn(), sub.get_one::<String>("id").unwrap())?;
    let home = session.home_currency().to_string();

    let currency = sub
        .get_one::<String>("currency")
        .map(|c| normalize_currency(c))
        .transpose()?;
    let amount = match sub.get_one::<String>("amount") {
        Some(a) => parse_decimal(a)?,
        // the stored amount is denominated in the old currency
        None if currency.as_ref().is_some_and(|c| *c != entry.currency_code) => {
            bail!("Changing the currency of an expense requires --amount")
        }
        None => entry.foreign_amount.unwrap_or(entry.home_amount),
    };
    if amount <= Decimal::ZERO {
        bail!("Expense amount must be positive, got {}", amount);
    }
    if let Some(c) = currency {
        entry.currency_code = c;
    }
    if let Some(d) = sub.get_one::<String>("date") {
        entry.expense_date = parse_date(d)?;
    }
    if let Some(c) = sub.get_one::<String>("category") {
        entry.category = c.trim().to_string();
    }
    if let Some(m) = sub.get_one::<String>("method") {
        entry.payment_method = m.trim().to_string();
    }
    if let Some(n) = sub.get_one::<String>("note") {
        entry.note = n.trim().to_string();
    }
    let (foreign, home_amt) = price(
        session.conn(),
        &home,
        amount,
        &entry.currency_code,
        entry.expense_date,
    )?;
    entry.foreign_amount = foreign;
    entry.home_amount = home_amt;

    let uow = session.unit_of_work()?;
    entry.update(&entry.id, &uow)?;
    uow.commit()?;
    println!("Updated expense {}", entry.id);
    Ok(())
}

fn remove(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let entry = find_expense(session.conn(), sub.get_one::<String>("id").unwrap())?;
    let uow = session.unit_of_work()?;
    ExpenseEntry::delete(&entry.id, &uow)?;
    uow.commit()?;
    println!("Removed expense {}", entry.id);
    Ok(())
}
