// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{CashBook, ExpenseEntry};
use crate::session::Session;
use crate::store::{Entity, ExpenseFilter};
use crate::utils::{
    books_active_on, checked_total, find_book, fmt_money, maybe_print_json, parse_date,
    parse_decimal, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(session, sub)?,
        Some(("list", sub)) => list(session, sub)?,
        Some(("show", sub)) => show(session, sub)?,
        Some(("edit", sub)) => edit(session, sub)?,
        Some(("rm", sub)) => remove(session, sub)?,
        _ => {}
    }
    Ok(())
}

/// Sum of home amounts recorded against the book.
pub fn spent(conn: &Connection, book: &CashBook) -> Result<Decimal> {
    let entries = ExpenseEntry::fetch(conn, Some(&ExpenseFilter::CashBook(book.id)))?;
    checked_total(entries.iter().map(|e| e.home_amount))
}

fn add(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let budget = parse_decimal(sub.get_one::<String>("budget").unwrap())?;
    let start = parse_date(sub.get_one::<String>("start").unwrap())?;
    let end = parse_date(sub.get_one::<String>("end").unwrap())?;
    let mut book = CashBook::new(name, budget, start, end);
    if let Some(note) = sub.get_one::<String>("note") {
        book = book.with_note(note.trim());
    }

    let uow = session.unit_of_work()?;
    book.save(&uow)?;
    uow.commit()?;
    println!(
        "Created cash book '{}' [{}] {} .. {}, budget {}",
        book.name,
        book.id,
        book.start_date,
        book.end_date,
        fmt_money(&book.budget, session.home_currency())
    );
    Ok(())
}

fn list(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let conn = session.conn();
    let books = match sub.get_one::<String>("active") {
        Some(d) => books_active_on(conn, parse_date(d)?)?,
        None => CashBook::fetch(conn, None)?,
    };
    if maybe_print_json(sub.get_flag("json"), &books)? {
        return Ok(());
    }
    let mut data = Vec::new();
    for b in &books {
        let spent = spent(conn, b)?;
        data.push(vec![
            b.id.to_string()[..8].to_string(),
            b.name.clone(),
            b.start_date.to_string(),
            b.end_date.to_string(),
            format!("{:.2}", b.budget),
            format!("{:.2}", spent),
        ]);
    }
    println!(
        "{}",
        pretty_table(
            &["Id", "Name", "Start", "End", "Budget (HOME)", "Spent (HOME)"],
            data
        )
    );
    Ok(())
}

fn show(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let conn = session.conn();
    let book = find_book(conn, sub.get_one::<String>("book").unwrap())?;
    if maybe_print_json(sub.get_flag("json"), &book)? {
        return Ok(());
    }
    let home = session.home_currency();
    let spent = spent(conn, &book)?;
    let remaining = book
        .budget
        .checked_sub(spent)
        .context("Remaining budget is out of range")?;
    let rows = vec![
        vec!["Id".to_string(), book.id.to_string()],
        vec!["Name".to_string(), book.name.clone()],
        vec![
            "Dates".to_string(),
            format!("{} .. {}", book.start_date, book.end_date),
        ],
        vec!["Budget".to_string(), fmt_money(&book.budget, home)],
        vec!["Spent".to_string(), fmt_money(&spent, home)],
        vec!["Remaining".to_string(), fmt_money(&remaining, home)],
        vec!["Note".to_string(), book.note.clone()],
    ];
    println!("{}", pretty_table(&["Field", "Value"], rows));
    Ok(())
}

fn edit(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let mut book = find_book(session.conn(), sub.get_one::<String>("book").unwrap())?;
    if let Some(name) = sub.get_one::<String>("name") {
        book.name = name.trim().to_string();
    }
    if let Some(budget) = sub.get_one::<String>("budget") {
        book.budget = parse_decimal(budget)?;
    }
    if let Some(start) = sub.get_one::<String>("start") {
        book.start_date = parse_date(start)?;
    }
    if let Some(end) = sub.get_one::<String>("end") {
        book.end_date = parse_date(end)?;
    }
    if let Some(note) = sub.get_one::<String>("note") {
        book.note = note.trim().to_string();
    }

    let uow = session.unit_of_work()?;
    book.update(&book.id, &uow)?;
    uow.commit()?;
    println!("Updated cash book '{}'", book.name);
    Ok(())
}

fn remove(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let book = find_book(session.conn(), sub.get_one::<String>("book").unwrap())?;
    let owned = ExpenseEntry::fetch(session.conn(), Some(&ExpenseFilter::CashBook(book.id)))?;

    let uow = session.unit_of_work()?;
    CashBook::delete(&book.id, &uow)?;
    uow.commit()?;
    println!(
        "Removed cash book '{}' and {} expense(s)",
        book.name,
        owned.len()
    );
    Ok(())
}
