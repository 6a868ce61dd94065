// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{CashBook, CurrencyRate};
use crate::store::{CashBookFilter, Entity, StoreError};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

const UA: &str = concat!(
    "triplog/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/triplog)"
);

pub fn http_client() -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .replace(',', "")
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}(\(\d+\))?$").unwrap());
static SCALE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z]{3})\((\d+)\)$").unwrap());

/// Upper-cases and validates a currency code such as `usd` or `JPY(100)`.
pub fn normalize_currency(s: &str) -> Result<String> {
    let code = s.trim().to_uppercase();
    if !CODE_RE.is_match(&code) {
        bail!("Invalid currency code '{}'", s);
    }
    Ok(code)
}

/// Splits a provider unit such as `JPY(100)` into its code and quote scale.
pub fn split_unit(unit: &str) -> (&str, u32) {
    if let Some(caps) = SCALE_RE.captures(unit) {
        if let (Some(code), Some(scale)) = (caps.get(1), caps.get(2)) {
            if let Ok(n) = scale.as_str().parse::<u32>() {
                if n > 0 {
                    return (code.as_str(), n);
                }
            }
        }
    }
    (unit, 1)
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("No {code} rate on or before {date}; run `triplog rates fetch --date {date}`")]
    MissingRate { code: String, date: NaiveDate },

    #[error("{amount} {code} cannot be converted: the home amount is out of range")]
    Overflow { code: String, amount: Decimal },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Converts `amount` in `currency` to home units with the rate in effect on
/// `date`: the newest snapshot dated on or before it.
///
/// Plain codes also match scaled provider units, so `JPY` finds a `JPY(100)`
/// snapshot and the rate is divided by 100.
pub fn home_amount(
    conn: &Connection,
    home_currency: &str,
    amount: Decimal,
    currency: &str,
    date: NaiveDate,
) -> Result<Decimal, ConversionError> {
    if currency == home_currency || split_unit(currency).0 == home_currency {
        return Ok(amount);
    }
    let mut rate = CurrencyRate::in_effect(conn, currency, date)?;
    if rate.is_none() && split_unit(currency).1 == 1 {
        rate = CurrencyRate::in_effect(conn, &format!("{}(100)", currency), date)?;
    }
    let rate = rate.ok_or_else(|| ConversionError::MissingRate {
        code: currency.to_string(),
        date,
    })?;
    let (_, scale) = split_unit(&rate.currency_code);
    amount
        .checked_mul(rate.base_rate)
        .and_then(|v| v.checked_div(Decimal::from(scale)))
        .ok_or_else(|| ConversionError::Overflow {
            code: currency.to_string(),
            amount,
        })
}

/// Sums home amounts, failing instead of overflowing.
pub fn checked_total<I>(amounts: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .context("Total is out of range")
}

/// Resolves a cash book by full id, id prefix, or exact name.
pub fn find_book(conn: &Connection, reference: &str) -> Result<CashBook> {
    let reference = reference.trim();
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(CashBook::get(conn, &id)?);
    }
    let books = CashBook::fetch(conn, None)?;
    let matches: Vec<&CashBook> = books
        .iter()
        .filter(|b| b.name == reference || b.id.to_string().starts_with(reference))
        .collect();
    match matches.as_slice() {
        [one] => Ok((*one).clone()),
        [] => bail!("Cash book '{}' not found", reference),
        _ => bail!("Cash book reference '{}' is ambiguous", reference),
    }
}

/// Books whose date range includes `date`.
pub fn books_active_on(conn: &Connection, date: NaiveDate) -> Result<Vec<CashBook>> {
    Ok(CashBook::fetch(conn, Some(&CashBookFilter::ActiveOn(date)))?)
}
