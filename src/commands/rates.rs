// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CurrencyRate;
use crate::session::Session;
use crate::store::{Entity, RateFilter};
use crate::utils::{maybe_print_json, normalize_currency, parse_date, pretty_table};
use anyhow::{Context, Result};
use chrono::Local;

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", sub)) => fetch(session, sub)?,
        Some(("list", sub)) => list(session, sub)?,
        _ => {}
    }
    Ok(())
}

fn fetch(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let (date, result) = match sub.get_one::<String>("date") {
        Some(d) => {
            let date = parse_date(d)?;
            (date, session.fetch_rates_for(date))
        }
        None => (Local::now().date_naive(), session.fetch_current_rates()),
    };
    let saved = result.with_context(|| format!("Fetching rates for {}", date))?;
    if saved == 0 {
        println!("No rates published for {} (weekend or holiday?)", date);
    } else {
        println!("Stored {} rate(s) for {}", saved, date);
    }
    Ok(())
}

pub fn query_rates(session: &Session, sub: &clap::ArgMatches) -> Result<Vec<CurrencyRate>> {
    let mut rates = if sub.get_flag("latest") {
        session.latest_rates()?
    } else if let Some(d) = sub.get_one::<String>("date") {
        CurrencyRate::fetch(session.conn(), Some(&RateFilter::Date(parse_date(d)?)))?
    } else {
        session.fetch_stored_rates()?
    };
    if let Some(code) = sub.get_one::<String>("code") {
        let code = normalize_currency(code)?;
        let scaled = format!("{}(", code);
        rates.retain(|r| r.currency_code == code || r.currency_code.starts_with(&scaled));
    }
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rates.truncate(*limit);
    }
    Ok(rates)
}

fn list(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let rates = query_rates(session, sub)?;
    if maybe_print_json(sub.get_flag("json"), &rates)? {
        return Ok(());
    }
    let data: Vec<Vec<String>> = rates
        .into_iter()
        .map(|r| {
            vec![
                r.snapshot_date.to_string(),
                r.currency_code,
                r.currency_name,
                r.base_rate.to_string(),
            ]
        })
        .collect();
    let rate_hdr = format!("Rate ({})", session.home_currency());
    println!(
        "{}",
        pretty_table(&["Date", "Code", "Name", rate_hdr.as_str()], data)
    );
    Ok(())
}
