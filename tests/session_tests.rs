// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use triplog::config::AppConfig;
use triplog::db;
use triplog::models::CurrencyRate;
use triplog::rates::{ClientError, DataType, RateRecord, RateSource, ResultCode, decode_rates};
use triplog::session::{Session, SessionError};
use triplog::store::{Entity, RateFilter};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn rec(unit: &str, name: Option<&str>, rate: Option<&str>) -> RateRecord {
    RateRecord {
        result: Some(1),
        cur_unit: Some(unit.to_string()),
        cur_nm: name.map(str::to_string),
        deal_bas_r: rate.map(str::to_string),
        ..Default::default()
    }
}

/// Serves whatever the test queued; `None` simulates a broken response.
#[derive(Default)]
struct Scripted {
    next: Mutex<Option<Vec<RateRecord>>>,
    calls: Mutex<Vec<(DataType, NaiveDate)>>,
}

impl Scripted {
    fn serve(&self, records: Option<Vec<RateRecord>>) {
        *self.next.lock().unwrap() = records;
    }
}

impl RateSource for Scripted {
    fn fetch_rates(
        &self,
        data_type: DataType,
        date: NaiveDate,
    ) -> Result<Vec<RateRecord>, ClientError> {
        self.calls.lock().unwrap().push((data_type, date));
        match self.next.lock().unwrap().clone() {
            Some(records) => Ok(records),
            None => decode_rates("<html>gateway timeout</html>"),
        }
    }
}

fn session() -> (Session, Arc<Scripted>) {
    let source = Arc::new(Scripted::default());
    let config = AppConfig {
        api_key: Some("test-key".into()),
        ..AppConfig::default()
    };
    let session = Session::with_source(db::open_in_memory().unwrap(), config, source.clone());
    (session, source)
}

#[test]
fn fetch_maps_records_into_snapshots() {
    let (mut session, source) = session();
    source.serve(Some(vec![
        rec("USD", Some("US Dollar"), Some("1,349.50")),
        rec("JPY(100)", Some("Japanese Yen"), Some("912.34")),
        rec("XAU", None, Some("n/a")),
    ]));

    let saved = session.fetch_rates_for(d(2025, 3, 3)).unwrap();
    assert_eq!(saved, 3);
    assert_eq!(
        source.calls.lock().unwrap().as_slice(),
        &[(DataType::ExchangeRate, d(2025, 3, 3))]
    );

    let rates = session.fetch_stored_rates().unwrap();
    assert_eq!(rates.len(), 3);
    let usd = rates.iter().find(|r| r.currency_code == "USD").unwrap();
    assert_eq!(usd.currency_name, "US Dollar");
    assert_eq!(usd.base_rate, Decimal::new(134950, 2));
    assert_eq!(usd.snapshot_date, d(2025, 3, 3));
    let xau = rates.iter().find(|r| r.currency_code == "XAU").unwrap();
    assert_eq!(xau.base_rate, Decimal::ONE);
    assert_eq!(xau.currency_name, "XAU");
}

#[test]
fn records_without_unit_are_skipped() {
    let (mut session, source) = session();
    source.serve(Some(vec![
        RateRecord {
            result: Some(1),
            deal_bas_r: Some("10".into()),
            ..Default::default()
        },
        rec("EUR", Some("Euro"), None),
    ]));
    assert_eq!(session.fetch_rates_for(d(2025, 3, 3)).unwrap(), 1);
    let eur = &session.fetch_stored_rates().unwrap()[0];
    assert_eq!(eur.currency_code, "EUR");
    assert_eq!(eur.base_rate, Decimal::ONE);
}

#[test]
fn same_day_fetches_do_not_accumulate() {
    let (mut session, source) = session();
    source.serve(Some(vec![rec("USD", Some("US Dollar"), Some("1,349.50"))]));
    session.fetch_rates_for(d(2025, 3, 3)).unwrap();
    source.serve(Some(vec![rec("USD", Some("US Dollar"), Some("1,351.00"))]));
    session.fetch_rates_for(d(2025, 3, 3)).unwrap();

    let rates = session.fetch_stored_rates().unwrap();
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].base_rate, Decimal::new(135100, 2));
}

#[test]
fn provider_error_leaves_stored_rates_untouched() {
    let (mut session, source) = session();
    source.serve(Some(vec![rec("USD", Some("US Dollar"), Some("1,349.50"))]));
    session.fetch_rates_for(d(2025, 3, 3)).unwrap();
    let before = session.fetch_stored_rates().unwrap();

    source.serve(Some(vec![
        rec("USD", Some("US Dollar"), Some("9,999")),
        RateRecord {
            result: Some(4),
            ..Default::default()
        },
    ]));
    match session.fetch_rates_for(d(2025, 3, 3)) {
        Err(SessionError::Provider(code)) => assert_eq!(code, ResultCode::QuotaExceeded),
        other => panic!("expected provider error, got {:?}", other),
    }
    assert_eq!(session.fetch_stored_rates().unwrap(), before);
}

#[test]
fn transport_failure_leaves_stored_rates_untouched() {
    let (mut session, source) = session();
    source.serve(Some(vec![rec("EUR", Some("Euro"), Some("1,450"))]));
    session.fetch_rates_for(d(2025, 3, 3)).unwrap();
    let before = session.fetch_stored_rates().unwrap();

    source.serve(None);
    assert!(matches!(
        session.fetch_rates_for(d(2025, 3, 4)),
        Err(SessionError::Client(ClientError::Decode(_)))
    ));
    assert_eq!(session.fetch_stored_rates().unwrap(), before);
}

#[test]
fn empty_day_stores_nothing() {
    let (mut session, source) = session();
    source.serve(Some(Vec::new()));
    assert_eq!(session.fetch_rates_for(d(2025, 3, 1)).unwrap(), 0);
    assert!(session.fetch_stored_rates().unwrap().is_empty());
}

#[test]
fn session_without_api_key_refuses_to_fetch() {
    let mut session = Session::open(db::open_in_memory().unwrap(), AppConfig::default());
    assert!(matches!(
        session.fetch_rates_for(d(2025, 3, 3)),
        Err(SessionError::Client(ClientError::MissingApiKey))
    ));
    assert!(session.spawn_rate_fetch(d(2025, 3, 3)).is_err());
    assert!(session.fetch_stored_rates().unwrap().is_empty());
}

#[test]
fn background_fetch_then_store() {
    let (mut session, source) = session();
    source.serve(Some(vec![rec("USD", Some("US Dollar"), Some("1,300"))]));
    let handle = session.spawn_rate_fetch(d(2025, 3, 5)).unwrap();
    let records = handle.join().unwrap().unwrap();
    assert_eq!(session.store_rates(d(2025, 3, 5), &records).unwrap(), 1);
    let stored =
        CurrencyRate::fetch(session.conn(), Some(&RateFilter::Date(d(2025, 3, 5)))).unwrap();
    assert_eq!(stored.len(), 1);
}

#[test]
fn latest_rates_keep_newest_per_code() {
    let (mut session, source) = session();
    source.serve(Some(vec![
        rec("USD", Some("US Dollar"), Some("1,300")),
        rec("EUR", Some("Euro"), Some("1,400")),
    ]));
    session.fetch_rates_for(d(2025, 3, 3)).unwrap();
    source.serve(Some(vec![rec("USD", Some("US Dollar"), Some("1,310"))]));
    session.fetch_rates_for(d(2025, 3, 4)).unwrap();

    let latest = session.latest_rates().unwrap();
    let view: Vec<_> = latest
        .iter()
        .map(|r| (r.currency_code.as_str(), r.snapshot_date, r.base_rate))
        .collect();
    assert_eq!(
        view,
        vec![
            ("EUR", d(2025, 3, 3), Decimal::new(1400, 0)),
            ("USD", d(2025, 3, 4), Decimal::new(1310, 0)),
        ]
    );
}
