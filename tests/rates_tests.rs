// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use triplog::config::AppConfig;
use triplog::rates::{
    ClientError, DataType, RateClient, RateRecord, RateSource, ResultCode, decode_rates,
    parse_base_rate, spawn_fetch,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SAMPLE: &str = r#"[
  {"result":1,"cur_unit":"AED","ttb":"363.74","tts":"371.09","deal_bas_r":"367.42","bkpr":"367","yy_efee_r":"0","ten_dd_efee_r":"0","kftc_bkpr":"367","kftc_deal_bas_r":"367.42","cur_nm":"UAE Dirham"},
  {"result":1,"cur_unit":"JPY(100)","deal_bas_r":"912.34","cur_nm":"Japanese Yen"},
  {"result":1,"cur_unit":"USD","deal_bas_r":"1,349.50","ttb":null}
]"#;

#[test]
fn decode_keeps_every_record_in_order() {
    let records = decode_rates(SAMPLE).unwrap();
    assert_eq!(records.len(), 3);
    let units: Vec<_> = records.iter().map(|r| r.cur_unit.as_deref()).collect();
    assert_eq!(units, vec![Some("AED"), Some("JPY(100)"), Some("USD")]);
    assert_eq!(records[0].kftc_deal_bas_r.as_deref(), Some("367.42"));
    assert_eq!(records[0].result_code(), Some(ResultCode::Success));
}

#[test]
fn absent_and_null_fields_decode_as_none() {
    let records = decode_rates(SAMPLE).unwrap();
    let jpy = &records[1];
    assert_eq!(jpy.ttb, None);
    assert_eq!(jpy.tts, None);
    assert_eq!(jpy.bkpr, None);
    let usd = &records[2];
    assert_eq!(usd.ttb, None);
    assert_eq!(usd.cur_nm, None);

    let bare = decode_rates("[{}]").unwrap();
    assert_eq!(bare, vec![RateRecord::default()]);
    assert_eq!(bare[0].result_code(), None);
    assert!(decode_rates("[]").unwrap().is_empty());
}

#[test]
fn provider_error_codes_decode_as_records() {
    let records = decode_rates(r#"[{"result":3}]"#).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].result_code(), Some(ResultCode::BadAuthKey));
    assert_eq!(records[0].cur_unit, None);
}

#[test]
fn malformed_body_is_a_decode_error() {
    assert!(matches!(decode_rates("<html>busy</html>"), Err(ClientError::Decode(_))));
    // an object instead of an array
    assert!(matches!(decode_rates(r#"{"result":1}"#), Err(ClientError::Decode(_))));
}

#[test]
fn base_rate_strips_grouping_and_falls_back_to_one() {
    assert_eq!(parse_base_rate(Some("1,234.56")), Decimal::new(123456, 2));
    assert_eq!(parse_base_rate(Some(" 912.34 ")), Decimal::new(91234, 2));
    assert_eq!(parse_base_rate(Some("1,000,000")), Decimal::new(1000000, 0));
    assert_eq!(parse_base_rate(Some("n/a")), Decimal::ONE);
    assert_eq!(parse_base_rate(Some("")), Decimal::ONE);
    assert_eq!(parse_base_rate(None), Decimal::ONE);
}

#[test]
fn data_type_codes() {
    assert_eq!(DataType::ExchangeRate.code(), "AP01");
    assert_eq!(DataType::LoanRate.code(), "AP02");
    assert_eq!(DataType::InternationalRate.code(), "AP03");
}

struct Echo;

impl RateSource for Echo {
    fn fetch_rates(
        &self,
        data_type: DataType,
        date: NaiveDate,
    ) -> Result<Vec<RateRecord>, ClientError> {
        Ok(vec![RateRecord {
            result: Some(1),
            cur_unit: Some(data_type.code().to_string()),
            cur_nm: Some(date.format("%Y%m%d").to_string()),
            ..Default::default()
        }])
    }
}

#[test]
fn spawn_fetch_delivers_result_through_handle() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    let handle = spawn_fetch(Arc::new(Echo), DataType::ExchangeRate, date);
    let records = handle.join().unwrap().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].cur_unit.as_deref(), Some("AP01"));
    assert_eq!(records[0].cur_nm.as_deref(), Some("20250303"));
}

fn client_config(server: &MockServer) -> AppConfig {
    AppConfig {
        api_key: Some("test-key".to_string()),
        base_url: format!("{}/exchangeJSON", server.uri()),
        ..AppConfig::default()
    }
}

// The blocking client owns its own runtime, so it is built, used and
// dropped off the async test thread.
async fn fetch_blocking(
    config: AppConfig,
    date: NaiveDate,
) -> Result<Vec<RateRecord>, ClientError> {
    tokio::task::spawn_blocking(move || {
        RateClient::new(&config)?.fetch(DataType::ExchangeRate, date)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn client_sends_key_date_and_data_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exchangeJSON"))
        .and(query_param("authkey", "test-key"))
        .and(query_param("searchdate", "20250903"))
        .and(query_param("data", "AP01"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE))
        .expect(1)
        .mount(&server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
    let records = fetch_blocking(client_config(&server), date).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].cur_unit.as_deref(), Some("JPY(100)"));
    assert_eq!(records[2].deal_bas_r.as_deref(), Some("1,349.50"));
}

#[tokio::test]
async fn client_maps_server_error_to_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exchangeJSON"))
        .respond_with(ResponseTemplate::new(500).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
    let res = fetch_blocking(client_config(&server), date).await;
    assert!(matches!(res, Err(ClientError::Network(_))));
}

#[tokio::test]
async fn client_reports_non_json_body_as_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exchangeJSON"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
    let res = fetch_blocking(client_config(&server), date).await;
    assert!(matches!(res, Err(ClientError::Decode(_))));
}
