// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Client for the daily exchange-rate API.
//!
//! One GET per day returns a JSON array of per-currency records. Providers
//! omit fields freely, so every field decodes to `Option` and nothing is
//! defaulted here; [`parse_base_rate`] applies the arithmetic fallback at
//! persistence time.

use crate::config::AppConfig;
use crate::utils::http_client;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No API key configured (set api_key in config.json or TRIPLOG_API_KEY)")]
    MissingApiKey,

    #[error("Rate request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed rate response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Provider data-type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    ExchangeRate,
    LoanRate,
    InternationalRate,
}

impl DataType {
    pub fn code(self) -> &'static str {
        match self {
            DataType::ExchangeRate => "AP01",
            DataType::LoanRate => "AP02",
            DataType::InternationalRate => "AP03",
        }
    }
}

/// Provider status carried in each record's `result` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    UnknownDataCode,
    BadAuthKey,
    QuotaExceeded,
    Other(i64),
}

impl From<i64> for ResultCode {
    fn from(v: i64) -> Self {
        match v {
            1 => ResultCode::Success,
            2 => ResultCode::UnknownDataCode,
            3 => ResultCode::BadAuthKey,
            4 => ResultCode::QuotaExceeded,
            n => ResultCode::Other(n),
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultCode::Success => write!(f, "success"),
            ResultCode::UnknownDataCode => write!(f, "unknown data code"),
            ResultCode::BadAuthKey => write!(f, "invalid authentication key"),
            ResultCode::QuotaExceeded => write!(f, "daily request quota exceeded"),
            ResultCode::Other(n) => write!(f, "result code {}", n),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub result: Option<i64>,
    pub cur_unit: Option<String>,
    pub cur_nm: Option<String>,
    pub deal_bas_r: Option<String>,
    pub ttb: Option<String>,
    pub tts: Option<String>,
    pub bkpr: Option<String>,
    pub yy_efee_r: Option<String>,
    pub ten_dd_efee_r: Option<String>,
    pub kftc_bkpr: Option<String>,
    pub kftc_deal_bas_r: Option<String>,
}

impl RateRecord {
    pub fn result_code(&self) -> Option<ResultCode> {
        self.result.map(ResultCode::from)
    }
}

/// Decodes a provider response body, preserving record order.
pub fn decode_rates(body: &str) -> Result<Vec<RateRecord>, ClientError> {
    Ok(serde_json::from_str(body)?)
}

/// Base rate for persistence: grouping separators are stripped, and an
/// absent or unparseable value becomes exactly 1.
pub fn parse_base_rate(raw: Option<&str>) -> Decimal {
    raw.map(|s| {
        s.chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect::<String>()
    })
    .and_then(|s| s.parse::<Decimal>().ok())
    .unwrap_or(Decimal::ONE)
}

/// Anything that can produce a day's rate records.
pub trait RateSource {
    fn fetch_rates(
        &self,
        data_type: DataType,
        date: NaiveDate,
    ) -> Result<Vec<RateRecord>, ClientError>;
}

pub struct RateClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl RateClient {
    pub fn new(config: &AppConfig) -> Result<Self, ClientError> {
        let api_key = config.api_key().ok_or(ClientError::MissingApiKey)?;
        Ok(RateClient {
            http: http_client()?,
            base_url: config.base_url.clone(),
            api_key: api_key.to_string(),
        })
    }

    /// One request, no retry. Provider error codes come back as records.
    pub fn fetch(
        &self,
        data_type: DataType,
        date: NaiveDate,
    ) -> Result<Vec<RateRecord>, ClientError> {
        let search_date = date.format("%Y%m%d").to_string();
        debug!(url = %self.base_url, %search_date, data = data_type.code(), "requesting rates");
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("authkey", self.api_key.as_str()),
                ("searchdate", search_date.as_str()),
                ("data", data_type.code()),
            ])
            .send()?
            .error_for_status()?;
        let body = resp.text()?;
        let records = decode_rates(&body)?;
        info!(count = records.len(), %search_date, "rate records received");
        Ok(records)
    }
}

impl RateSource for RateClient {
    fn fetch_rates(
        &self,
        data_type: DataType,
        date: NaiveDate,
    ) -> Result<Vec<RateRecord>, ClientError> {
        self.fetch(data_type, date)
    }
}

/// Runs a fetch on a worker thread; join the handle for the outcome.
pub fn spawn_fetch<S>(
    source: Arc<S>,
    data_type: DataType,
    date: NaiveDate,
) -> JoinHandle<Result<Vec<RateRecord>, ClientError>>
where
    S: RateSource + Send + Sync + ?Sized + 'static,
{
    std::thread::spawn(move || source.fetch_rates(data_type, date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes_map_to_variants() {
        assert_eq!(ResultCode::from(1), ResultCode::Success);
        assert_eq!(ResultCode::from(3), ResultCode::BadAuthKey);
        assert_eq!(ResultCode::from(4), ResultCode::QuotaExceeded);
        assert_eq!(ResultCode::from(9), ResultCode::Other(9));
    }

    #[test]
    fn client_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            RateClient::new(&config),
            Err(ClientError::MissingApiKey)
        ));
    }
}
