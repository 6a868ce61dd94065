// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The persistence session: one per process, passed by reference to every
//! command. Owns the database connection and the rate source.

use crate::config::AppConfig;
use crate::models::CurrencyRate;
use crate::rates::{
    ClientError, DataType, RateClient, RateRecord, RateSource, ResultCode, parse_base_rate,
    spawn_fetch,
};
use crate::store::{Entity, StoreError, UnitOfWork};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Rate provider refused the request: {0}")]
    Provider(ResultCode),
}

pub type SharedRateSource = Arc<dyn RateSource + Send + Sync>;

pub struct Session {
    conn: Connection,
    config: AppConfig,
    source: Option<SharedRateSource>,
}

impl Session {
    /// Builds the session with the HTTP rate client. Without an API key the
    /// session still opens; only rate fetches fail.
    pub fn open(conn: Connection, config: AppConfig) -> Self {
        let source = match RateClient::new(&config) {
            Ok(client) => Some(Arc::new(client) as SharedRateSource),
            Err(e) => {
                debug!(error = %e, "rate client unavailable");
                None
            }
        };
        Session {
            conn,
            config,
            source,
        }
    }

    pub fn with_source(conn: Connection, config: AppConfig, source: SharedRateSource) -> Self {
        Session {
            conn,
            config,
            source: Some(source),
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn home_currency(&self) -> &str {
        &self.config.home_currency
    }

    /// Starts a unit of work; nothing it stages is durable until `commit`.
    pub fn unit_of_work(&mut self) -> Result<UnitOfWork<'_>, StoreError> {
        Ok(self.conn.transaction()?)
    }

    fn source(&self) -> Result<SharedRateSource, ClientError> {
        self.source.clone().ok_or(ClientError::MissingApiKey)
    }

    pub fn fetch_current_rates(&mut self) -> Result<usize, SessionError> {
        self.fetch_rates_for(Local::now().date_naive())
    }

    /// Fetches `date`'s rates and upserts them. On any failure the stored
    /// rates are left exactly as they were.
    pub fn fetch_rates_for(&mut self, date: NaiveDate) -> Result<usize, SessionError> {
        let records = match self
            .source()
            .and_then(|s| s.fetch_rates(DataType::ExchangeRate, date))
        {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, %date, "rate fetch failed; stored rates unchanged");
                return Err(e.into());
            }
        };
        self.store_rates(date, &records)
    }

    /// Starts the network half of a fetch on a worker thread. Hand the joined
    /// records to [`Session::store_rates`].
    pub fn spawn_rate_fetch(
        &self,
        date: NaiveDate,
    ) -> Result<JoinHandle<Result<Vec<RateRecord>, ClientError>>, ClientError> {
        Ok(spawn_fetch(self.source()?, DataType::ExchangeRate, date))
    }

    /// Persists one day's records in a single unit of work.
    ///
    /// Any non-success result code rejects the whole batch. Records without a
    /// unit code are skipped. Returns the number of snapshots written.
    pub fn store_rates(
        &mut self,
        date: NaiveDate,
        records: &[RateRecord],
    ) -> Result<usize, SessionError> {
        if let Some(code) = records
            .iter()
            .filter_map(RateRecord::result_code)
            .find(|c| *c != ResultCode::Success)
        {
            warn!(%code, %date, "provider reported an error; stored rates unchanged");
            return Err(SessionError::Provider(code));
        }
        if records.is_empty() {
            info!(%date, "no rates published for this day");
            return Ok(0);
        }

        let uow = self.unit_of_work()?;
        let mut saved = 0usize;
        for r in records {
            let Some(unit) = r
                .cur_unit
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
            else {
                debug!(?r, "skipping record without unit code");
                continue;
            };
            let unit = unit.to_uppercase();
            let name = r
                .cur_nm
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(unit.as_str())
                .to_string();
            let base_rate = parse_base_rate(r.deal_bas_r.as_deref());
            let rate = CurrencyRate::new(unit.as_str(), name, base_rate, date);
            if let Err(e) = rate.upsert(&uow) {
                warn!(error = %e, %date, "rate upsert failed; rolling back");
                return Err(e.into());
            }
            saved += 1;
        }
        uow.commit().map_err(StoreError::from)?;
        info!(saved, %date, "rates stored");
        Ok(saved)
    }

    /// Every stored snapshot, newest first. May be empty or stale.
    pub fn fetch_stored_rates(&self) -> Result<Vec<CurrencyRate>, StoreError> {
        CurrencyRate::fetch(&self.conn, None)
    }

    /// The newest snapshot per currency code.
    pub fn latest_rates(&self) -> Result<Vec<CurrencyRate>, StoreError> {
        let mut seen = HashSet::new();
        let mut out: Vec<CurrencyRate> = self
            .fetch_stored_rates()?
            .into_iter()
            .filter(|r| seen.insert(r.currency_code.clone()))
            .collect();
        out.sort_by(|a, b| a.currency_code.cmp(&b.currency_code));
        Ok(out)
    }
}
