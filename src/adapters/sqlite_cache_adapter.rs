//! SQLite read-through cache for price history.
//!
//! Wraps any [`MarketDataPort`] and stores fetched series per (ticker,
//! lookback). Cache failures degrade to a live fetch; they never fail the
//! request.

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::error::FinboardError;
use crate::domain::period::Lookback;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::MarketDataPort;

pub struct SqliteCacheAdapter<P> {
    inner: P,
    pool: Pool<SqliteConnectionManager>,
    ttl_hours: i64,
}

fn cache_err(e: impl std::fmt::Display) -> FinboardError {
    FinboardError::Cache {
        reason: e.to_string(),
    }
}

impl<P: MarketDataPort> SqliteCacheAdapter<P> {
    pub fn new(inner: P, db_path: &str, ttl_hours: i64) -> Result<Self, FinboardError> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(cache_err)?;
        let adapter = Self {
            inner,
            pool,
            ttl_hours,
        };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory(inner: P, ttl_hours: i64) -> Result<Self, FinboardError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(cache_err)?;
        let adapter = Self {
            inner,
            pool,
            ttl_hours,
        };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn initialize_schema(&self) -> Result<(), FinboardError> {
        let conn = self.pool.get().map_err(cache_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS price_bars (
                ticker TEXT NOT NULL,
                lookback TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                adj_close REAL NOT NULL,
                dividend REAL NOT NULL,
                PRIMARY KEY (ticker, lookback, date)
            );
            CREATE TABLE IF NOT EXISTS fetch_log (
                ticker TEXT NOT NULL,
                lookback TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (ticker, lookback)
            );",
        )
        .map_err(cache_err)?;
        Ok(())
    }

    fn cached_bars(
        &self,
        ticker: &str,
        lookback: &str,
    ) -> Result<Option<Vec<PriceBar>>, FinboardError> {
        let conn = self.pool.get().map_err(cache_err)?;

        let fetched_at: Option<String> = conn
            .query_row(
                "SELECT fetched_at FROM fetch_log WHERE ticker = ?1 AND lookback = ?2",
                params![ticker, lookback],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(cache_err(other)),
            })?;

        let Some(fetched_at) = fetched_at else {
            return Ok(None);
        };
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .map_err(cache_err)?
            .with_timezone(&Utc);
        if Utc::now().signed_duration_since(fetched_at).num_hours() >= self.ttl_hours {
            return Ok(None);
        }

        let mut stmt = conn
            .prepare(
                "SELECT date, close, adj_close, dividend FROM price_bars
                 WHERE ticker = ?1 AND lookback = ?2 ORDER BY date ASC",
            )
            .map_err(cache_err)?;
        let rows = stmt
            .query_map(params![ticker, lookback], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })
            .map_err(cache_err)?;

        let mut bars = Vec::new();
        for row in rows {
            let (date, close, adjusted_close, dividend) = row.map_err(cache_err)?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(cache_err)?;
            bars.push(PriceBar {
                date,
                close,
                adjusted_close,
                dividend,
            });
        }

        Ok(Some(bars))
    }

    fn store_bars(
        &self,
        ticker: &str,
        lookback: &str,
        bars: &[PriceBar],
    ) -> Result<(), FinboardError> {
        let mut conn = self.pool.get().map_err(cache_err)?;
        let tx = conn.transaction().map_err(cache_err)?;

        tx.execute(
            "DELETE FROM price_bars WHERE ticker = ?1 AND lookback = ?2",
            params![ticker, lookback],
        )
        .map_err(cache_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO price_bars (ticker, lookback, date, close, adj_close, dividend)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    ticker,
                    lookback,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.close,
                    bar.adjusted_close,
                    bar.dividend
                ],
            )
            .map_err(cache_err)?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO fetch_log (ticker, lookback, fetched_at)
             VALUES (?1, ?2, ?3)",
            params![ticker, lookback, Utc::now().to_rfc3339()],
        )
        .map_err(cache_err)?;

        tx.commit().map_err(cache_err)?;
        Ok(())
    }
}

impl<P: MarketDataPort> MarketDataPort for SqliteCacheAdapter<P> {
    fn fetch_history(
        &self,
        ticker: &str,
        lookback: Lookback,
    ) -> Result<Vec<PriceBar>, FinboardError> {
        let ticker_key = ticker.to_uppercase();
        let lookback_key = lookback.to_string();

        match self.cached_bars(&ticker_key, &lookback_key) {
            Ok(Some(bars)) => {
                log::debug!("cache hit for {} ({})", ticker_key, lookback_key);
                return Ok(bars);
            }
            Ok(None) => {}
            Err(e) => log::warn!("cache read failed for {}: {}", ticker_key, e),
        }

        let bars = self.inner.fetch_history(ticker, lookback)?;
        if let Err(e) = self.store_bars(&ticker_key, &lookback_key, &bars) {
            log::warn!("cache write failed for {}: {}", ticker_key, e);
        }
        Ok(bars)
    }
}
