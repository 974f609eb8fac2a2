use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::DbPool;
use crate::error::Result;
use crate::models::DailyMetric;

/// One countable event stream in the daily ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    ZonesScraped,
    BusinessesScraped,
    LeadsQualified,
    EmailsSent,
    ResponsesReceived,
    Conversions,
}

impl Counter {
    /// Column name in `daily_metrics`. Static strings only; these are
    /// interpolated into SQL.
    pub fn column(self) -> &'static str {
        match self {
            Counter::ZonesScraped => "zones_scraped",
            Counter::BusinessesScraped => "businesses_scraped",
            Counter::LeadsQualified => "leads_qualified",
            Counter::EmailsSent => "emails_sent",
            Counter::ResponsesReceived => "responses_received",
            Counter::Conversions => "conversions",
        }
    }
}

/// Per-day additive counters. Every write is an upsert that adds to the
/// existing value, never an overwrite.
#[derive(Clone)]
pub struct MetricsLedger {
    pool: DbPool,
}

pub fn today_key() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

impl MetricsLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn add(&self, counter: Counter, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let conn = self.pool.get().await?;
        let column = counter.column();
        let sql = format!(
            "INSERT INTO daily_metrics (date, {column}, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(date) DO UPDATE SET {column} = {column} + excluded.{column}"
        );
        conn.execute(&sql, params![today_key(), delta, Utc::now().to_rfc3339()])?;
        debug!("Metrics: {} += {}", column, delta);
        Ok(())
    }

    /// Applies a scrape batch's counters as one atomic upsert, so an aborted
    /// batch can never leave a partial count behind.
    pub async fn record_scrape_batch(&self, processed: i64, qualified: i64) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute(
            r#"
            INSERT INTO daily_metrics (date, businesses_scraped, leads_qualified, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(date) DO UPDATE SET
                businesses_scraped = businesses_scraped + excluded.businesses_scraped,
                leads_qualified = leads_qualified + excluded.leads_qualified
            "#,
            params![today_key(), processed, qualified, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub async fn today(&self) -> Result<DailyMetric> {
        self.for_date(&today_key()).await
    }

    pub async fn for_date(&self, date: &str) -> Result<DailyMetric> {
        let conn = self.pool.get().await?;
        let metric = conn
            .query_row(
                "SELECT date, zones_scraped, businesses_scraped, leads_qualified, \
                        emails_sent, responses_received, conversions \
                 FROM daily_metrics WHERE date = ?1",
                [date],
                metric_from_row,
            )
            .optional()?;

        Ok(metric.unwrap_or_else(|| DailyMetric {
            date: date.to_string(),
            ..DailyMetric::default()
        }))
    }

    /// Daily stats surface for dashboards: most recent first.
    pub async fn range(&self, start: &str, end: &str) -> Result<Vec<DailyMetric>> {
        let conn = self.pool.get().await?;
        let mut stmt = conn.prepare(
            "SELECT date, zones_scraped, businesses_scraped, leads_qualified, \
                    emails_sent, responses_received, conversions \
             FROM daily_metrics WHERE date BETWEEN ?1 AND ?2 ORDER BY date DESC",
        )?;
        let rows = stmt.query_map(params![start, end], metric_from_row)?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?);
        }
        Ok(metrics)
    }
}

fn metric_from_row(row: &Row<'_>) -> rusqlite::Result<DailyMetric> {
    Ok(DailyMetric {
        date: row.get(0)?,
        zones_scraped: row.get(1)?,
        businesses_scraped: row.get(2)?,
        leads_qualified: row.get(3)?,
        emails_sent: row.get(4)?,
        responses_received: row.get(5)?,
        conversions: row.get(6)?,
    })
}
