use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;

use crate::database::DbPool;
use crate::error::Result;
use crate::models::{Lead, LeadStatus, OutreachEvent, OutreachKind};

/// A qualified record ready for at-most-once insertion.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub category: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub has_website: bool,
    pub rating: Option<f64>,
    pub review_count: i64,
    pub priority_score: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LeadStats {
    pub total: i64,
    pub without_website: i64,
    pub new_leads: i64,
    pub contacted: i64,
    pub converted: i64,
}

/// Lead persistence plus the outreach log and suppression list. Leads are
/// deduplicated on (name, address) and never deleted.
#[derive(Clone)]
pub struct LeadStore {
    pool: DbPool,
}

const LEAD_COLUMNS: &str = "id, name, category, address, phone, email, has_website, rating, \
                            review_count, priority_score, status, last_contacted_at, created_at";

impl LeadStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts keyed by (name, address); an existing key is an expected
    /// no-op, not an error. Returns whether a new row was created.
    pub async fn insert_if_absent(&self, lead: &NewLead) -> Result<bool> {
        let conn = self.pool.get().await?;
        let changes = conn.execute(
            r#"
            INSERT OR IGNORE INTO leads
                (name, category, address, phone, email, has_website, rating,
                 review_count, priority_score, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'new', ?10)
            "#,
            params![
                lead.name,
                lead.category,
                lead.address,
                lead.phone,
                lead.email,
                lead.has_website as i64,
                lead.rating,
                lead.review_count,
                lead.priority_score,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(changes > 0)
    }

    pub async fn get(&self, lead_id: i64) -> Result<Option<Lead>> {
        let conn = self.pool.get().await?;
        let lead = conn
            .query_row(
                &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"),
                [lead_id],
                lead_from_row,
            )
            .optional()?;
        Ok(lead)
    }

    /// Fresh leads eligible for an initial message: no website, still new,
    /// not suppressed. Highest value first, oldest first on ties.
    pub async fn qualified_leads(&self, limit: usize) -> Result<Vec<Lead>> {
        let conn = self.pool.get().await?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads \
             WHERE has_website = 0 AND status = 'new' \
               AND id NOT IN (SELECT lead_id FROM unsubscribes) \
             ORDER BY priority_score DESC, created_at ASC LIMIT ?1"
        ))?;
        let rows = stmt.query_map([limit as i64], lead_from_row)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    /// Contacted leads whose last touch is at least `days_since_contact` old
    /// and whose outreach log holds exactly `prior_events` entries. The
    /// event-count predicate is what gates followup2 behind followup1.
    pub async fn follow_up_candidates(
        &self,
        days_since_contact: i64,
        prior_events: i64,
    ) -> Result<Vec<Lead>> {
        let conn = self.pool.get().await?;
        let cutoff = (Utc::now() - Duration::days(days_since_contact)).to_rfc3339();

        let mut stmt = conn.prepare(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads \
             WHERE status = 'contacted' AND has_website = 0 \
               AND id NOT IN (SELECT lead_id FROM unsubscribes) \
               AND last_contacted_at IS NOT NULL AND last_contacted_at <= ?1 \
               AND (SELECT COUNT(*) FROM outreach_events WHERE lead_id = leads.id) = ?2 \
             ORDER BY priority_score DESC, created_at ASC"
        ))?;
        let rows = stmt.query_map(params![cutoff, prior_events], lead_from_row)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    pub async fn mark_contacted(&self, lead_id: i64) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute(
            "UPDATE leads SET status = 'contacted', last_contacted_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), lead_id],
        )?;
        Ok(())
    }

    /// Exposed mutation; the converted transition is driven by an external
    /// signal, never automatically.
    pub async fn set_status(&self, lead_id: i64, status: LeadStatus) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute(
            "UPDATE leads SET status = ?1 WHERE id = ?2",
            params![status.as_str(), lead_id],
        )?;
        debug!("Lead {} status set to {}", lead_id, status.as_str());
        Ok(())
    }

    /// Appends to the immutable outreach log. The (lead, kind) pair is
    /// unique, so a duplicate append is ignored and reported as `false`.
    pub async fn record_outreach(
        &self,
        lead_id: i64,
        kind: OutreachKind,
        subject: &str,
    ) -> Result<bool> {
        let conn = self.pool.get().await?;
        let changes = conn.execute(
            "INSERT OR IGNORE INTO outreach_events (lead_id, kind, subject, sent_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![lead_id, kind.as_str(), subject, Utc::now().to_rfc3339()],
        )?;
        Ok(changes > 0)
    }

    pub async fn outreach_history(&self, lead_id: i64) -> Result<Vec<OutreachEvent>> {
        let conn = self.pool.get().await?;
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, kind, subject, sent_at FROM outreach_events \
             WHERE lead_id = ?1 ORDER BY sent_at DESC",
        )?;
        let rows = stmt.query_map([lead_id], |row| {
            let kind_str: String = row.get(2)?;
            let kind = OutreachKind::parse(&kind_str).map_err(|_| {
                rusqlite::Error::InvalidColumnType(2, kind_str.clone(), rusqlite::types::Type::Text)
            })?;
            let sent_at_str: String = row.get(4)?;
            let sent_at = parse_rfc3339(&sent_at_str, 4)?;
            Ok(OutreachEvent {
                id: row.get(0)?,
                lead_id: row.get(1)?,
                kind,
                subject: row.get(3)?,
                sent_at,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Permanent suppression. Idempotent on lead id.
    pub async fn add_unsubscribe(&self, lead_id: i64, email: Option<&str>) -> Result<bool> {
        let conn = self.pool.get().await?;
        let changes = conn.execute(
            "INSERT OR IGNORE INTO unsubscribes (lead_id, email, unsubscribed_at) \
             VALUES (?1, ?2, ?3)",
            params![lead_id, email, Utc::now().to_rfc3339()],
        )?;
        Ok(changes > 0)
    }

    pub async fn is_unsubscribed(&self, lead_id: i64) -> Result<bool> {
        let conn = self.pool.get().await?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM unsubscribes WHERE lead_id = ?1",
            [lead_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub async fn stats(&self) -> Result<LeadStats> {
        let conn = self.pool.get().await?;
        let stats = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN has_website = 0 THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'new' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'contacted' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'converted' THEN 1 ELSE 0 END), 0)
            FROM leads
            "#,
            [],
            |row| {
                Ok(LeadStats {
                    total: row.get(0)?,
                    without_website: row.get(1)?,
                    new_leads: row.get(2)?,
                    contacted: row.get(3)?,
                    converted: row.get(4)?,
                })
            },
        )?;
        Ok(stats)
    }
}

fn parse_rfc3339(s: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(idx, s.to_string(), rusqlite::types::Type::Text)
        })
}

fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    let status_str: String = row.get(10)?;
    let status = LeadStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(10, status_str.clone(), rusqlite::types::Type::Text)
    })?;

    let last_contacted_str: Option<String> = row.get(11)?;
    let last_contacted_at = match last_contacted_str {
        Some(s) => Some(parse_rfc3339(&s, 11)?),
        None => None,
    };

    let created_at_str: String = row.get(12)?;
    let created_at = parse_rfc3339(&created_at_str, 12)?;

    let has_website: i64 = row.get(6)?;

    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        has_website: has_website != 0,
        rating: row.get(7)?,
        review_count: row.get(8)?,
        priority_score: row.get(9)?,
        status,
        last_contacted_at,
        created_at,
    })
}
