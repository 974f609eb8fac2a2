use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::database::DbPool;
use crate::error::Result;
use crate::models::{Zone, ZoneStatus};

use super::partitioner::ZoneSpec;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ZoneStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub total_businesses: i64,
}

/// Persisted grid of zones. All zone mutation goes through these
/// operations; each is a single SQL statement.
#[derive(Clone)]
pub struct ZoneStore {
    pool: DbPool,
}

impl ZoneStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts each zone if absent by name. Safe to call repeatedly: zones
    /// that already exist are skipped, so in-flight work survives re-seeding.
    pub async fn seed(&self, zones: &[ZoneSpec]) -> Result<SeedReport> {
        let conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        let mut inserted = 0;
        let mut skipped = 0;
        for zone in zones {
            let changes = conn.execute(
                r#"
                INSERT OR IGNORE INTO zones
                    (name, lat_min, lat_max, lon_min, lon_max, center_lat, center_lon, status, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8)
                "#,
                params![
                    zone.name,
                    zone.lat_min,
                    zone.lat_max,
                    zone.lon_min,
                    zone.lon_max,
                    zone.center_lat,
                    zone.center_lon,
                    now,
                ],
            )?;
            if changes > 0 {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }

        info!(
            "Zone seeding complete. Inserted: {}, skipped (existed): {}",
            inserted, skipped
        );
        Ok(SeedReport {
            inserted,
            skipped,
            total: zones.len(),
        })
    }

    /// The pending zone least recently worked, never-worked zones first,
    /// insertion order as the tie-break. SQLite sorts NULLs first in ASC.
    pub async fn next_pending(&self) -> Result<Option<Zone>> {
        let conn = self.pool.get().await?;
        let zone = conn
            .query_row(
                "SELECT id, name, lat_min, lat_max, lon_min, lon_max, center_lat, center_lon, \
                        status, last_worked_at, businesses_found \
                 FROM zones WHERE status = 'pending' \
                 ORDER BY last_worked_at ASC, id ASC LIMIT 1",
                [],
                zone_from_row,
            )
            .optional()?;
        Ok(zone)
    }

    pub async fn get(&self, zone_id: i64) -> Result<Option<Zone>> {
        let conn = self.pool.get().await?;
        let zone = conn
            .query_row(
                "SELECT id, name, lat_min, lat_max, lon_min, lon_max, center_lat, center_lon, \
                        status, last_worked_at, businesses_found \
                 FROM zones WHERE id = ?1",
                [zone_id],
                zone_from_row,
            )
            .optional()?;
        Ok(zone)
    }

    /// Conditional claim: pending -> in_progress only if the zone is still
    /// pending, so two racing schedulers cannot both take it. Returns
    /// whether this caller won the claim.
    pub async fn claim(&self, zone_id: i64) -> Result<bool> {
        let conn = self.pool.get().await?;
        let changes = conn.execute(
            "UPDATE zones SET status = 'in_progress' WHERE id = ?1 AND status = 'pending'",
            [zone_id],
        )?;
        Ok(changes > 0)
    }

    /// in_progress -> completed, stamping the work time and adding to the
    /// monotone businesses_found counter.
    pub async fn complete(&self, zone_id: i64, new_business_count: i64) -> Result<bool> {
        let conn = self.pool.get().await?;
        let changes = conn.execute(
            "UPDATE zones SET status = 'completed', last_worked_at = ?1, \
                    businesses_found = businesses_found + ?2 \
             WHERE id = ?3 AND status = 'in_progress'",
            params![Utc::now().to_rfc3339(), new_business_count.max(0), zone_id],
        )?;
        if changes > 0 {
            debug!(
                "Zone {} completed with {} new businesses",
                zone_id, new_business_count
            );
        }
        Ok(changes > 0)
    }

    /// Bulk completed -> pending for a fresh coverage cycle. Zones still
    /// in_progress are untouched.
    pub async fn reset_cycle(&self) -> Result<usize> {
        let conn = self.pool.get().await?;
        let changes = conn.execute(
            "UPDATE zones SET status = 'pending' WHERE status = 'completed'",
            [],
        )?;
        info!("Reset {} completed zones to pending", changes);
        Ok(changes)
    }

    pub async fn stats(&self) -> Result<ZoneStats> {
        let conn = self.pool.get().await?;
        let stats = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(businesses_found), 0)
            FROM zones
            "#,
            [],
            |row| {
                Ok(ZoneStats {
                    total: row.get(0)?,
                    pending: row.get(1)?,
                    in_progress: row.get(2)?,
                    completed: row.get(3)?,
                    total_businesses: row.get(4)?,
                })
            },
        )?;
        Ok(stats)
    }

    pub async fn is_ready(&self) -> Result<bool> {
        Ok(self.stats().await?.total > 0)
    }
}

fn zone_from_row(row: &Row<'_>) -> rusqlite::Result<Zone> {
    let status_str: String = row.get(8)?;
    let status = ZoneStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(8, status_str.clone(), rusqlite::types::Type::Text)
    })?;

    let last_worked_str: Option<String> = row.get(9)?;
    let last_worked_at = last_worked_str.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    });

    Ok(Zone {
        id: row.get(0)?,
        name: row.get(1)?,
        lat_min: row.get(2)?,
        lat_max: row.get(3)?,
        lon_min: row.get(4)?,
        lon_max: row.get(5)?,
        center_lat: row.get(6)?,
        center_lon: row.get(7)?,
        status,
        last_worked_at,
        businesses_found: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;
    use crate::database::test_pool;
    use crate::zones::partitioner::generate_grid;

    async fn seeded_store(grid: usize) -> ZoneStore {
        let store = ZoneStore::new(test_pool().await);
        let bounds = Bounds {
            north: 30.45,
            south: 30.15,
            east: -97.65,
            west: -97.75,
        };
        let zones = generate_grid(&bounds, grid).unwrap();
        store.seed(&zones).await.unwrap();
        store
    }

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let store = ZoneStore::new(test_pool().await);
        let bounds = Bounds {
            north: 30.45,
            south: 30.15,
            east: -97.65,
            west: -97.75,
        };
        let zones = generate_grid(&bounds, 3).unwrap();

        let first = store.seed(&zones).await.unwrap();
        assert_eq!(first.inserted, 9);
        assert_eq!(first.skipped, 0);

        let second = store.seed(&zones).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 9);
        assert_eq!(store.stats().await.unwrap().total, 9);
    }

    #[tokio::test]
    async fn claim_is_conditional_on_pending() {
        let store = seeded_store(2).await;
        let zone = store.next_pending().await.unwrap().unwrap();

        assert!(store.claim(zone.id).await.unwrap());
        // A second claimant loses the race.
        assert!(!store.claim(zone.id).await.unwrap());

        let claimed = store.get(zone.id).await.unwrap().unwrap();
        assert_eq!(claimed.status, ZoneStatus::InProgress);
    }

    #[tokio::test]
    async fn next_pending_skips_claimed_and_completed_zones() {
        let store = seeded_store(2).await;

        let first = store.next_pending().await.unwrap().unwrap();
        store.claim(first.id).await.unwrap();

        let second = store.next_pending().await.unwrap().unwrap();
        assert_ne!(second.id, first.id);

        store.claim(second.id).await.unwrap();
        store.complete(second.id, 5).await.unwrap();

        let third = store.next_pending().await.unwrap().unwrap();
        assert_ne!(third.id, first.id);
        assert_ne!(third.id, second.id);
    }

    #[tokio::test]
    async fn complete_is_additive_and_requires_in_progress() {
        let store = seeded_store(1).await;
        let zone = store.next_pending().await.unwrap().unwrap();

        // Completing a zone that was never claimed is a no-op.
        assert!(!store.complete(zone.id, 10).await.unwrap());

        store.claim(zone.id).await.unwrap();
        assert!(store.complete(zone.id, 10).await.unwrap());

        store.reset_cycle().await.unwrap();
        store.claim(zone.id).await.unwrap();
        store.complete(zone.id, 7).await.unwrap();

        let done = store.get(zone.id).await.unwrap().unwrap();
        assert_eq!(done.businesses_found, 17);
        assert!(done.last_worked_at.is_some());
    }

    #[tokio::test]
    async fn reset_cycle_leaves_in_progress_untouched() {
        let store = seeded_store(2).await;

        let a = store.next_pending().await.unwrap().unwrap();
        store.claim(a.id).await.unwrap();
        store.complete(a.id, 1).await.unwrap();

        let b = store.next_pending().await.unwrap().unwrap();
        store.claim(b.id).await.unwrap();

        let reset = store.reset_cycle().await.unwrap();
        assert_eq!(reset, 1);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.pending, 3);

        let stuck = store.get(b.id).await.unwrap().unwrap();
        assert_eq!(stuck.status, ZoneStatus::InProgress);
    }

    #[tokio::test]
    async fn never_worked_zones_come_before_recently_worked() {
        let store = seeded_store(2).await;

        // Work the first zone through a full cycle so it has a timestamp.
        let first = store.next_pending().await.unwrap().unwrap();
        store.claim(first.id).await.unwrap();
        store.complete(first.id, 0).await.unwrap();
        store.reset_cycle().await.unwrap();

        // Remaining never-worked zones must sort ahead of it.
        let next = store.next_pending().await.unwrap().unwrap();
        assert_ne!(next.id, first.id);
        assert!(next.last_worked_at.is_none());
    }

    #[tokio::test]
    async fn stats_aggregate_business_totals() {
        let store = seeded_store(2).await;
        assert!(store.is_ready().await.unwrap());

        let zone = store.next_pending().await.unwrap().unwrap();
        store.claim(zone.id).await.unwrap();
        store.complete(zone.id, 12).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total_businesses, 12);
    }
}
