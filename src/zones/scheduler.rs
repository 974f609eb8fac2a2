use tracing::{info, warn};

use crate::error::Result;
use crate::models::Zone;

use super::store::{ZoneStats, ZoneStore};

/// Drives the per-zone state machine on top of `ZoneStore`: hands out the
/// next zone to work, records claims and completions, and rolls the grid
/// over into a new coverage cycle when it is exhausted. Coverage is a ring,
/// not a one-shot scan.
#[derive(Clone)]
pub struct ZoneScheduler {
    store: ZoneStore,
}

impl ZoneScheduler {
    pub fn new(store: ZoneStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    /// Next zone to work. When every zone is completed the cycle is reset
    /// and selection retried once; zones stuck in_progress are never
    /// recycled here, they stay visible in stats until an operator resets
    /// them.
    pub async fn next_zone(&self) -> Result<Option<Zone>> {
        if let Some(zone) = self.store.next_pending().await? {
            return Ok(Some(zone));
        }

        info!("All zones completed, resetting for next cycle");
        let reset = self.store.reset_cycle().await?;
        if reset == 0 {
            warn!("No zones available after reset");
            return Ok(None);
        }
        self.store.next_pending().await
    }

    /// Claims the zone for this worker. `false` means another scheduler got
    /// there first and the caller must pick a different zone.
    pub async fn claim_zone(&self, zone_id: i64) -> Result<bool> {
        let claimed = self.store.claim(zone_id).await?;
        if claimed {
            info!("Zone {} marked as in_progress", zone_id);
        } else {
            warn!("Zone {} was not pending; claim lost", zone_id);
        }
        Ok(claimed)
    }

    pub async fn complete_zone(&self, zone_id: i64, new_business_count: i64) -> Result<bool> {
        let completed = self.store.complete(zone_id, new_business_count).await?;
        if completed {
            info!(
                "Zone {} marked as completed with {} new businesses",
                zone_id, new_business_count
            );
        } else {
            warn!("Zone {} was not in_progress; completion ignored", zone_id);
        }
        Ok(completed)
    }

    pub async fn stats(&self) -> Result<ZoneStats> {
        self.store.stats().await
    }

    pub async fn is_ready(&self) -> Result<bool> {
        self.store.is_ready().await
    }
}
