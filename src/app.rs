use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::campaign::{CampaignScheduler, CombinedOutcome};
use crate::config::Config;
use crate::database::DbPool;
use crate::error::Result;
use crate::extractor::{AreaSpec, Extractor};
use crate::leads::{BatchOutcome, LeadQualifier, LeadStore};
use crate::mailer::Mailer;
use crate::metrics::{Counter, MetricsLedger};
use crate::zones::{generate_grid, ZoneScheduler, ZoneStore};

/// Wires the stores, the extractor and the campaign together and exposes
/// the passes the periodic jobs run. Everything is constructed from an
/// injected pool; there is no global connection state.
#[derive(Clone)]
pub struct App {
    config: Config,
    zones: ZoneScheduler,
    qualifier: LeadQualifier,
    leads: LeadStore,
    metrics: MetricsLedger,
    campaign: CampaignScheduler,
    extractor: Arc<dyn Extractor>,
}

impl App {
    pub fn new(
        config: Config,
        pool: DbPool,
        extractor: Arc<dyn Extractor>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let zone_store = ZoneStore::new(pool.clone());
        let leads = LeadStore::new(pool.clone());
        let metrics = MetricsLedger::new(pool);
        let qualifier = LeadQualifier::new(leads.clone(), metrics.clone());
        let campaign = CampaignScheduler::new(
            leads.clone(),
            metrics.clone(),
            mailer,
            config.area.location.clone(),
            config.email.clone(),
        );

        Self {
            config,
            zones: ZoneScheduler::new(zone_store),
            qualifier,
            leads,
            metrics,
            campaign,
            extractor,
        }
    }

    pub fn campaign(&self) -> &CampaignScheduler {
        &self.campaign
    }

    pub fn zones(&self) -> &ZoneScheduler {
        &self.zones
    }

    /// Generates the grid from the configured bounds and inserts any zones
    /// not already present. Safe to run on every startup; existing zones
    /// keep their status and history.
    pub async fn seed_zones(&self) -> Result<()> {
        let specs = generate_grid(&self.config.area.bounds, self.config.area.grid_size)?;
        let report = self.zones.store().seed(&specs).await?;
        info!(
            "Zone grid ready: {} zones ({} new, {} already present)",
            report.total, report.inserted, report.skipped
        );
        Ok(())
    }

    /// One scraping pass over one zone: pick, claim, extract, qualify,
    /// complete. A zone whose extraction fails stays in_progress so it is
    /// not handed out again until an operator resets it.
    pub async fn run_scrape_pass(&self) -> Result<BatchOutcome> {
        let Some(zone) = self.zones.next_zone().await? else {
            warn!("No zone available to scrape");
            return Ok(BatchOutcome::default());
        };

        if !self.zones.claim_zone(zone.id).await? {
            info!("Zone {} was claimed by another worker, skipping", zone.name);
            return Ok(BatchOutcome::default());
        }

        info!(
            "Scraping zone {} (center {:.4}, {:.4})",
            zone.name, zone.center_lat, zone.center_lon
        );

        let area = AreaSpec::from(&zone);
        let records = match self.extractor.discover(&area).await {
            Ok(records) => records,
            Err(e) => {
                error!(
                    "Extraction failed for zone {}: {}. Zone stays in_progress.",
                    zone.name, e
                );
                return Err(e);
            }
        };

        let limit = self.config.area.max_businesses_per_run;
        let records = if records.len() > limit {
            &records[..limit]
        } else {
            &records[..]
        };

        let outcome = self.qualifier.process_batch(records).await?;
        self.zones
            .complete_zone(zone.id, outcome.qualified as i64)
            .await?;
        self.metrics.add(Counter::ZonesScraped, 1).await?;

        info!(
            "Zone {} done: {} businesses processed, {} qualified",
            zone.name, outcome.processed, outcome.qualified
        );
        Ok(outcome)
    }

    /// One email pass: initial outreach and due follow-ups under a single
    /// shared daily quota.
    pub async fn run_email_pass(&self) -> Result<CombinedOutcome> {
        let outcome = self.campaign.run_combined_campaign().await?;
        info!(
            "Email pass done: initial {}/{} sent, follow-up {}/{} sent",
            outcome.initial.sent,
            outcome.initial.attempted,
            outcome.follow_up.sent,
            outcome.follow_up.attempted
        );
        Ok(outcome)
    }

    /// Logs a snapshot of zone coverage, the lead funnel and today's
    /// counters.
    pub async fn health_check(&self) -> Result<()> {
        let zones = self.zones.stats().await?;
        let leads = self.leads.stats().await?;
        let today = self.metrics.today().await?;

        info!(
            "Zones: {}/{} completed, {} in progress, {} businesses found",
            zones.completed, zones.total, zones.in_progress, zones.total_businesses
        );
        info!(
            "Leads: {} total, {} without website, {} new, {} contacted, {} converted",
            leads.total, leads.without_website, leads.new_leads, leads.contacted, leads.converted
        );
        info!(
            "Today: {} zones scraped, {} leads qualified, {} emails sent, {} responses, {} conversions",
            today.zones_scraped,
            today.leads_qualified,
            today.emails_sent,
            today.responses_received,
            today.conversions
        );
        if let Ok(snapshot) = serde_json::to_string(&today) {
            debug!("Metrics snapshot: {}", snapshot);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::error::OutreachError;
    use crate::extractor::SyntheticExtractor;
    use crate::mailer::DryRunMailer;
    use crate::models::{RawBusiness, ZoneStatus};
    use async_trait::async_trait;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.area.grid_size = 2;
        config.email.delay_between_emails_ms = 0;
        config
    }

    async fn test_app(extractor: Arc<dyn Extractor>) -> App {
        let pool = test_pool().await;
        App::new(small_config(), pool, extractor, Arc::new(DryRunMailer))
    }

    struct FailingExtractor;

    #[async_trait]
    impl Extractor for FailingExtractor {
        async fn discover(&self, _area: &AreaSpec) -> Result<Vec<RawBusiness>> {
            Err(OutreachError::Extraction("backend unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn scrape_pass_completes_a_zone_and_records_metrics() {
        let app = test_app(Arc::new(SyntheticExtractor::new(8))).await;
        app.seed_zones().await.unwrap();

        let outcome = app.run_scrape_pass().await.unwrap();
        assert_eq!(outcome.processed, 8);

        let stats = app.zones.stats().await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 3);

        let today = app.metrics.today().await.unwrap();
        assert_eq!(today.zones_scraped, 1);
        assert_eq!(today.businesses_scraped, 8);
    }

    #[tokio::test]
    async fn failed_extraction_leaves_zone_in_progress() {
        let app = test_app(Arc::new(FailingExtractor)).await;
        app.seed_zones().await.unwrap();

        assert!(app.run_scrape_pass().await.is_err());

        let stats = app.zones.stats().await.unwrap();
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 0);

        // The stuck zone is skipped on the next pass rather than retried.
        let next = app.zones.next_zone().await.unwrap().unwrap();
        assert_eq!(next.status, ZoneStatus::Pending);
    }

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate_zones() {
        let app = test_app(Arc::new(SyntheticExtractor::new(1))).await;
        app.seed_zones().await.unwrap();
        app.seed_zones().await.unwrap();

        let stats = app.zones.stats().await.unwrap();
        assert_eq!(stats.total, 4);
    }

    #[tokio::test]
    async fn email_pass_sends_to_qualified_leads() {
        let app = test_app(Arc::new(SyntheticExtractor::new(5))).await;
        app.seed_zones().await.unwrap();
        app.run_scrape_pass().await.unwrap();

        let outcome = app.run_email_pass().await.unwrap();
        // Synthetic records carry no email address, so every attempt is a
        // per-lead failure and nothing is marked contacted.
        assert_eq!(outcome.initial.sent, 0);
        assert_eq!(outcome.initial.attempted, outcome.initial.failed);

        let leads = app.leads.stats().await.unwrap();
        assert_eq!(leads.contacted, 0);
    }
}
