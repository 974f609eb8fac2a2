use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::metrics::MetricsLedger;
use crate::models::RawBusiness;

use super::scoring::{is_chain_business, normalize_phone, priority_score, sanitize_name};
use super::store::{LeadStore, NewLead};

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BatchOutcome {
    pub processed: usize,
    pub qualified: usize,
}

/// Filters, normalizes and scores raw discovery records, then inserts them
/// at most once per (name, address). Runs strictly chain filter ->
/// completeness -> website filter -> normalize -> score -> insert.
#[derive(Clone)]
pub struct LeadQualifier {
    leads: LeadStore,
    metrics: MetricsLedger,
}

impl LeadQualifier {
    pub fn new(leads: LeadStore, metrics: MetricsLedger) -> Self {
        Self { leads, metrics }
    }

    fn passes_filters(record: &RawBusiness) -> bool {
        if is_chain_business(&record.name) {
            debug!("Filtered out chain business: {}", record.name);
            return false;
        }
        if record.name.trim().is_empty() || record.address.trim().is_empty() {
            debug!("Filtered out business with missing info: {}", record.name);
            return false;
        }
        if record.has_website {
            debug!("Filtered out business with website: {}", record.name);
            return false;
        }
        true
    }

    fn enrich(record: &RawBusiness) -> NewLead {
        let name = sanitize_name(&record.name);
        let phone = record
            .phone
            .as_deref()
            .map(normalize_phone)
            .filter(|p| !p.is_empty());
        let score = priority_score(
            record.rating,
            record.review_count,
            record.category.as_deref(),
            record.has_website,
            phone.as_deref(),
        );

        NewLead {
            name,
            category: record.category.clone(),
            address: record.address.trim().to_string(),
            phone,
            email: record.email.clone().filter(|e| !e.is_empty()),
            has_website: record.has_website,
            rating: record.rating,
            review_count: record.review_count,
            priority_score: score,
        }
    }

    /// Runs one record through the whole pipeline. Returns whether a new
    /// lead row was created; re-sighting a known (name, address) is a no-op.
    pub async fn process_one(&self, record: &RawBusiness) -> Result<bool> {
        if !Self::passes_filters(record) {
            return Ok(false);
        }

        let lead = Self::enrich(record);
        let created = self.leads.insert_if_absent(&lead).await?;
        if created {
            info!("Qualified lead: {} (score {})", lead.name, lead.priority_score);
        }
        Ok(created)
    }

    /// Processes a whole discovery batch and applies the batch's two
    /// counters as one additive metrics upsert, however many records failed
    /// individual filters.
    pub async fn process_batch(&self, records: &[RawBusiness]) -> Result<BatchOutcome> {
        info!("Processing {} discovered businesses", records.len());

        let mut outcome = BatchOutcome::default();
        for record in records {
            if self.process_one(record).await? {
                outcome.qualified += 1;
            }
            outcome.processed += 1;
        }

        self.metrics
            .record_scrape_batch(outcome.processed as i64, outcome.qualified as i64)
            .await?;

        info!(
            "Processed {} businesses, {} qualified leads",
            outcome.processed, outcome.qualified
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn raw(name: &str, address: &str, has_website: bool) -> RawBusiness {
        RawBusiness {
            name: name.to_string(),
            category: Some("Cafe".to_string()),
            address: address.to_string(),
            phone: Some("+1 (512) 555-0100".to_string()),
            email: None,
            has_website,
            rating: Some(4.6),
            review_count: 120,
        }
    }

    async fn qualifier() -> (LeadQualifier, LeadStore, MetricsLedger) {
        let pool = test_pool().await;
        let leads = LeadStore::new(pool.clone());
        let metrics = MetricsLedger::new(pool);
        (LeadQualifier::new(leads.clone(), metrics.clone()), leads, metrics)
    }

    #[tokio::test]
    async fn chain_records_are_rejected_even_without_website() {
        let (qualifier, _, _) = qualifier().await;
        let record = raw("McDonald's Austin", "123 Main St", false);
        assert!(!qualifier.process_one(&record).await.unwrap());
    }

    #[tokio::test]
    async fn incomplete_and_websited_records_are_rejected() {
        let (qualifier, _, _) = qualifier().await;
        assert!(!qualifier
            .process_one(&raw("", "123 Main St", false))
            .await
            .unwrap());
        assert!(!qualifier
            .process_one(&raw("Nameless Cafe", "  ", false))
            .await
            .unwrap());
        assert!(!qualifier
            .process_one(&raw("Has Website", "123 Main St", true))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn qualified_record_is_normalized_and_scored() {
        let (qualifier, leads, _) = qualifier().await;
        let record = raw("  Blue   Moon Cafe ", "42 Congress Ave", false);
        assert!(qualifier.process_one(&record).await.unwrap());

        let lead = leads.qualified_leads(1).await.unwrap().remove(0);
        assert_eq!(lead.name, "Blue Moon Cafe");
        assert_eq!(lead.phone.as_deref(), Some("+15125550100"));
        // 20 (rating 4.6) + 15 (120 reviews) + 15 (cafe) + 30 (no site) + 20 (phone)
        assert_eq!(lead.priority_score, 100);
    }

    #[tokio::test]
    async fn batch_counts_and_metrics_applied_once() {
        let (qualifier, _, metrics) = qualifier().await;
        let batch = vec![
            raw("Keeper One", "1 First St", false),
            raw("McDonald's", "2 Second St", false),
            raw("Has Website", "3 Third St", true),
            raw("Keeper Two", "4 Fourth St", false),
        ];

        let outcome = qualifier.process_batch(&batch).await.unwrap();
        assert_eq!(outcome.processed, 4);
        assert_eq!(outcome.qualified, 2);

        let today = metrics.today().await.unwrap();
        assert_eq!(today.businesses_scraped, 4);
        assert_eq!(today.leads_qualified, 2);
    }

    #[tokio::test]
    async fn rescraping_the_same_zone_creates_no_duplicates() {
        let (qualifier, leads, metrics) = qualifier().await;
        let batch = vec![raw("Keeper One", "1 First St", false)];

        let first = qualifier.process_batch(&batch).await.unwrap();
        assert_eq!(first.qualified, 1);

        let second = qualifier.process_batch(&batch).await.unwrap();
        assert_eq!(second.processed, 1);
        assert_eq!(second.qualified, 0);

        assert_eq!(leads.stats().await.unwrap().total, 1);
        // Metrics still count the re-scrape as processed work.
        assert_eq!(metrics.today().await.unwrap().businesses_scraped, 2);
    }
}
