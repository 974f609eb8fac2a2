use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::EmailConfig;
use crate::error::Result;
use crate::leads::LeadStore;
use crate::mailer::Mailer;
use crate::metrics::{Counter, MetricsLedger};
use crate::models::{ContactMethod, Lead, LeadStatus, OutreachKind};

use super::templates::{render, template_for};

/// Cadence: day offsets after the previous contact at which each follow-up
/// becomes eligible.
const FOLLOW_UP_1_DAYS: i64 = 3;
const FOLLOW_UP_2_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CampaignOutcome {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

impl CampaignOutcome {
    fn absorb(&mut self, other: CampaignOutcome) {
        self.attempted += other.attempted;
        self.sent += other.sent;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CombinedOutcome {
    pub initial: CampaignOutcome,
    pub follow_up: CampaignOutcome,
}

/// Schedules outreach under the daily quota and the fixed follow-up
/// cadence. Quota is consumed by attempts: the batch is sized up front and
/// a failed delivery does not free a slot within the same run.
#[derive(Clone)]
pub struct CampaignScheduler {
    leads: LeadStore,
    metrics: MetricsLedger,
    mailer: Arc<dyn Mailer>,
    location: String,
    email: EmailConfig,
}

impl CampaignScheduler {
    pub fn new(
        leads: LeadStore,
        metrics: MetricsLedger,
        mailer: Arc<dyn Mailer>,
        location: String,
        email: EmailConfig,
    ) -> Self {
        Self {
            leads,
            metrics,
            mailer,
            location,
            email,
        }
    }

    /// Quota left for today based on the metrics ledger. Exhaustion is a
    /// normal no-op condition, never an error.
    pub async fn remaining_quota(&self) -> Result<usize> {
        let sent_today = self.metrics.today().await?.emails_sent.max(0) as usize;
        Ok(self.email.max_daily_emails.saturating_sub(sent_today))
    }

    /// Renders and attempts one message. Returns whether delivery
    /// succeeded; a lead without a mailable address is a per-lead failure,
    /// not a reason to fall back to mailing its phone number.
    async fn send_to(&self, lead: &Lead, kind: OutreachKind) -> Result<bool> {
        let destination = match lead.contact_method() {
            ContactMethod::Email(addr) => addr,
            ContactMethod::Phone(_) | ContactMethod::None => {
                warn!("Lead {} ({}) has no mailable address", lead.id, lead.name);
                return Ok(false);
            }
        };

        let template = template_for(kind, lead.category.as_deref());
        let rendered = render(template, lead, &self.location, &self.email);

        let report = self
            .mailer
            .send(&destination, &rendered.subject, &rendered.body)
            .await;

        if report.success {
            self.leads.mark_contacted(lead.id).await?;
            self.leads
                .record_outreach(lead.id, kind, &rendered.subject)
                .await?;
            info!(
                "Sent {} email to {} ({})",
                kind.as_str(),
                lead.name,
                report.reference.as_deref().unwrap_or("-")
            );
            Ok(true)
        } else {
            warn!(
                "Failed to send {} email to {}: {}",
                kind.as_str(),
                lead.name,
                report.error.as_deref().unwrap_or("unknown error")
            );
            Ok(false)
        }
    }

    /// Sends to every lead in the batch, pacing between sends, then applies
    /// the batch's emails_sent counter as one additive upsert.
    async fn send_batch(&self, batch: &[Lead], kind: OutreachKind) -> Result<CampaignOutcome> {
        let mut outcome = CampaignOutcome {
            attempted: batch.len(),
            ..CampaignOutcome::default()
        };

        for (i, lead) in batch.iter().enumerate() {
            if self.send_to(lead, kind).await? {
                outcome.sent += 1;
            } else {
                outcome.failed += 1;
            }

            if self.email.delay_between_emails_ms > 0 && i + 1 < batch.len() {
                let jitter = fastrand::u64(0..=1000);
                tokio::time::sleep(Duration::from_millis(
                    self.email.delay_between_emails_ms + jitter,
                ))
                .await;
            }
        }

        self.metrics
            .add(Counter::EmailsSent, outcome.sent as i64)
            .await?;
        Ok(outcome)
    }

    async fn run_initial(&self, budget: usize) -> Result<CampaignOutcome> {
        if budget == 0 {
            info!("Daily email limit reached, skipping campaign");
            return Ok(CampaignOutcome::default());
        }

        let batch = self.leads.qualified_leads(budget).await?;
        if batch.is_empty() {
            info!("No qualified leads available for outreach");
            return Ok(CampaignOutcome::default());
        }

        info!("Sending initial outreach to {} leads", batch.len());
        self.send_batch(&batch, OutreachKind::Initial).await
    }

    async fn run_follow_ups(&self, mut budget: usize) -> Result<CampaignOutcome> {
        let mut outcome = CampaignOutcome::default();
        if budget == 0 {
            info!("Daily email limit reached, skipping follow-ups");
            return Ok(outcome);
        }

        // Earlier-stage follow-ups get first claim on the shared budget.
        let mut first = self
            .leads
            .follow_up_candidates(FOLLOW_UP_1_DAYS, 1)
            .await?;
        first.truncate(budget);
        if !first.is_empty() {
            let sent = self.send_batch(&first, OutreachKind::FollowUp1).await?;
            budget -= sent.attempted;
            outcome.absorb(sent);
        }

        let mut second = self
            .leads
            .follow_up_candidates(FOLLOW_UP_2_DAYS, 2)
            .await?;
        second.truncate(budget);
        if !second.is_empty() {
            let sent = self.send_batch(&second, OutreachKind::FollowUp2).await?;
            outcome.absorb(sent);
        }

        Ok(outcome)
    }

    pub async fn run_daily_campaign(&self) -> Result<CampaignOutcome> {
        info!("Starting daily email campaign");
        let budget = self.remaining_quota().await?;
        let outcome = self.run_initial(budget).await?;
        info!("Daily campaign completed, sent {} emails", outcome.sent);
        Ok(outcome)
    }

    pub async fn run_follow_up_campaign(&self) -> Result<CampaignOutcome> {
        info!("Starting follow-up campaign");
        let budget = self.remaining_quota().await?;
        let outcome = self.run_follow_ups(budget).await?;
        info!("Follow-up campaign completed, sent {} emails", outcome.sent);
        Ok(outcome)
    }

    /// Fresh leads get first claim on the day's quota; follow-ups receive
    /// only what the initial stage did not attempt, so the combined run
    /// never exceeds the daily limit in attempts.
    pub async fn run_combined_campaign(&self) -> Result<CombinedOutcome> {
        let budget = self.remaining_quota().await?;
        let initial = self.run_initial(budget).await?;
        let follow_up = self
            .run_follow_ups(budget.saturating_sub(initial.attempted))
            .await?;
        Ok(CombinedOutcome { initial, follow_up })
    }

    /// External signal: a recipient replied.
    pub async fn record_response(&self, lead_id: i64) -> Result<()> {
        debug!("Response received from lead {}", lead_id);
        self.metrics.add(Counter::ResponsesReceived, 1).await
    }

    /// External signal: a lead became a customer.
    pub async fn mark_converted(&self, lead_id: i64) -> Result<()> {
        self.leads.set_status(lead_id, LeadStatus::Converted).await?;
        self.metrics.add(Counter::Conversions, 1).await
    }

    /// Permanent suppression of a recipient.
    pub async fn unsubscribe(&self, lead_id: i64, email: Option<&str>) -> Result<bool> {
        self.leads.add_unsubscribe(lead_id, email).await
    }
}
