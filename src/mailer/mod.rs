pub mod mailgun;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

pub use mailgun::{MailgunConfig, MailgunMailer};

/// Outcome of one delivery attempt. Mailers never return an error; failures
/// are carried in the report so a bad address cannot abort a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub success: bool,
    pub reference: Option<String>,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn delivered(reference: String) -> Self {
        Self {
            success: true,
            reference: Some(reference),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            reference: None,
            error: Some(error.into()),
        }
    }
}

/// Transport seam for outreach delivery. Rendering happens before this
/// boundary; the mailer only sees a destination, subject and body.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, destination: &str, subject: &str, body: &str) -> DeliveryReport;
}

/// Logs instead of delivering. Used when no Mailgun credentials are
/// configured, and in tests.
pub struct DryRunMailer;

#[async_trait]
impl Mailer for DryRunMailer {
    async fn send(&self, destination: &str, subject: &str, _body: &str) -> DeliveryReport {
        let reference = format!("dry-run-{}", uuid::Uuid::new_v4());
        info!("[dry-run] Would send to {}: {}", destination, subject);
        DeliveryReport::delivered(reference)
    }
}
