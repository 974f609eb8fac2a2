use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error};

use super::{DeliveryReport, Mailer};

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    pub from_email: String,
    pub from_name: String,
    pub base_url: String,
}

impl MailgunConfig {
    /// Reads credentials from the environment; `None` when the API key is
    /// absent, in which case callers fall back to the dry-run mailer.
    pub fn from_env(from_email: &str, from_name: &str) -> Option<Self> {
        let api_key = std::env::var("MAILGUN_API_KEY").ok()?;
        let domain = std::env::var("MAILGUN_DOMAIN").ok()?;
        Some(Self {
            api_key,
            domain,
            from_email: from_email.to_string(),
            from_name: from_name.to_string(),
            base_url: std::env::var("MAILGUN_BASE_URL")
                .unwrap_or_else(|_| "https://api.mailgun.net/v3".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: String,
}

pub struct MailgunMailer {
    config: MailgunConfig,
    client: Client,
}

impl MailgunMailer {
    pub fn new(config: MailgunConfig) -> Self {
        debug!("Created MailgunMailer for domain: {}", config.domain);
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, destination: &str, subject: &str, body: &str) -> DeliveryReport {
        let url = format!("{}/{}/messages", self.config.base_url, self.config.domain);

        let mut form_data = HashMap::new();
        form_data.insert(
            "from",
            format!("{} <{}>", self.config.from_name, self.config.from_email),
        );
        form_data.insert("to", destination.to_string());
        form_data.insert("subject", subject.to_string());
        form_data.insert("text", body.to_string());
        form_data.insert("o:tracking", "yes".to_string());
        form_data.insert(
            "o:tag",
            format!("campaign-{}", chrono::Utc::now().format("%Y-%m")),
        );

        debug!("Sending POST request to: {}", url);
        let response = match self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form_data)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Mailgun request failed: {}", e);
                return DeliveryReport::failed(e.to_string());
            }
        };

        if response.status().is_success() {
            match response.json::<MailgunResponse>().await {
                Ok(parsed) => DeliveryReport::delivered(parsed.id),
                Err(e) => DeliveryReport::failed(format!("bad Mailgun response: {}", e)),
            }
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Mailgun API error ({}): {}", status, text);
            DeliveryReport::failed(format!("Mailgun error ({}): {}", status, text))
        }
    }
}
