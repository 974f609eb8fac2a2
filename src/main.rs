use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod campaign;
mod config;
mod database;
mod error;
mod extractor;
mod jobs;
mod leads;
mod mailer;
mod metrics;
mod models;
mod zones;

use app::App;
use config::{load_config, Config};
use database::create_db_pool;
use error::Result;
use extractor::SyntheticExtractor;
use jobs::JobScheduler;
use mailer::{DryRunMailer, Mailer, MailgunConfig, MailgunMailer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    // Setup logging. RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("zone_outreach={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting outreach scheduler for {}", config.area.location);

    // Initialize database
    let db_pool = create_db_pool(&config.database.path).await?;

    // Real delivery only when Mailgun credentials are present
    let mailer: Arc<dyn Mailer> =
        match MailgunConfig::from_env(&config.email.from_email, &config.email.from_name) {
            Some(mailgun) => Arc::new(MailgunMailer::new(mailgun)),
            None => {
                warn!("No Mailgun credentials found, emails will be logged only");
                Arc::new(DryRunMailer)
            }
        };

    let extractor = Arc::new(SyntheticExtractor::new(config.area.max_businesses_per_run));

    let app = App::new(config.clone(), db_pool, extractor, mailer);
    app.seed_zones().await?;
    app.health_check().await?;

    let mut scheduler = JobScheduler::new();

    if config.scheduling.enable_auto_scraping {
        let app = app.clone();
        scheduler.schedule(
            "scraping",
            Duration::from_secs(config.scheduling.scrape_interval_minutes * 60),
            move || {
                let app = app.clone();
                async move {
                    if let Err(e) = app.run_scrape_pass().await {
                        tracing::error!("Scrape pass failed: {}", e);
                    }
                }
            },
        );
    }

    if config.scheduling.enable_auto_emailing {
        let app = app.clone();
        scheduler.schedule(
            "emailing",
            Duration::from_secs(config.scheduling.email_interval_minutes * 60),
            move || {
                let app = app.clone();
                async move {
                    if let Err(e) = app.run_email_pass().await {
                        tracing::error!("Email pass failed: {}", e);
                    }
                }
            },
        );
    }

    {
        let app = app.clone();
        scheduler.schedule(
            "health",
            Duration::from_secs(config.scheduling.health_interval_minutes * 60),
            move || {
                let app = app.clone();
                async move {
                    if let Err(e) = app.health_check().await {
                        tracing::error!("Health check failed: {}", e);
                    }
                }
            },
        );
    }

    info!("Scheduled jobs: {:?}", scheduler.job_names());

    signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down gracefully...");
    scheduler.shutdown().await;

    Ok(())
}
