use serde::{Deserialize, Serialize};

use crate::error::{OutreachError, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub area: AreaConfig,
    pub email: EmailConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub scheduling: SchedulingConfig,
}

/// Geographic search area and the grid laid over it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AreaConfig {
    pub location: String,
    pub bounds: Bounds,
    pub grid_size: usize,
    pub max_businesses_per_run: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub from_name: String,
    pub from_email: String,
    pub max_daily_emails: usize,
    pub delay_between_emails_ms: u64,
    pub service_price: u64,
    pub sender_phone: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Periodic job cadence, in minutes. Replaces the original cron expressions
/// with plain intervals driven by the in-process job scheduler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulingConfig {
    pub enable_auto_scraping: bool,
    pub enable_auto_emailing: bool,
    pub scrape_interval_minutes: u64,
    pub email_interval_minutes: u64,
    pub health_interval_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            area: AreaConfig {
                location: "Austin, Texas".to_string(),
                // Austin, Texas boundaries (approximate)
                bounds: Bounds {
                    north: 30.45,
                    south: 30.15,
                    east: -97.65,
                    west: -97.75,
                },
                grid_size: 10,
                max_businesses_per_run: 100,
            },
            email: EmailConfig {
                from_name: "Web Development Services".to_string(),
                from_email: "outreach@example.com".to_string(),
                max_daily_emails: 50,
                delay_between_emails_ms: 5000,
                service_price: 15000,
                sender_phone: String::new(),
            },
            database: DatabaseConfig {
                path: "data/outreach.db".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            scheduling: SchedulingConfig {
                enable_auto_scraping: true,
                enable_auto_emailing: true,
                scrape_interval_minutes: 30,
                email_interval_minutes: 24 * 60,
                health_interval_minutes: 60,
            },
        }
    }
}

impl Config {
    /// Fail-fast startup validation: a degenerate bounding box or an empty
    /// grid cannot produce a usable zone set.
    pub fn validate(&self) -> Result<()> {
        let b = &self.area.bounds;
        if self.area.grid_size == 0 {
            return Err(OutreachError::Configuration(
                "grid_size must be at least 1".to_string(),
            ));
        }
        if b.north <= b.south {
            return Err(OutreachError::Configuration(format!(
                "bounds are degenerate: north ({}) must exceed south ({})",
                b.north, b.south
            )));
        }
        if b.east <= b.west {
            return Err(OutreachError::Configuration(format!(
                "bounds are degenerate: east ({}) must exceed west ({})",
                b.east, b.west
            )));
        }
        if self.email.max_daily_emails == 0 {
            return Err(OutreachError::Configuration(
                "max_daily_emails must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn load_config(path: &str) -> Result<Config> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_grid_size_is_rejected() {
        let mut config = Config::default();
        config.area.grid_size = 0;
        assert!(matches!(
            config.validate(),
            Err(OutreachError::Configuration(_))
        ));
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        let mut config = Config::default();
        config.area.bounds.north = config.area.bounds.south;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.area.bounds.east = config.area.bounds.west - 1.0;
        assert!(config.validate().is_err());
    }
}
