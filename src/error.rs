use thiserror::Error;

pub type Result<T> = std::result::Result<T, OutreachError>;

/// Failure taxonomy for the scheduler core.
///
/// `Configuration` is fatal at startup; `Persistence` propagates to the
/// caller unmodified; `Extraction` leaves the zone in progress for the
/// operator to inspect; `Delivery` is recorded per lead and never aborts a
/// batch; `InvalidTemplateKind` is a programmer error fatal for that call
/// only.
#[derive(Debug, Error)]
pub enum OutreachError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("unknown outreach template kind: {0}")]
    InvalidTemplateKind(String),
}

impl From<rusqlite::Error> for OutreachError {
    fn from(err: rusqlite::Error) -> Self {
        OutreachError::Persistence(err.to_string())
    }
}

impl From<mobc::Error<rusqlite::Error>> for OutreachError {
    fn from(err: mobc::Error<rusqlite::Error>) -> Self {
        OutreachError::Persistence(err.to_string())
    }
}

impl From<serde_yaml::Error> for OutreachError {
    fn from(err: serde_yaml::Error) -> Self {
        OutreachError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for OutreachError {
    fn from(err: std::io::Error) -> Self {
        OutreachError::Persistence(err.to_string())
    }
}
