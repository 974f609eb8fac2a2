pub mod scheduler;
pub mod templates;

pub use scheduler::{CampaignOutcome, CampaignScheduler, CombinedOutcome};
