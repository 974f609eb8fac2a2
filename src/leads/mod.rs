pub mod qualifier;
pub mod scoring;
pub mod store;

pub use qualifier::{BatchOutcome, LeadQualifier};
pub use store::{LeadStats, LeadStore, NewLead};
