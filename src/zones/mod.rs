pub mod partitioner;
pub mod scheduler;
pub mod store;

pub use partitioner::{generate_grid, ZoneSpec};
pub use scheduler::ZoneScheduler;
pub use store::{SeedReport, ZoneStats, ZoneStore};
