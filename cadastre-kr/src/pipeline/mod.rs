//! Orchestration: une région par archive, un lot par dossier

pub mod batch;
pub mod region;

pub use batch::{count_all, list_archives, process_all};
pub use region::{locate, process_region, RegionContext, RegionOutput, RegionSources};
