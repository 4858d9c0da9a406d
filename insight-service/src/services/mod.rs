pub mod analysis;
pub mod metrics;
pub mod prompts;
pub mod providers;

pub use analysis::AnalysisService;
