//! HTTP handlers for insight-service.

pub mod analyze;
pub mod generate;
pub mod health;
pub mod metrics;

pub use analyze::analyze_data;
pub use generate::generate_data;
pub use health::{health_check, readiness_check};
pub use metrics::metrics;
