pub mod metrics;
pub mod project;
