//! Analytics API clients.

pub mod analytics;

pub use analytics::{AnalyticsClient, QueryBody};
