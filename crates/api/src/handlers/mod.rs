//! Request handlers, one module per resource.

pub mod alerts;
pub mod analytics;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod thresholds;
