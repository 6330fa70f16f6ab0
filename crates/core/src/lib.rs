//! Domain logic for the GPU sentinel: threshold classification, alert
//! deduplication, the alerting pipeline, and historical analytics.
//!
//! Nothing in this crate talks to a database or the network directly.
//! Persistence is reached through the [`store::MetricStore`] trait so the
//! pipeline and analytics can be exercised against [`store::memory::InMemoryStore`].

pub mod alert;
pub mod analytics;
pub mod config;
pub mod error;
pub mod hardware;
pub mod metric_names;
pub mod metrics;
pub mod service;
pub mod store;
pub mod types;
