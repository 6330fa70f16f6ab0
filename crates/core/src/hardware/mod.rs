//! Hardware monitoring domain logic.
//!
//! Contains the threshold evaluation engine, ratio derivation, alert
//! deduplication, and the pipeline that ties them together. Everything
//! except the final persistence call in [`pipeline`] is pure and synchronous.

pub mod cooldown;
pub mod pipeline;
pub mod ratio;
pub mod thresholds;
