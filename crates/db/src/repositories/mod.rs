//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod alert_repo;
pub mod gpu_reading_repo;

pub use alert_repo::AlertRepo;
pub use gpu_reading_repo::GpuReadingRepo;
