/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Monitored hardware unit (one GPU), identified by an integer index.
pub type EntityId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
