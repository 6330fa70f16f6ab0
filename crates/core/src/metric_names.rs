//! Well-known GPU metric name constants and WebSocket message types.
//!
//! These are the canonical keys of an [`EntityReading`](crate::metrics::EntityReading)
//! value map, the names used in threshold configuration, and the names the
//! agent uses when pushing samples.

/// WebSocket message type discriminator for GPU metric payloads.
///
/// Used by the agent when sending metrics and by the backend when parsing them.
pub const MSG_TYPE_GPU_METRICS: &str = "gpu_metrics";

/// GPU core temperature in degrees Celsius.
pub const METRIC_TEMPERATURE: &str = "temperature";

/// GPU compute utilization percentage (0-100).
pub const METRIC_UTILIZATION: &str = "utilization";

/// Used VRAM in MiB (raw).
pub const METRIC_MEMORY_USED: &str = "memory_used";

/// Total VRAM in MiB (raw).
pub const METRIC_MEMORY_TOTAL: &str = "memory_total";

/// VRAM usage as a percentage, derived from used / total.
pub const METRIC_MEMORY_USAGE: &str = "memory_usage";

/// Power draw. Raw samples are in watts; as an alerting metric it is the
/// derived percentage of the enforced power limit.
pub const METRIC_POWER_DRAW: &str = "power_draw";

/// Enforced power limit in watts (raw).
pub const METRIC_POWER_LIMIT: &str = "power_limit";

/// Primary fan speed percentage (0-100).
pub const METRIC_FAN_SPEED: &str = "fan_speed";
