//! NVML-based GPU metrics collection.
//!
//! [`MetricsCollector`] wraps the NVIDIA Management Library to
//! enumerate GPUs and gather per-device metrics (memory, temperature,
//! utilization, power draw and limit, fan speed).
//!
//! NVML initialisation is **gracefully optional** -- if the host has no
//! NVIDIA drivers (e.g. a developer laptop), the collector logs a
//! warning and reports zero GPUs instead of panicking.

use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::Nvml;
use sentinel_core::metric_names::{
    METRIC_FAN_SPEED, METRIC_MEMORY_TOTAL, METRIC_MEMORY_USED, METRIC_POWER_DRAW,
    METRIC_POWER_LIMIT, METRIC_TEMPERATURE, METRIC_UTILIZATION,
};
use sentinel_core::metrics::EntityReading;
use sentinel_core::types::{EntityId, Timestamp};
use serde::Serialize;

/// Per-GPU snapshot collected from NVML.
#[derive(Debug, Clone, Serialize)]
pub struct GpuMetrics {
    pub gpu_index: u32,
    pub memory_used_mib: u64,
    pub memory_total_mib: u64,
    pub temperature_celsius: u32,
    pub utilization_percent: u32,
    /// Not all GPUs report power draw.
    pub power_draw_watts: Option<f64>,
    /// Enforced board power limit; absent on GPUs without power management.
    pub power_limit_watts: Option<f64>,
    /// Not all GPUs expose fan speed (e.g. passively-cooled cards).
    pub fan_speed_percent: Option<u32>,
}

impl GpuMetrics {
    /// Convert into a reading keyed by the canonical metric names.
    ///
    /// The entity id is the GPU index offset by `entity_id_base`; fields the
    /// device did not report are left out.
    pub fn to_reading(&self, entity_id_base: EntityId, timestamp: Timestamp) -> EntityReading {
        let mut reading = EntityReading::new(entity_id_base + EntityId::from(self.gpu_index), timestamp)
            .with(METRIC_MEMORY_USED, self.memory_used_mib as f64)
            .with(METRIC_MEMORY_TOTAL, self.memory_total_mib as f64)
            .with(METRIC_TEMPERATURE, f64::from(self.temperature_celsius))
            .with(METRIC_UTILIZATION, f64::from(self.utilization_percent));

        if let Some(watts) = self.power_draw_watts {
            reading = reading.with(METRIC_POWER_DRAW, watts);
        }
        if let Some(watts) = self.power_limit_watts {
            reading = reading.with(METRIC_POWER_LIMIT, watts);
        }
        if let Some(fan) = self.fan_speed_percent {
            reading = reading.with(METRIC_FAN_SPEED, f64::from(fan));
        }
        reading
    }
}

/// Wraps NVML and provides a single `collect()` method that returns
/// metrics for every GPU visible on the host.
pub struct MetricsCollector {
    /// `None` when NVML could not be initialised (no drivers / no GPU).
    nvml: Option<Nvml>,
}

const BYTES_PER_MIB: u64 = 1024 * 1024;

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Attempt to initialise NVML.
    ///
    /// Returns a collector that reports zero GPUs if NVML is not
    /// available (missing drivers, no NVIDIA hardware, etc.).
    pub fn new() -> Self {
        let nvml = match Nvml::init() {
            Ok(nvml) => {
                tracing::info!("NVML initialised successfully");
                Some(nvml)
            }
            Err(e) => {
                tracing::warn!(error = %e, "NVML unavailable -- GPU metrics will not be collected");
                None
            }
        };
        Self { nvml }
    }

    /// Number of GPUs visible to NVML, or 0 if NVML is unavailable.
    pub fn gpu_count(&self) -> u32 {
        self.nvml
            .as_ref()
            .and_then(|nvml| nvml.device_count().ok())
            .unwrap_or(0)
    }

    /// Collect a metrics snapshot for every GPU on the host.
    ///
    /// Errors on individual devices are logged and the device is
    /// skipped rather than failing the entire collection pass.
    pub fn collect(&self) -> Vec<GpuMetrics> {
        let Some(nvml) = self.nvml.as_ref() else {
            return Vec::new();
        };

        let device_count = match nvml.device_count() {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Failed to query GPU device count");
                return Vec::new();
            }
        };

        let mut metrics = Vec::with_capacity(device_count as usize);

        for idx in 0..device_count {
            match collect_device(nvml, idx) {
                Ok(m) => metrics.push(m),
                Err(e) => {
                    tracing::warn!(gpu_index = idx, error = %e, "Skipping GPU -- metrics collection failed");
                }
            }
        }

        metrics
    }
}

/// Collect metrics for a single GPU device.
fn collect_device(nvml: &Nvml, idx: u32) -> Result<GpuMetrics, nvml_wrapper::error::NvmlError> {
    let device = nvml.device_by_index(idx)?;

    let mem_info = device.memory_info()?;
    let temperature = device.temperature(TemperatureSensor::Gpu)?;
    let utilization = device.utilization_rates()?;

    // NVML reports power in milliwatts.
    let power_draw_watts = device.power_usage().ok().map(milliwatts_to_watts);
    let power_limit_watts = device
        .enforced_power_limit()
        .ok()
        .map(milliwatts_to_watts);

    // Fan speed for fan index 0 (primary).
    let fan_speed_percent = device.fan_speed(0).ok();

    Ok(GpuMetrics {
        gpu_index: idx,
        memory_used_mib: mem_info.used / BYTES_PER_MIB,
        memory_total_mib: mem_info.total / BYTES_PER_MIB,
        temperature_celsius: temperature,
        utilization_percent: utilization.gpu,
        power_draw_watts,
        power_limit_watts,
        fan_speed_percent,
    })
}

fn milliwatts_to_watts(mw: u32) -> f64 {
    f64::from(mw) / 1000.0
}
