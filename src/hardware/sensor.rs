//! Temperature probes.

use std::path::PathBuf;

use rand::Rng;
use tracing::debug;

use crate::error::{Result, TelemetryError};
use crate::telemetry::TemperatureProbe;

/// Default sysfs node exposed by the IIO driver for the DHT11 sensor.
pub const DEFAULT_SENSOR_PATH: &str = "/sys/bus/iio/devices/iio:device0/in_temp_input";

/// Probe reading a kernel-exported sysfs node that reports millidegrees
/// Celsius as a plain integer.
pub struct SysfsProbe {
    path: PathBuf,
}

impl SysfsProbe {
    /// Create a probe over the given sysfs node.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TemperatureProbe for SysfsProbe {
    fn read_celsius(&mut self) -> Result<f64> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            TelemetryError::capture_error(format!(
                "cannot read sensor at {}: {err}",
                self.path.display()
            ))
        })?;
        let millidegrees: i64 = raw.trim().parse().map_err(|err| {
            TelemetryError::capture_error(format!(
                "unexpected sensor value {:?}: {err}",
                raw.trim()
            ))
        })?;
        let celsius = millidegrees as f64 / 1000.0;
        debug!(celsius, path = %self.path.display(), "temperature sampled");
        Ok(celsius)
    }
}

/// Probe producing plausible values without any hardware.
///
/// Mimics the whole-degree resolution of the real sensor.
pub struct SimulatedProbe {
    base: f64,
}

impl SimulatedProbe {
    /// Create a probe that wanders around `base` degrees Celsius.
    pub fn new(base: f64) -> Self {
        Self { base }
    }
}

impl TemperatureProbe for SimulatedProbe {
    fn read_celsius(&mut self) -> Result<f64> {
        let jitter: f64 = rand::thread_rng().gen_range(-2.0..=2.0);
        Ok((self.base + jitter).round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysfs_probe_converts_millidegrees() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in_temp_input");
        std::fs::write(&path, "23500\n").unwrap();

        let mut probe = SysfsProbe::new(&path);
        assert_eq!(probe.read_celsius().unwrap(), 23.5);
    }

    #[test]
    fn test_sysfs_probe_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in_temp_input");
        std::fs::write(&path, "  24000 \n").unwrap();

        let mut probe = SysfsProbe::new(&path);
        assert_eq!(probe.read_celsius().unwrap(), 24.0);
    }

    #[test]
    fn test_sysfs_probe_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in_temp_input");
        std::fs::write(&path, "not-a-number\n").unwrap();

        let mut probe = SysfsProbe::new(&path);
        assert!(matches!(
            probe.read_celsius(),
            Err(TelemetryError::Capture(_))
        ));
    }

    #[test]
    fn test_sysfs_probe_fails_for_missing_node() {
        let mut probe = SysfsProbe::new("/definitely/not/a/sensor");
        assert!(probe.read_celsius().is_err());
    }

    #[test]
    fn test_simulated_probe_stays_near_base() {
        let mut probe = SimulatedProbe::new(20.0);
        for _ in 0..50 {
            let value = probe.read_celsius().unwrap();
            assert!((17.0..=23.0).contains(&value), "value {value} out of range");
            assert_eq!(value, value.round());
        }
    }
}
