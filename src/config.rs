//! Configuration for the parkwatch pipeline.
//!
//! Everything has a default, so a bare `AppConfig::default()` runs the
//! simulated pipeline out of the box; a JSON file fills in site specifics
//! like the hub endpoint and credentials. Durations accept humane strings
//! such as `"10s"` or `"2m"`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::delivery::RetryPolicy;
use crate::error::{Result, TelemetryError};
use crate::hardware::{
    DEFAULT_CAMERA_COMMAND, DEFAULT_LCD_ADDRESS, DEFAULT_LCD_BUS, DEFAULT_SENSOR_PATH,
};

/// Top-level configuration, one section per pipeline concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Capture loop settings
    pub capture: CaptureConfig,
    /// Retry policy for hub delivery
    pub delivery: DeliveryConfig,
    /// Cloud hub connection
    pub hub: HubConfig,
    /// Vision service connection
    pub vision: VisionConfig,
    /// Sensor, camera and display specifics
    pub hardware: HardwareConfig,
    /// Archival store location for `report`
    pub archive: ArchiveConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            TelemetryError::config_error(format!("cannot read {}: {err}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            TelemetryError::config_error(format!("invalid config {}: {err}", path.display()))
        })
    }
}

/// Capture loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Time between capture cycles
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    /// Where the local journal lives
    pub journal_path: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            period: crate::DEFAULT_CAPTURE_PERIOD,
            journal_path: PathBuf::from("telemetry.log"),
        }
    }
}

impl CaptureConfig {
    /// Set the capture period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set the journal path.
    pub fn with_journal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.journal_path = path.into();
        self
    }
}

/// Retry policy for hub delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Total attempts per envelope, first try included
    pub max_retries: u32,
    /// Backoff before the second attempt; doubles each retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::DEFAULT_MAX_RETRIES,
            initial_delay: crate::DEFAULT_INITIAL_DELAY,
        }
    }
}

impl DeliveryConfig {
    /// Set the attempt bound.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first backoff delay.
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// The retry policy these settings describe.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.initial_delay)
    }
}

/// Cloud hub connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Ingestion endpoint URL; without one, envelopes go to a local
    /// sink file under the archive directory
    pub endpoint: Option<String>,
    /// Pre-generated SAS token, passed through as the Authorization header
    pub sas_token: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            sas_token: String::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Vision service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Prediction endpoint URL; required unless running simulated
    pub endpoint: Option<String>,
    /// API key sent in the Prediction-Key header
    pub prediction_key: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            prediction_key: String::new(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Sensor, camera and display specifics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Sysfs node of the temperature sensor
    pub sensor_path: PathBuf,
    /// Still-capture command
    pub camera_command: String,
    /// Frame width in pixels
    pub camera_width: u32,
    /// Frame height in pixels
    pub camera_height: u32,
    /// Frame rotation in degrees
    pub camera_rotation: u32,
    /// I2C bus of the LCD
    pub lcd_bus: u8,
    /// I2C address of the LCD controller
    pub lcd_address: u16,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            sensor_path: PathBuf::from(DEFAULT_SENSOR_PATH),
            camera_command: DEFAULT_CAMERA_COMMAND.to_string(),
            camera_width: 640,
            camera_height: 480,
            camera_rotation: 180,
            lcd_bus: DEFAULT_LCD_BUS,
            lcd_address: DEFAULT_LCD_ADDRESS,
        }
    }
}

/// Archival store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory holding the sink's objects
    pub dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("archive"),
        }
    }
}
