//! Seams between the capture pipeline and the hardware or services behind it.
//!
//! Production implementations live in [`crate::hardware`] and
//! [`crate::vision`]; simulated implementations back the `--simulate` flag
//! and the test suite.

use async_trait::async_trait;

use crate::error::Result;
use crate::telemetry::{Classification, Reading};

/// Source of ambient temperature samples.
pub trait TemperatureProbe: Send {
    /// Read the current temperature in degrees Celsius.
    fn read_celsius(&mut self) -> Result<f64>;
}

/// Source of still frames of the parking area.
pub trait FrameCamera: Send {
    /// Capture one JPEG-encoded frame.
    fn capture_jpeg(&mut self) -> Result<Vec<u8>>;
}

/// Assigns an occupancy category to a captured frame.
#[async_trait]
pub trait OccupancyClassifier: Send + Sync {
    /// Classify one JPEG-encoded frame.
    async fn classify(&self, jpeg: &[u8]) -> Result<Classification>;
}

/// Local readout for the freshest reading.
pub trait ReadingDisplay: Send {
    /// Show a reading.
    fn show(&mut self, reading: &Reading) -> Result<()>;

    /// Blank the display. Called once on shutdown.
    fn clear(&mut self) -> Result<()>;
}
