//! Assembles complete readings from the capture seams.

use tracing::debug;

use crate::error::Result;
use crate::telemetry::traits::{FrameCamera, OccupancyClassifier, TemperatureProbe};
use crate::telemetry::Reading;

/// Produces one [`Reading`] per call by sampling the temperature probe,
/// capturing a frame, and classifying it.
///
/// Any seam failing aborts the whole observation: a reading either carries
/// all of its fields or is not produced at all.
pub struct ReadingProducer {
    probe: Box<dyn TemperatureProbe>,
    camera: Box<dyn FrameCamera>,
    classifier: Box<dyn OccupancyClassifier>,
}

impl ReadingProducer {
    /// Create a producer from its three seams.
    pub fn new(
        probe: Box<dyn TemperatureProbe>,
        camera: Box<dyn FrameCamera>,
        classifier: Box<dyn OccupancyClassifier>,
    ) -> Self {
        Self {
            probe,
            camera,
            classifier,
        }
    }

    /// Capture and classify one observation.
    pub async fn produce(&mut self) -> Result<Reading> {
        let temperature = self.probe.read_celsius()?;
        let frame = self.camera.capture_jpeg()?;
        debug!(temperature, frame_bytes = frame.len(), "frame captured");

        let classification = self.classifier.classify(&frame).await?;
        debug!(
            occupancy = %classification.occupancy,
            confidence = classification.confidence,
            "frame classified"
        );

        Ok(Reading::new(temperature, classification.occupancy))
    }
}
