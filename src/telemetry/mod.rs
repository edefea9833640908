//! Telemetry data model and capture seams.
//!
//! This module defines the record type flowing through the pipeline and the
//! traits behind which sensors, camera, classifier and display sit.

pub mod producer;
pub mod reading;
pub mod traits;

pub use producer::ReadingProducer;
pub use reading::{Classification, Occupancy, Reading};
pub use traits::{FrameCamera, OccupancyClassifier, ReadingDisplay, TemperatureProbe};
