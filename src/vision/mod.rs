//! Occupancy classification of camera frames.
//!
//! The production classifier posts the raw JPEG to a hosted vision model
//! and keeps whichever tag the model scored highest. The simulated one
//! cycles through the known categories so the rest of the pipeline can run
//! anywhere.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TelemetryError};
use crate::telemetry::{Classification, Occupancy, OccupancyClassifier};

/// Header carrying the vision service's API key.
const PREDICTION_KEY_HEADER: &str = "Prediction-Key";

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(rename = "tagName")]
    tag_name: String,
    probability: f64,
}

fn best_prediction(predictions: Vec<Prediction>) -> Option<Prediction> {
    predictions
        .into_iter()
        .max_by(|a, b| a.probability.total_cmp(&b.probability))
}

/// Classifier backed by a hosted vision model's prediction endpoint.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    prediction_key: String,
}

impl HttpClassifier {
    /// Build a classifier for the given prediction endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        prediction_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| {
                TelemetryError::config_error(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            prediction_key: prediction_key.into(),
        })
    }
}

#[async_trait]
impl OccupancyClassifier for HttpClassifier {
    async fn classify(&self, jpeg: &[u8]) -> Result<Classification> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(PREDICTION_KEY_HEADER, &self.prediction_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(jpeg.to_vec())
            .send()
            .await
            .map_err(|err| {
                TelemetryError::classification_error(format!("vision request failed: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::classification_error(format!(
                "vision service returned status {status}"
            )));
        }

        let parsed: PredictionResponse = response.json().await.map_err(|err| {
            TelemetryError::classification_error(format!("invalid vision response: {err}"))
        })?;
        let top = best_prediction(parsed.predictions).ok_or_else(|| {
            TelemetryError::classification_error("vision service returned no predictions")
        })?;

        debug!(tag = %top.tag_name, probability = top.probability, "frame scored");
        Ok(Classification {
            occupancy: Occupancy::parse(&top.tag_name),
            confidence: top.probability,
        })
    }
}

/// Classifier that cycles through the known categories.
#[derive(Debug, Default)]
pub struct SimulatedClassifier {
    calls: AtomicUsize,
}

impl SimulatedClassifier {
    /// Create the simulated classifier.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OccupancyClassifier for SimulatedClassifier {
    async fn classify(&self, _jpeg: &[u8]) -> Result<Classification> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let occupancy = Occupancy::FIXED[call % Occupancy::FIXED.len()].clone();
        Ok(Classification {
            occupancy,
            confidence: 0.97,
        })
    }
}
