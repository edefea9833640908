//! Transports that move envelopes toward the hub.
//!
//! [`HttpHubTransport`] posts to the real ingestion endpoint.
//! [`LocalArchiveTransport`] stands in for the whole hub-plus-sink path on a
//! bench setup: it wraps envelopes exactly the way the archival sink does and
//! appends them to a local file the `report` command can read back.
//! [`RecordingTransport`] just remembers what it was given.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{SecondsFormat, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::delivery::Envelope;
use crate::error::TelemetryError;

/// Why a single send attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established or broke mid-request
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The hub rejected the message; retrying the same payload cannot help
    #[error("hub rejected the message (status {status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// The hub is throttling or failing; worth retrying after a backoff
    #[error("hub unavailable (status {status})")]
    Unavailable { status: u16 },

    /// A local stand-in transport hit an I/O error
    #[error("local sink error: {0}")]
    Io(String),

    /// Shutdown was requested while waiting to retry
    #[error("delivery interrupted by shutdown")]
    Interrupted,
}

impl TransportError {
    /// Whether another attempt at the same payload could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Connection(_)
            | TransportError::Timeout
            | TransportError::Unavailable { .. }
            | TransportError::Io(_) => true,
            TransportError::Rejected { .. } | TransportError::Interrupted => false,
        }
    }
}

/// One-shot delivery of an envelope. Implementations report failure per
/// attempt; retry policy lives in [`crate::delivery::DeliveryClient`].
#[async_trait]
pub trait HubTransport: Send + Sync {
    /// Attempt to deliver one envelope.
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError>;
}

/// HTTPS transport posting envelopes to the hub's ingestion endpoint.
pub struct HttpHubTransport {
    client: reqwest::Client,
    endpoint: Url,
    sas_token: String,
}

impl HttpHubTransport {
    /// Build a transport for the given endpoint.
    ///
    /// The SAS token is passed through opaquely in the `Authorization`
    /// header; generating or refreshing tokens is out of scope here.
    pub fn new(
        endpoint: &str,
        sas_token: &str,
        request_timeout: Duration,
    ) -> Result<Self, TelemetryError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| TelemetryError::config_error(format!("invalid hub endpoint: {err}")))?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| {
                TelemetryError::config_error(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            endpoint,
            sas_token: sas_token.to_string(),
        })
    }

    fn classify_status(status: StatusCode, reason: String) -> TransportError {
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            TransportError::Unavailable {
                status: status.as_u16(),
            }
        } else {
            TransportError::Rejected {
                status: status.as_u16(),
                reason,
            }
        }
    }
}

#[async_trait]
impl HubTransport for HttpHubTransport {
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, &self.sas_token)
            .header(CONTENT_TYPE, "application/json")
            .body(envelope.as_bytes().to_vec())
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(err.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, bytes = envelope.len(), "envelope accepted by hub");
            return Ok(());
        }

        let reason: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        Err(Self::classify_status(status, reason))
    }
}

/// Wrap payload bytes the way the hub's archival sink does: a one-line JSON
/// record whose `Body` field holds the base64 payload, stored without its
/// `=` padding.
pub fn sink_line(payload: &[u8]) -> String {
    let body = STANDARD.encode(payload);
    let record = serde_json::json!({
        "Body": body.trim_end_matches('='),
        "EnqueuedTimeUtc": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    });
    format!("{record}\n")
}

/// Appends sink-format records to a local file instead of talking to a hub.
///
/// Lets a device without credentials exercise the full capture-to-report
/// path: point `report --archive` at the file's directory afterwards.
pub struct LocalArchiveTransport {
    path: PathBuf,
}

impl LocalArchiveTransport {
    /// Create the transport, creating the file's parent directory if needed.
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Path of the file records are appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HubTransport for LocalArchiveTransport {
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let line = sink_line(envelope.as_bytes());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| TransportError::Io(err.to_string()))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| TransportError::Io(err.to_string()))?;
        debug!(path = %self.path.display(), bytes = envelope.len(), "envelope archived locally");
        Ok(())
    }
}

/// Transport that records every envelope it is handed and always succeeds.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every payload sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// How many payloads have been sent.
    pub fn sent_count(&self) -> usize {
        self.sent().len()
    }
}

#[async_trait]
impl HubTransport for RecordingTransport {
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let payload = envelope.as_bytes().to_vec();
        match self.sent.lock() {
            Ok(mut sent) => sent.push(payload),
            Err(poisoned) => poisoned.into_inner().push(payload),
        }
        debug!(bytes = envelope.len(), "envelope recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{Occupancy, Reading};

    #[test]
    fn test_retryable_classification() {
        assert!(TransportError::Connection("refused".into()).is_retryable());
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Unavailable { status: 503 }.is_retryable());
        assert!(TransportError::Io("disk full".into()).is_retryable());
        assert!(!TransportError::Rejected {
            status: 401,
            reason: "bad token".into()
        }
        .is_retryable());
        assert!(!TransportError::Interrupted.is_retryable());
    }

    #[test]
    fn test_status_classification() {
        let unavailable =
            HttpHubTransport::classify_status(StatusCode::SERVICE_UNAVAILABLE, String::new());
        assert!(matches!(unavailable, TransportError::Unavailable { status: 503 }));

        let throttled =
            HttpHubTransport::classify_status(StatusCode::TOO_MANY_REQUESTS, String::new());
        assert!(matches!(throttled, TransportError::Unavailable { status: 429 }));

        let rejected = HttpHubTransport::classify_status(StatusCode::UNAUTHORIZED, "bad token".into());
        assert!(matches!(rejected, TransportError::Rejected { status: 401, .. }));
    }

    #[test]
    fn test_sink_line_strips_base64_padding() {
        let line = sink_line(b"{\"temperature\":21.5}");
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        let body = value["Body"].as_str().unwrap();
        assert!(!body.ends_with('='));
        assert!(value["EnqueuedTimeUtc"].is_string());
    }

    #[tokio::test]
    async fn test_local_archive_transport_appends_sink_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink").join("envelopes-00.json");
        let transport = LocalArchiveTransport::new(&path).unwrap();

        let reading = Reading::new(20.0, Occupancy::MostlyFull);
        let envelope = Envelope::encode(&reading).unwrap();
        transport.send(&envelope).await.unwrap();
        transport.send(&envelope).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        for line in contents.lines() {
            let back = crate::archive::decode::decode_line(line).unwrap();
            assert_eq!(back, reading);
        }
    }

    #[tokio::test]
    async fn test_recording_transport_keeps_payloads_in_order() {
        let transport = RecordingTransport::new();
        let first = Envelope::encode(&Reading::new(18.0, Occupancy::CompletelyEmpty)).unwrap();
        let second = Envelope::encode(&Reading::new(19.0, Occupancy::HalfFull)).unwrap();

        transport.send(&first).await.unwrap();
        transport.send(&second).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], first.as_bytes());
        assert_eq!(sent[1], second.as_bytes());
    }
}
