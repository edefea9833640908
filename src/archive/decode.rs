//! Decoding of archived sink records back into readings.
//!
//! The archival sink stores each delivered envelope as one JSON line whose
//! `Body` field holds the payload, base64-encoded and commonly stripped of
//! its `=` padding. Decoding peels the layers in order and reports exactly
//! which layer was broken.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use crate::telemetry::Reading;

/// Outer record written by the archival sink. Everything except the body is
/// sink metadata and is ignored.
#[derive(Debug, Deserialize)]
struct SinkRecord {
    #[serde(rename = "Body")]
    body: String,
}

/// Which decoding layer rejected an archived line.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The line is not a sink record (bad JSON or no `Body` field)
    #[error("invalid sink record: {0}")]
    Record(#[source] serde_json::Error),

    /// The body is not valid base64 even after padding restoration
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded body is not UTF-8 text
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The payload is not a valid reading
    #[error("invalid envelope payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Restore the `=` padding a sink strips from base64 text.
///
/// Appends `(4 - len % 4) % 4` padding characters, which is a no-op for
/// text whose length is already a multiple of four.
pub fn restore_padding(body: &str) -> String {
    let missing = (4 - body.len() % 4) % 4;
    let mut padded = String::with_capacity(body.len() + missing);
    padded.push_str(body);
    for _ in 0..missing {
        padded.push('=');
    }
    padded
}

/// Decode one archived line into a reading.
pub fn decode_line(line: &str) -> Result<Reading, DecodeError> {
    let record: SinkRecord = serde_json::from_str(line).map_err(DecodeError::Record)?;
    let payload = STANDARD.decode(restore_padding(&record.body))?;
    let payload = String::from_utf8(payload)?;
    let reading = serde_json::from_str(&payload).map_err(DecodeError::Payload)?;
    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Occupancy;
    use chrono::{TimeZone, Utc};

    fn sample_reading() -> Reading {
        Reading::at(
            Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap(),
            21.5,
            Occupancy::HalfFull,
        )
    }

    fn wrap(payload: &str, strip_padding: bool) -> String {
        let mut body = STANDARD.encode(payload);
        if strip_padding {
            while body.ends_with('=') {
                body.pop();
            }
        }
        format!("{{\"Body\":\"{body}\"}}")
    }

    #[test]
    fn test_restore_padding_all_residues() {
        // 0..=8 character bodies cover every len % 4 residue twice.
        for len in 0..=8 {
            let body: String = "A".repeat(len);
            let padded = restore_padding(&body);
            assert_eq!(padded.len() % 4, 0, "len {len} not padded to a multiple of 4");
            assert!(padded.starts_with(&body));
            assert!(padded[body.len()..].chars().all(|c| c == '='));
        }
    }

    #[test]
    fn test_restore_padding_leaves_aligned_text_alone() {
        assert_eq!(restore_padding("QUJD"), "QUJD");
        assert_eq!(restore_padding(""), "");
    }

    #[test]
    fn test_decode_line_with_stripped_padding() {
        let payload = serde_json::to_string(&sample_reading()).unwrap();
        let line = wrap(&payload, true);
        assert_eq!(decode_line(&line).unwrap(), sample_reading());
    }

    #[test]
    fn test_decode_line_with_intact_padding() {
        let payload = serde_json::to_string(&sample_reading()).unwrap();
        let line = wrap(&payload, false);
        assert_eq!(decode_line(&line).unwrap(), sample_reading());
    }

    #[test]
    fn test_decode_line_ignores_sink_metadata() {
        let payload = serde_json::to_string(&sample_reading()).unwrap();
        let body = STANDARD.encode(&payload);
        let line = format!(
            "{{\"EnqueuedTimeUtc\":\"2024-03-09T14:30:01Z\",\"Body\":\"{body}\",\"SystemProperties\":{{}}}}"
        );
        assert_eq!(decode_line(&line).unwrap(), sample_reading());
    }

    #[test]
    fn test_decode_rejects_non_json_line() {
        assert!(matches!(decode_line("not json"), Err(DecodeError::Record(_))));
    }

    #[test]
    fn test_decode_rejects_missing_body() {
        assert!(matches!(
            decode_line("{\"EnqueuedTimeUtc\":\"2024-03-09T14:30:01Z\"}"),
            Err(DecodeError::Record(_))
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(matches!(
            decode_line("{\"Body\":\"!!!not-base64!!!\"}"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_utf8_body() {
        let body = STANDARD.encode([0xFF, 0xFE, 0xFD]);
        let line = format!("{{\"Body\":\"{body}\"}}");
        assert!(matches!(decode_line(&line), Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        let line = wrap("{\"temperature\":\"not a number\"}", true);
        assert!(matches!(decode_line(&line), Err(DecodeError::Payload(_))));
    }
}
