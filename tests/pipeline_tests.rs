//! Integration tests for the parkwatch pipeline.
//!
//! These drive whole slices of the system through the public API: capture
//! cycles into a journal and a local sink, the archive reader over the
//! sink's output, and reports over the decoded readings.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use parkwatch::delivery::transport::{
    sink_line, HubTransport, LocalArchiveTransport, RecordingTransport, TransportError,
};
use parkwatch::hardware::{LogDisplay, SimulatedCamera, SimulatedProbe};
use parkwatch::vision::SimulatedClassifier;
use parkwatch::{
    aggregate, ArchiveReader, CaptureLoop, CycleOutcome, DeliveryClient, DirArchiveStore, Envelope,
    Journal, MemoryArchiveStore, Occupancy, Reading, ReadingProducer, RetryPolicy, TelemetryError,
    TemperatureProbe,
};
use tokio_util::sync::CancellationToken;

struct FailingProbe;

impl TemperatureProbe for FailingProbe {
    fn read_celsius(&mut self) -> parkwatch::Result<f64> {
        Err(TelemetryError::capture_error("sensor unplugged"))
    }
}

struct RejectingTransport;

#[async_trait]
impl HubTransport for RejectingTransport {
    async fn send(&self, _envelope: &Envelope) -> Result<(), TransportError> {
        Err(TransportError::Rejected {
            status: 403,
            reason: "token expired".to_string(),
        })
    }
}

fn simulated_producer() -> ReadingProducer {
    ReadingProducer::new(
        Box::new(SimulatedProbe::new(21.0)),
        Box::new(SimulatedCamera::new()),
        Box::new(SimulatedClassifier::new()),
    )
}

fn capture_loop(
    producer: ReadingProducer,
    transport: Box<dyn HubTransport>,
    journal_path: &std::path::Path,
) -> CaptureLoop {
    let shutdown = CancellationToken::new();
    let delivery = DeliveryClient::new(transport, RetryPolicy::default(), shutdown.clone());
    let journal = Journal::open(journal_path).unwrap();
    CaptureLoop::new(
        producer,
        journal,
        delivery,
        Box::new(LogDisplay::new()),
        Duration::from_secs(10),
        shutdown,
    )
}

#[tokio::test]
async fn test_capture_cycles_flow_into_journal_and_archive() {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("telemetry.log");
    let archive_dir = dir.path().join("archive");
    let sink_path = archive_dir.join("local").join("envelopes-00.json");

    let transport = LocalArchiveTransport::new(&sink_path).unwrap();
    let mut capture = capture_loop(simulated_producer(), Box::new(transport), &journal_path);

    let mut captured: Vec<Reading> = Vec::new();
    for _ in 0..3 {
        match capture.cycle().await {
            CycleOutcome::Completed {
                reading,
                journaled,
                delivered,
            } => {
                assert!(journaled);
                assert!(delivered);
                captured.push(reading);
            }
            other => panic!("expected a completed cycle, got {other:?}"),
        }
    }

    // Journal: one line per reading, in capture order.
    let journal_text = std::fs::read_to_string(&journal_path).unwrap();
    let lines: Vec<&str> = journal_text.lines().collect();
    assert_eq!(lines.len(), 3);
    for (line, reading) in lines.iter().zip(&captured) {
        assert!(
            line.ends_with(reading.occupancy.as_str()),
            "journal line {line:?} does not match {reading:?}"
        );
    }

    // Archive: every delivered envelope decodes back field for field.
    let reader = ArchiveReader::new(DirArchiveStore::new(&archive_dir));
    let scan = reader.read_all().await.unwrap();
    assert_eq!(scan.readings, captured);
    assert_eq!(scan.skipped_lines, 0);
    assert_eq!(scan.skipped_objects, 0);

    // Aggregates line up with what was captured.
    let report = aggregate(&scan.readings);
    assert_eq!(report.len(), 3);
    let counted: usize = report.category_counts.iter().map(|entry| entry.count).sum();
    assert_eq!(counted, 3);
    assert!(report
        .time_series
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[tokio::test]
async fn test_failed_capture_leaves_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("telemetry.log");

    let producer = ReadingProducer::new(
        Box::new(FailingProbe),
        Box::new(SimulatedCamera::new()),
        Box::new(SimulatedClassifier::new()),
    );
    let transport = RecordingTransport::new();
    let mut capture = capture_loop(producer, Box::new(transport.clone()), &journal_path);

    let outcome = capture.cycle().await;
    assert!(matches!(outcome, CycleOutcome::SkippedCapture));

    assert!(std::fs::read_to_string(&journal_path).unwrap().is_empty());
    assert_eq!(transport.sent_count(), 0);
}

#[tokio::test]
async fn test_rejected_delivery_still_reaches_the_journal() {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("telemetry.log");

    let mut capture = capture_loop(
        simulated_producer(),
        Box::new(RejectingTransport),
        &journal_path,
    );

    match capture.cycle().await {
        CycleOutcome::Completed {
            journaled,
            delivered,
            ..
        } => {
            assert!(journaled);
            assert!(!delivered);
        }
        other => panic!("expected a completed cycle, got {other:?}"),
    }

    let journal_text = std::fs::read_to_string(&journal_path).unwrap();
    assert_eq!(journal_text.lines().count(), 1);
}

#[tokio::test]
async fn test_archive_reader_survives_mixed_corruption() {
    let good: Vec<Reading> = (0..6)
        .map(|i| {
            Reading::new(
                18.0 + f64::from(i),
                Occupancy::FIXED[i as usize % Occupancy::FIXED.len()].clone(),
            )
        })
        .collect();

    let mut store = MemoryArchiveStore::new();
    let mut content = String::new();
    for reading in &good[..4] {
        content.push_str(&sink_line(&serde_json::to_vec(reading).unwrap()));
    }
    content.push_str("this line is not json\n");
    content.push_str("{\"Body\":\"###\"}\n");
    store.insert("2024/03/09/00.json", content);

    let mut more = String::new();
    more.push_str("{\"MissingBody\":1}\n");
    for reading in &good[4..] {
        more.push_str(&sink_line(&serde_json::to_vec(reading).unwrap()));
    }
    store.insert("2024/03/09/01.json", more);

    let reader = ArchiveReader::new(store);
    let scan = reader.read_all().await.unwrap();
    assert_eq!(scan.readings, good);
    assert_eq!(scan.skipped_lines, 3);

    // The lazy stream sees exactly the same readings.
    let streamed: Vec<Reading> = reader.stream().collect().await;
    assert_eq!(streamed, scan.readings);
}
