//! # 🅿️ Parkwatch
//!
//! Parking-lot telemetry for Raspberry Pi: every few seconds the device
//! samples the ambient temperature, photographs the lot, asks a hosted
//! vision model how full it looks, journals the reading locally, shows it
//! on a little LCD and delivers it to a cloud hub with bounded retries.
//! Later, away from the device, the same crate decodes the hub's archival
//! store back into readings and aggregates them into reports.
//!
//! ## Features
//!
//! - **Capture loop**: periodic sensor + camera + classifier cycles that
//!   survive any single failure
//! - **Durable journal**: one flushed line per reading, append-only
//! - **Bounded delivery**: exponential backoff, explicit outcomes, clean
//!   shutdown mid-backoff
//! - **Archive reader**: tolerant line-by-line decoding of base64-wrapped
//!   sink records
//! - **Reports**: stable time series, fixed-category counts, per-day
//!   breakdowns
//! - **Runs anywhere**: simulated sensor, camera and classifier built in;
//!   the LCD driver sits behind the `hardware` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use parkwatch::delivery::transport::LocalArchiveTransport;
//! use parkwatch::hardware::{LogDisplay, SimulatedCamera, SimulatedProbe};
//! use parkwatch::vision::SimulatedClassifier;
//! use parkwatch::{CaptureLoop, DeliveryClient, Journal, ReadingProducer, RetryPolicy};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let shutdown = CancellationToken::new();
//!
//!     let producer = ReadingProducer::new(
//!         Box::new(SimulatedProbe::new(21.0)),
//!         Box::new(SimulatedCamera::new()),
//!         Box::new(SimulatedClassifier::new()),
//!     );
//!     let journal = Journal::open("telemetry.log")?;
//!     let transport = LocalArchiveTransport::new("archive/local/envelopes-00.json")?;
//!     let delivery =
//!         DeliveryClient::new(Box::new(transport), RetryPolicy::default(), shutdown.clone());
//!
//!     CaptureLoop::new(
//!         producer,
//!         journal,
//!         delivery,
//!         Box::new(LogDisplay::new()),
//!         Duration::from_secs(10),
//!         shutdown,
//!     )
//!     .run()
//!     .await;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod capture;
pub mod config;
pub mod delivery;
pub mod error;
pub mod hardware;
pub mod report;
pub mod telemetry;
pub mod vision;

// Re-export public API
pub use archive::{
    ArchiveReader, ArchiveScan, ArchiveStore, DecodeError, DirArchiveStore, MemoryArchiveStore,
};
pub use capture::{CaptureLoop, CycleOutcome, Journal};
pub use config::AppConfig;
pub use delivery::{
    DeliveryClient, Envelope, HubTransport, RetryPolicy, SendOutcome, TransportError,
};
pub use error::{Result, TelemetryError};
pub use report::{aggregate, CategoryCount, DailyCounts, Report};
pub use telemetry::{
    Classification, FrameCamera, Occupancy, OccupancyClassifier, Reading, ReadingDisplay,
    ReadingProducer, TemperatureProbe,
};

use std::time::Duration;

/// The default time between capture cycles
pub const DEFAULT_CAPTURE_PERIOD: Duration = Duration::from_secs(10);

/// The default total number of send attempts per envelope
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// The default backoff before the second send attempt
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// The default size of the "latest readings" window in reports
pub const DEFAULT_REPORT_LATEST: usize = 22;
