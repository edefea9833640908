//! The periodic capture loop.
//!
//! Every cycle produces a reading, journals it, offers it for delivery and
//! shows it on the local display. The stages are isolated: a failed capture
//! skips the cycle, while journal, delivery or display failures are logged
//! and the remaining stages still run. Nothing a single cycle does can take
//! the loop down.

pub mod journal;

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::delivery::{DeliveryClient, Envelope, SendOutcome};
use crate::telemetry::{Reading, ReadingDisplay, ReadingProducer};

pub use journal::Journal;

/// What one cycle accomplished.
#[derive(Debug)]
pub enum CycleOutcome {
    /// A reading was produced; the flags say which downstream stages took it
    Completed {
        /// The reading this cycle produced
        reading: Reading,
        /// Whether the journal append succeeded
        journaled: bool,
        /// Whether the hub accepted the envelope
        delivered: bool,
    },
    /// Capture failed, so there was nothing to journal or deliver
    SkippedCapture,
}

/// Periodic capture pipeline tying all the stages together.
pub struct CaptureLoop {
    producer: ReadingProducer,
    journal: Journal,
    delivery: DeliveryClient,
    display: Box<dyn ReadingDisplay>,
    period: Duration,
    shutdown: CancellationToken,
}

impl CaptureLoop {
    /// Assemble the loop from its stages.
    pub fn new(
        producer: ReadingProducer,
        journal: Journal,
        delivery: DeliveryClient,
        display: Box<dyn ReadingDisplay>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            producer,
            journal,
            delivery,
            display,
            period,
            shutdown,
        }
    }

    /// Run cycles on the configured period until shutdown is requested.
    ///
    /// The first cycle starts immediately. If a cycle overruns the period,
    /// the next one is delayed rather than fired in a burst.
    pub async fn run(mut self) {
        info!(period = ?self.period, journal = %self.journal.path().display(), "capture loop started");
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.cycle().await;
                }
            }
        }

        self.release();
        info!("capture loop stopped");
    }

    /// Run exactly one cycle, then release the display.
    pub async fn run_once(mut self) -> CycleOutcome {
        let outcome = self.cycle().await;
        self.release();
        outcome
    }

    /// Execute one capture-journal-deliver-display cycle.
    pub async fn cycle(&mut self) -> CycleOutcome {
        let reading = match self.producer.produce().await {
            Ok(reading) => reading,
            Err(err) => {
                warn!(%err, "capture failed; skipping this cycle");
                return CycleOutcome::SkippedCapture;
            }
        };
        info!(
            temperature = reading.temperature,
            occupancy = %reading.occupancy,
            "reading captured"
        );

        let journaled = match self.journal.append(&reading) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    %err,
                    path = %self.journal.path().display(),
                    "journal append failed; still attempting delivery"
                );
                false
            }
        };

        let delivered = match Envelope::encode(&reading) {
            Ok(envelope) => match self.delivery.send(&envelope).await {
                SendOutcome::Delivered { attempts } => {
                    info!(attempts, "reading delivered");
                    true
                }
                SendOutcome::Failed { attempts, error } => {
                    warn!(attempts, %error, "delivery failed; reading remains in the journal");
                    false
                }
            },
            Err(err) => {
                warn!(%err, "could not encode envelope; delivery skipped");
                false
            }
        };

        if let Err(err) = self.display.show(&reading) {
            warn!(%err, "display update failed");
        }

        CycleOutcome::Completed {
            reading,
            journaled,
            delivered,
        }
    }

    fn release(&mut self) {
        if let Err(err) = self.display.clear() {
            warn!(%err, "failed to clear display on shutdown");
        }
    }
}
