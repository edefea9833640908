//! Bounded-retry delivery of envelopes to the cloud hub.
//!
//! The client makes at most `max_retries` attempts per envelope with
//! exponential backoff between them, reports the outcome explicitly through
//! [`SendOutcome`], and never panics the pipeline over an unreachable hub.

pub mod envelope;
pub mod transport;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use envelope::Envelope;
pub use transport::{HubTransport, TransportError};

/// How delivery retries are paced.
///
/// `max_retries` bounds the *total* number of attempts. After the i-th
/// failed attempt (0-based) the client sleeps `initial_delay * 2^i`, so the
/// defaults give delays of 1s and 2s between three attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per envelope, first try included
    pub max_retries: u32,
    /// Backoff before the second attempt; doubles each retry
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::DEFAULT_MAX_RETRIES,
            initial_delay: crate::DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit bounds.
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Backoff to sleep after the given 0-based failed attempt.
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(failed_attempt))
    }
}

/// Explicit result of delivering one envelope.
#[derive(Debug)]
pub enum SendOutcome {
    /// The hub accepted the envelope
    Delivered {
        /// Attempts it took, including the successful one
        attempts: u32,
    },
    /// All attempts were exhausted, or the failure was not worth retrying
    Failed {
        /// Attempts made before giving up
        attempts: u32,
        /// The error from the final attempt
        error: TransportError,
    },
}

impl SendOutcome {
    /// Whether the envelope reached the hub.
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered { .. })
    }

    /// Attempts made, regardless of outcome.
    pub fn attempts(&self) -> u32 {
        match self {
            SendOutcome::Delivered { attempts } | SendOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Delivers envelopes through a [`HubTransport`] with bounded retries.
pub struct DeliveryClient {
    transport: Box<dyn HubTransport>,
    policy: RetryPolicy,
    shutdown: CancellationToken,
}

impl DeliveryClient {
    /// Create a client over the given transport.
    pub fn new(
        transport: Box<dyn HubTransport>,
        policy: RetryPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            transport,
            policy,
            shutdown,
        }
    }

    /// Deliver one envelope, retrying per the policy.
    ///
    /// Returns after the first success, after a non-retryable failure, after
    /// `max_retries` attempts, or as soon as shutdown interrupts a backoff
    /// sleep. Never waits out a pending backoff during shutdown.
    pub async fn send(&self, envelope: &Envelope) -> SendOutcome {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let error = match self.transport.send(envelope).await {
                Ok(()) => {
                    debug!(attempts, "envelope delivered");
                    return SendOutcome::Delivered { attempts };
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                return SendOutcome::Failed { attempts, error };
            }
            if attempts >= self.policy.max_retries {
                return SendOutcome::Failed { attempts, error };
            }

            let delay = self.policy.delay_for(attempts - 1);
            warn!(
                attempt = attempts,
                max_retries = self.policy.max_retries,
                %error,
                ?delay,
                "send attempt failed; backing off"
            );
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return SendOutcome::Failed {
                        attempts,
                        error: TransportError::Interrupted,
                    };
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
