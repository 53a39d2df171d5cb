//! Bounded retry with exponential back-off for address resolution.
//!
//! Each attempt reports a [`GeocodeOutcome`]. Only
//! [`GeocodeOutcome::TransientFailure`] is retried; a found coordinate or an
//! empty result ends the loop at once. When the attempt budget runs out the
//! caller gets `None` and an error is logged, never raised.

use std::future::Future;
use std::time::Duration;

use carpool_core::{Coordinate, Diagnostics};

use crate::error::GeocodeError;

/// Result of a single lookup against the geocoding service.
#[derive(Debug)]
pub enum GeocodeOutcome {
    Found(Coordinate),
    /// The service answered successfully with zero results.
    NotFound,
    /// Transport failure, non-2xx status, or an unreadable body.
    TransientFailure(GeocodeError),
}

/// Suspends the caller between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Attempt budget and back-off schedule.
///
/// With `max_attempts = 3` and `base_delay = 1s` the schedule is:
///
/// | Attempt | Sleep after failure |
/// |---------|---------------------|
/// | 1       | 1 s                 |
/// | 2       | 2 s                 |
/// | 3       | none (give up)      |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed `attempt` (1-based): `base * 2^(attempt-1)`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

/// Runs `attempt_fn` until it finds a coordinate, reports no results, or the
/// attempt budget is spent.
///
/// `label` identifies the lookup in diagnostics (usually the address).
pub(crate) async fn resolve_with_backoff<S, D, F, Fut>(
    policy: RetryPolicy,
    sleeper: &S,
    diagnostics: &D,
    label: &str,
    mut attempt_fn: F,
) -> Option<Coordinate>
where
    S: Sleeper,
    D: Diagnostics,
    F: FnMut() -> Fut,
    Fut: Future<Output = GeocodeOutcome>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match attempt_fn().await {
            GeocodeOutcome::Found(coordinate) => return Some(coordinate),
            GeocodeOutcome::NotFound => {
                diagnostics.info(&format!("No geocoding results found for: {label}"));
                return None;
            }
            GeocodeOutcome::TransientFailure(err) => {
                diagnostics.warn(&format!("Geocoding attempt {attempt} failed: {err}"));
                if attempt < max_attempts {
                    sleeper.sleep(policy.delay_after(attempt)).await;
                }
            }
        }
    }

    diagnostics.error(&format!(
        "Geocoding failed after {max_attempts} attempts for: {label}"
    ));
    None
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::time::Duration;

    use carpool_core::Diagnostics;

    use super::Sleeper;

    /// Records requested delays and returns immediately.
    #[derive(Debug, Default)]
    pub struct RecordingSleeper {
        pub delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().expect("delays lock").push(duration);
        }
    }

    /// Collects `(level, message)` pairs.
    #[derive(Debug, Default)]
    pub struct RecordingDiagnostics {
        pub events: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingDiagnostics {
        pub fn levels(&self) -> Vec<&'static str> {
            self.events
                .lock()
                .expect("events lock")
                .iter()
                .map(|(level, _)| *level)
                .collect()
        }
    }

    impl Diagnostics for RecordingDiagnostics {
        fn info(&self, message: &str) {
            self.events
                .lock()
                .expect("events lock")
                .push(("info", message.to_string()));
        }

        fn warn(&self, message: &str) {
            self.events
                .lock()
                .expect("events lock")
                .push(("warn", message.to_string()));
        }

        fn error(&self, message: &str) {
            self.events
                .lock()
                .expect("events lock")
                .push(("error", message.to_string()));
        }
    }
}
