//! Delay between a recoverable disconnect and the next session.

use std::time::Duration;

use crate::config::ReconnectStrategy;

/// Tracks consecutive restarts and computes how long to wait before the next one.
#[derive(Debug, Clone)]
pub struct Reconnect {
    strategy: ReconnectStrategy,
    attempt: u32,
}

impl Reconnect {
    /// Creates a tracker for `strategy`.
    #[must_use]
    pub const fn new(strategy: ReconnectStrategy) -> Reconnect {
        Reconnect {
            strategy,
            attempt: 0,
        }
    }

    /// The number of restarts since the last successful connection.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Registers a restart and returns the delay to wait before it.
    pub fn next_delay(&mut self) -> Duration {
        let attempt = self.attempt;
        self.attempt = self.attempt.saturating_add(1);

        match self.strategy {
            ReconnectStrategy::Immediate => Duration::ZERO,
            ReconnectStrategy::Backoff {
                initial,
                max,
                jitter,
            } => {
                let delay = backoff(initial, max, attempt);

                if jitter {
                    delay.mul_f64(rand::random::<f64>())
                } else {
                    delay
                }
            }
        }
    }

    /// Forgets previous attempts once a connection has opened.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Returns `initial * 2^attempt`, capped at `max`.
fn backoff(initial: Duration, max: Duration, attempt: u32) -> Duration {
    initial
        .checked_mul(2u32.saturating_pow(attempt))
        .map_or(max, |delay| delay.min(max))
}
