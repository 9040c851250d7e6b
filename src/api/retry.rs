use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::DeviceError;

/// Bounded, sequential retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn once() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }

    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Run `op` until it succeeds or the attempt budget is spent. `op`
    /// receives the 1-based attempt number. With more than one attempt the
    /// final error is wrapped in [`DeviceError::Exhausted`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, DeviceError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, DeviceError>>,
    {
        let attempts = self.attempts.max(1);
        let mut last = None;

        for attempt in 1..=attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!(attempt, attempts, error = %err, "attempt failed");
                    last = Some(err);
                    if attempt < attempts && !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }

        let last = last.unwrap_or_else(|| DeviceError::Offline("no attempt made".into()));
        if attempts == 1 {
            Err(last)
        } else {
            Err(DeviceError::Exhausted {
                attempts,
                last: Box::new(last),
            })
        }
    }
}
