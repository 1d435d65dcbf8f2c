//! Job executors: the seam between a page's state machine and whatever
//! actually produces results.

use async_trait::async_trait;
use chemdeck_common::Result;
use std::time::Duration;
use tracing::debug;

/// Runs one job to completion.
///
/// Implementations must be cancel-safe: the runner aborts the task driving
/// `execute` when a page is reset or torn down.
#[async_trait]
pub trait JobExecutor<I, R>: Send + Sync {
    async fn execute(&self, input: I) -> Result<R>;

    /// Short label for logs.
    fn name(&self) -> &str { "executor" }
}

/// Waits a fixed duration, then returns deterministic output.
pub struct FixedDelayExecutor<F> {
    delay: Duration,
    produce: F,
}

impl<F> FixedDelayExecutor<F> {
    pub fn new(delay: Duration, produce: F) -> Self {
        Self { delay, produce }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl<I, R, F> JobExecutor<I, R> for FixedDelayExecutor<F>
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(I) -> R + Send + Sync,
{
    async fn execute(&self, input: I) -> Result<R> {
        debug!("Simulating job for {:?}", self.delay);
        tokio::time::sleep(self.delay).await;
        Ok((self.produce)(input))
    }

    fn name(&self) -> &str { "fixed_delay" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_waits_then_produces() {
        let exec = FixedDelayExecutor::new(Duration::from_millis(1500), |n: u32| n * 2);
        let start = Instant::now();
        let out = JobExecutor::<u32, u32>::execute(&exec, 21).await.unwrap();
        assert_eq!(out, 42);
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }
}
