//! Pauses between poll ticks.

// self
use crate::_prelude::*;

/// Future returned by [`Sleeper::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Waits between two status checks.
pub trait Sleeper
where
	Self: Send + Sync,
{
	/// Completes after `duration`.
	fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// Sleeper backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;
impl Sleeper for TokioSleeper {
	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		Box::pin(tokio::time::sleep(duration))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn tokio_sleeper_advances_virtual_time() {
		let started = tokio::time::Instant::now();

		TokioSleeper.sleep(Duration::from_secs(30)).await;

		assert!(started.elapsed() >= Duration::from_secs(30));
	}
}
