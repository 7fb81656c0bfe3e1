//! Observability helpers for the refresh pipeline.
//!
//! Every stage runs inside a `tracing` span named `aas_refresh.stage` carrying the `stage`,
//! `server`, and `model` fields. Enable the `metrics` feature to increment the
//! `aas_refresh_stage_total` counter for every attempt/success/failure, labeled by
//! `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Client-credentials token exchange with the identity provider.
	Authenticate,
	/// Refresh request submission.
	Submit,
	/// Status polling of an accepted operation.
	Poll,
	/// Log row persistence.
	Persist,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Authenticate => "authenticate",
			Stage::Submit => "submit",
			Stage::Poll => "poll",
			Stage::Persist => "persist",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a stage span and records attempt/success/failure outcomes.
pub async fn observe<T, Fut>(span: StageSpan, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let stage = span.stage();

	record_stage_outcome(stage, StageOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_stage_outcome(stage, StageOutcome::Success),
		Err(_) => record_stage_outcome(stage, StageOutcome::Failure),
	}

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(Stage::Authenticate.to_string(), "authenticate");
		assert_eq!(Stage::Persist.as_str(), "persist");
		assert_eq!(StageOutcome::Failure.to_string(), "failure");
	}

	#[tokio::test]
	async fn observe_passes_results_through() {
		let span = StageSpan::new(Stage::Submit, "aas-server", "Sales");
		let value = observe(span, async { Ok(7) }).await.expect("Observed future should succeed.");

		assert_eq!(value, 7);

		let span = StageSpan::new(Stage::Poll, "aas-server", "Sales");
		let err = observe::<(), _>(span, async { Err(Error::MissingLocation) })
			.await
			.expect_err("Observed failure should propagate.");

		assert!(matches!(err, Error::MissingLocation));
	}
}
