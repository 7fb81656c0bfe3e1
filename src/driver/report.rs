//! What one invocation produced.

// self
use crate::{
	_prelude::*,
	poll::RefreshOutcome,
	sink::{LogLabels, LogRow, SinkError},
};

/// Fate of the rows handed to the log sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Persistence {
	/// No sink configured; rows were only returned.
	Disabled,
	/// Rows were appended.
	Written {
		/// Number of rows appended.
		rows: usize,
	},
	/// The sink failed; the refresh outcome is unaffected.
	Failed(SinkError),
}

/// Result of [`RefreshDriver::run`](crate::driver::RefreshDriver::run).
#[derive(Clone, Debug)]
pub struct RefreshReport {
	/// Server and model the rows are labeled with.
	pub labels: LogLabels,
	/// Terminal state of the refresh.
	pub outcome: RefreshOutcome,
	/// Rows in production order.
	pub rows: Vec<LogRow>,
	/// Operation URL, when the server supplied one.
	pub poll_url: Option<Url>,
	/// What happened to the rows on the way to the sink.
	pub persistence: Persistence,
}
impl RefreshReport {
	/// Whether the refresh succeeded, regardless of persistence.
	pub fn is_success(&self) -> bool {
		self.outcome.is_success()
	}

	/// Converts a non-successful outcome into the matching error.
	pub fn ensure_succeeded(&self) -> Result<()> {
		let model = self.labels.model.clone();

		match &self.outcome {
			RefreshOutcome::Succeeded => Ok(()),
			RefreshOutcome::Failed => Err(Error::RemoteJobFailed {
				model,
				poll_url: self.poll_url.as_ref().map(Url::to_string).unwrap_or_default(),
			}),
			RefreshOutcome::Conflict => Err(Error::Conflict { model }),
			RefreshOutcome::Unrecognized(status) =>
				Err(Error::UnknownStatus { status: status.clone() }),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn report(outcome: RefreshOutcome, persistence: Persistence) -> RefreshReport {
		RefreshReport {
			labels: LogLabels::new("aas-prod", "Sales"),
			outcome,
			rows: Vec::new(),
			poll_url: Url::parse("https://westeurope.asazure.windows.net/op/1").ok(),
			persistence,
		}
	}

	#[test]
	fn persistence_failure_keeps_success() {
		let report = report(
			RefreshOutcome::Succeeded,
			Persistence::Failed(SinkError::Backend { message: "disk full".into() }),
		);

		assert!(report.is_success());
		report.ensure_succeeded().expect("Sink failure must not fail the refresh.");
	}

	#[test]
	fn outcomes_map_to_errors() {
		let failed = report(RefreshOutcome::Failed, Persistence::Disabled);

		assert!(matches!(
			failed.ensure_succeeded(),
			Err(Error::RemoteJobFailed { model, poll_url })
				if model == "Sales" && poll_url == "https://westeurope.asazure.windows.net/op/1"
		));
		assert!(matches!(
			report(RefreshOutcome::Conflict, Persistence::Disabled).ensure_succeeded(),
			Err(Error::Conflict { .. })
		));
		assert!(matches!(
			report(RefreshOutcome::Unrecognized("cancelled".into()), Persistence::Disabled)
				.ensure_succeeded(),
			Err(Error::UnknownStatus { status }) if status == "cancelled"
		));
	}
}
