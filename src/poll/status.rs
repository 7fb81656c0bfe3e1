//! Body of a `GET <Location>` status check.

// self
use crate::{_prelude::*, obs::Stage};

/// Status document returned by the operation URL. Fields other than `status` are informative.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
	/// Remote state, e.g. `inProgress`, `succeeded`, `failed`.
	pub status: String,
	/// Refresh type echoed by the server.
	#[serde(default, rename = "type")]
	pub kind: Option<String>,
	/// When the operation started, as reported.
	#[serde(default)]
	pub start_time: Option<String>,
	/// When the operation ended, as reported.
	#[serde(default)]
	pub end_time: Option<String>,
}
impl RefreshStatus {
	/// Parses a status body, reporting the failing JSON path on error.
	pub fn from_slice(body: &[u8]) -> Result<Self> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::MalformedResponse { stage: Stage::Poll, source })
	}

	/// Classifies the status string case-insensitively.
	pub fn phase(&self) -> RemotePhase {
		match self.status.trim().to_ascii_lowercase().as_str() {
			"inprogress" | "notstarted" => RemotePhase::Running,
			"succeeded" => RemotePhase::Succeeded,
			"failed" => RemotePhase::Failed,
			_ => RemotePhase::Unrecognized(self.status.clone()),
		}
	}
}

/// Poller view of the remote state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemotePhase {
	/// Queued or running; keep polling.
	Running,
	/// Terminal success.
	Succeeded,
	/// Terminal failure.
	Failed,
	/// Anything else; treated as terminal.
	Unrecognized(String),
}
