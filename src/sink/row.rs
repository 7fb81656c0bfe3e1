//! Log rows and the labels stamped on them.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::_prelude::*;

/// `Success_YN` column value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuccessFlag {
	/// Terminal success.
	#[serde(rename = "Y")]
	Yes,
	/// Progress or failure.
	#[serde(rename = "N")]
	No,
}
impl SuccessFlag {
	/// Single-letter column value.
	pub const fn as_str(self) -> &'static str {
		match self {
			SuccessFlag::Yes => "Y",
			SuccessFlag::No => "N",
		}
	}
}
impl Display for SuccessFlag {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One row of the refresh log table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
	/// UTC instant the row was produced.
	#[serde(rename = "Log_Timestamp", with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	/// Server label.
	#[serde(rename = "Server")]
	pub server: String,
	/// Model label.
	#[serde(rename = "Model")]
	pub model: String,
	/// Human-readable event.
	#[serde(rename = "Event_desc")]
	pub event_description: String,
	/// `Y` only for the succeeded terminal row.
	#[serde(rename = "Success_YN")]
	pub success: SuccessFlag,
}
impl Display for LogRow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let timestamp = self.timestamp.format(&Rfc3339).map_err(|_| std::fmt::Error)?;

		write!(
			f,
			"{timestamp} | {} | {} | {} | {}",
			self.server, self.model, self.event_description, self.success
		)
	}
}

/// Server and model labels applied to every row of one invocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogLabels {
	/// Server label.
	pub server: String,
	/// Model label.
	pub model: String,
}
impl LogLabels {
	/// Creates a label pair.
	pub fn new(server: impl Into<String>, model: impl Into<String>) -> Self {
		Self { server: server.into(), model: model.into() }
	}

	/// Stamps a new row with the current UTC time.
	pub fn row(&self, event_description: impl Into<String>, success: SuccessFlag) -> LogRow {
		LogRow {
			timestamp: OffsetDateTime::now_utc(),
			server: self.server.clone(),
			model: self.model.clone(),
			event_description: event_description.into(),
			success,
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn rows_serialize_with_column_names() {
		let row = LogRow {
			timestamp: datetime!(2025-03-01 06:30:00 UTC),
			server: "aas-prod".into(),
			model: "Sales".into(),
			event_description: "Model Sales refresh succeeded".into(),
			success: SuccessFlag::Yes,
		};

		assert_eq!(
			serde_json::to_value(&row).expect("Row should serialize."),
			serde_json::json!({
				"Log_Timestamp": "2025-03-01T06:30:00Z",
				"Server": "aas-prod",
				"Model": "Sales",
				"Event_desc": "Model Sales refresh succeeded",
				"Success_YN": "Y",
			})
		);
		assert_eq!(
			row.to_string(),
			"2025-03-01T06:30:00Z | aas-prod | Sales | Model Sales refresh succeeded | Y"
		);
	}

	#[test]
	fn labels_stamp_rows() {
		let row = LogLabels::new("aas-prod", "Sales")
			.row("Model Sales refresh in progress", SuccessFlag::No);

		assert_eq!(row.server, "aas-prod");
		assert_eq!(row.model, "Sales");
		assert_eq!(row.success, SuccessFlag::No);
		assert_eq!(row.timestamp.offset(), time::UtcOffset::UTC);
	}
}
