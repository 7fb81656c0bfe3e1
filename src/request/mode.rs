//! Refresh mode selection and parsing.

// self
use crate::{_prelude::*, request::RefreshType};

/// Which refresh payload to send.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RefreshMode {
	/// Full refresh of every object in the model.
	#[default]
	Full,
	/// Default refresh: the server decides what needs processing.
	Default,
	/// Full refresh of selected tables or partitions.
	Table,
}
impl RefreshMode {
	/// Returns the lowercase mode label.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshMode::Full => "full",
			RefreshMode::Default => "default",
			RefreshMode::Table => "table",
		}
	}

	/// Refresh type sent in the request body for this mode.
	pub const fn refresh_type(self) -> RefreshType {
		match self {
			RefreshMode::Full | RefreshMode::Table => RefreshType::Full,
			RefreshMode::Default => RefreshType::Default,
		}
	}
}
impl Display for RefreshMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for RefreshMode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let lowered = s.trim().to_ascii_lowercase();

		match lowered.as_str() {
			"full" => Ok(Self::Full),
			"default" => Ok(Self::Default),
			"table" => Ok(Self::Table),
			_ => Err(Error::UnknownMode { mode: s.to_owned() }),
		}
	}
}
impl TryFrom<String> for RefreshMode {
	type Error = Error;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<RefreshMode> for String {
	fn from(value: RefreshMode) -> Self {
		value.as_str().into()
	}
}
