//! JSON payload posted to the `refreshes` collection.

// std
use std::collections::BTreeMap;
// self
use crate::{_prelude::*, error::ValidationError, request::RefreshMode};

/// Parallelism hint sent unless overridden.
pub const DEFAULT_MAX_PARALLELISM: u32 = 2;
/// Remote retry count sent unless overridden.
pub const DEFAULT_RETRY_COUNT: u32 = 2;

/// Refresh type understood by the remote service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshType {
	/// Reload data and recalculate every targeted object.
	#[serde(rename = "Full")]
	Full,
	/// Let the server bring objects to a queryable state.
	#[serde(rename = "default")]
	Default,
}
impl RefreshType {
	/// Wire label of the refresh type.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshType::Full => "Full",
			RefreshType::Default => "default",
		}
	}
}
impl Display for RefreshType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transaction semantics of the remote refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitMode {
	/// All objects commit together or not at all.
	#[default]
	Transactional,
	/// Objects commit in batches.
	PartialBatch,
}

/// One table, optionally narrowed to a partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshObject {
	/// Table name.
	pub table: String,
	/// Partition name; the whole table refreshes when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub partition: Option<String>,
}

/// Caller-facing table selector: either `"Sales"` or `{ "Sales": "Sales_2024" }`.
///
/// Selectors in one list may mix both shapes; each element is normalized on its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableSelector {
	/// Whole table.
	Table(String),
	/// Single `table -> partition` entry.
	Partition(BTreeMap<String, String>),
}
impl TableSelector {
	/// Selector for a single partition of `table`.
	pub fn partition(table: impl Into<String>, partition: impl Into<String>) -> Self {
		Self::Partition(BTreeMap::from([(table.into(), partition.into())]))
	}

	/// Converts the selector into its request-body object.
	pub fn normalize(&self) -> Result<RefreshObject, ValidationError> {
		match self {
			TableSelector::Table(table) =>
				Ok(RefreshObject { table: non_empty(table)?, partition: None }),
			TableSelector::Partition(map) => {
				let mut entries = map.iter();
				let (Some((table, partition)), None) = (entries.next(), entries.next()) else {
					return Err(ValidationError::InvalidTableMapping { entries: map.len() });
				};

				Ok(RefreshObject {
					table: non_empty(table)?,
					partition: Some(non_empty(partition)?),
				})
			},
		}
	}
}
impl FromStr for TableSelector {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let selector = match s.split_once('=') {
			Some((table, partition)) => Self::partition(table.trim(), partition.trim()),
			None => Self::Table(s.trim().to_owned()),
		};

		selector.normalize()?;

		Ok(selector)
	}
}

/// Body of `POST .../refreshes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefreshRequest {
	/// Refresh type.
	#[serde(rename = "Type")]
	pub kind: RefreshType,
	/// Commit semantics.
	pub commit_mode: CommitMode,
	/// Maximum number of objects processed in parallel.
	pub max_parallelism: u32,
	/// Remote retry count; the client itself never retries.
	pub retry_count: u32,
	/// Targeted objects; empty means the whole model.
	pub objects: Vec<RefreshObject>,
}
impl RefreshRequest {
	/// Builds the body for `mode`.
	///
	/// `tables` is read only in table mode, where it must be non-empty. Input order is
	/// preserved in `Objects`.
	pub fn for_mode(mode: RefreshMode, tables: &[TableSelector]) -> Result<Self> {
		let objects = match mode {
			RefreshMode::Full | RefreshMode::Default => Vec::new(),
			RefreshMode::Table => {
				if tables.is_empty() {
					return Err(ValidationError::MissingTables.into());
				}

				tables.iter().map(TableSelector::normalize).collect::<Result<Vec<_>, _>>()?
			},
		};

		Ok(Self {
			kind: mode.refresh_type(),
			commit_mode: CommitMode::default(),
			max_parallelism: DEFAULT_MAX_PARALLELISM,
			retry_count: DEFAULT_RETRY_COUNT,
			objects,
		})
	}

	/// Overrides the commit mode.
	pub fn with_commit_mode(mut self, commit_mode: CommitMode) -> Self {
		self.commit_mode = commit_mode;

		self
	}

	/// Overrides the parallelism hint.
	pub fn with_max_parallelism(mut self, max_parallelism: u32) -> Self {
		self.max_parallelism = max_parallelism;

		self
	}

	/// Overrides the remote retry count.
	pub fn with_retry_count(mut self, retry_count: u32) -> Self {
		self.retry_count = retry_count;

		self
	}
}

fn non_empty(name: &str) -> Result<String, ValidationError> {
	let name = name.trim();

	if name.is_empty() {
		return Err(ValidationError::EmptyTableName);
	}

	Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn mixed_selectors_normalize_per_element() {
		let tables: Vec<TableSelector> =
			serde_json::from_str(r#"[{"Sales":"Sales_2024"},"Customers",{"Orders":"Current"}]"#)
				.expect("Mixed selector list should deserialize.");
		let request = RefreshRequest::for_mode(RefreshMode::Table, &tables)
			.expect("Table mode request should build.");

		assert_eq!(
			request.objects,
			vec![
				RefreshObject { table: "Sales".into(), partition: Some("Sales_2024".into()) },
				RefreshObject { table: "Customers".into(), partition: None },
				RefreshObject { table: "Orders".into(), partition: Some("Current".into()) },
			]
		);

		let plain_first: Vec<TableSelector> =
			serde_json::from_str(r#"["Customers",{"Sales":"Sales_2024"}]"#)
				.expect("Plain-first list should deserialize.");
		let request = RefreshRequest::for_mode(RefreshMode::Table, &plain_first)
			.expect("Table mode request should build.");

		assert_eq!(request.objects[1].partition.as_deref(), Some("Sales_2024"));
	}

	#[test]
	fn body_uses_wire_names() {
		let request =
			RefreshRequest::for_mode(RefreshMode::Table, &[TableSelector::Table("Sales".into())])
				.expect("Table mode request should build.");
		let value = serde_json::to_value(&request).expect("Body should serialize.");

		assert_eq!(
			value,
			serde_json::json!({
				"Type": "Full",
				"CommitMode": "transactional",
				"MaxParallelism": 2,
				"RetryCount": 2,
				"Objects": [{ "table": "Sales" }],
			})
		);

		let tuned = RefreshRequest::for_mode(RefreshMode::Full, &[])
			.expect("Full mode request should build.")
			.with_commit_mode(CommitMode::PartialBatch)
			.with_max_parallelism(8)
			.with_retry_count(0);
		let value = serde_json::to_value(&tuned).expect("Body should serialize.");

		assert_eq!(value["CommitMode"], "partialBatch");
		assert_eq!(value["MaxParallelism"], 8);
		assert_eq!(value["RetryCount"], 0);
		assert_eq!(value["Objects"], serde_json::json!([]));
	}

	#[test]
	fn table_mode_requires_tables() {
		let err = RefreshRequest::for_mode(RefreshMode::Table, &[])
			.expect_err("Empty table list should fail.");

		assert!(matches!(err, Error::Validation(ValidationError::MissingTables)));
	}

	#[test]
	fn non_table_modes_ignore_tables() {
		let request =
			RefreshRequest::for_mode(RefreshMode::Default, &[TableSelector::Table("Sales".into())])
				.expect("Default mode request should build.");

		assert!(request.objects.is_empty());
		assert_eq!(request.kind, RefreshType::Default);
	}

	#[test]
	fn mappings_need_exactly_one_entry() {
		let empty = TableSelector::Partition(BTreeMap::new());
		let double = TableSelector::Partition(BTreeMap::from([
			("A".to_owned(), "1".to_owned()),
			("B".to_owned(), "2".to_owned()),
		]));

		assert!(matches!(
			empty.normalize(),
			Err(ValidationError::InvalidTableMapping { entries: 0 })
		));
		assert!(matches!(
			double.normalize(),
			Err(ValidationError::InvalidTableMapping { entries: 2 })
		));
		assert!(matches!(
			TableSelector::partition("Sales", " ").normalize(),
			Err(ValidationError::EmptyTableName)
		));
	}

	#[test]
	fn selectors_parse_from_flags() {
		assert_eq!(
			"Sales".parse::<TableSelector>().expect("Bare table should parse."),
			TableSelector::Table("Sales".into())
		);
		assert_eq!(
			"Sales = Sales_2024".parse::<TableSelector>().expect("Partition flag should parse."),
			TableSelector::partition("Sales", "Sales_2024")
		);
		assert!("=Part".parse::<TableSelector>().is_err());
	}
}
