//! Append-only destinations for refresh log rows.

pub mod file;
pub mod memory;
pub mod row;

pub use file::FileLogSink;
pub use memory::MemoryLogSink;
pub use row::*;

// self
use crate::_prelude::*;

/// Future returned by [`LogSink::append`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + 'a + Send>>;

/// Append-only tabular store receiving one batch of rows per invocation.
pub trait LogSink
where
	Self: Send + Sync,
{
	/// Appends `rows` after any rows already stored. Existing rows are never rewritten.
	fn append<'a>(&'a self, rows: &'a [LogRow]) -> SinkFuture<'a>;
}

/// Error type produced by [`LogSink`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SinkError {
	/// Rows could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
