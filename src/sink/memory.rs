//! In-memory [`LogSink`] for tests and demos.

// self
use crate::{
	_prelude::*,
	sink::{LogRow, LogSink, SinkFuture},
};

/// Keeps appended rows in process memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryLogSink(Arc<Mutex<Vec<LogRow>>>);
impl MemoryLogSink {
	/// Returns a snapshot of every row appended so far.
	pub fn rows(&self) -> Vec<LogRow> {
		self.0.lock().clone()
	}
}
impl LogSink for MemoryLogSink {
	fn append<'a>(&'a self, rows: &'a [LogRow]) -> SinkFuture<'a> {
		Box::pin(async move {
			self.0.lock().extend_from_slice(rows);

			Ok(())
		})
	}
}
