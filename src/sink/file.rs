//! JSON Lines file sink for unattended runs.

// std
use std::{
	fs::{self, OpenOptions},
	io::Write,
};
// self
use crate::{
	_prelude::*,
	sink::{LogRow, LogSink, SinkError, SinkFuture},
};

/// Appends rows to a JSON Lines file, one object per row.
#[derive(Clone, Debug)]
pub struct FileLogSink {
	path: PathBuf,
	lock: Arc<Mutex<()>>,
}
impl FileLogSink {
	/// Targets `path`, creating its parent directories when missing.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, lock: Default::default() })
	}

	/// File receiving the rows.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads every row stored so far. Unknown fields are ignored.
	pub fn load(&self) -> Result<Vec<LogRow>, SinkError> {
		let _guard = self.lock.lock();

		if !self.path.exists() {
			return Ok(Vec::new());
		}

		let contents = fs::read_to_string(&self.path).map_err(|e| SinkError::Backend {
			message: format!("Failed to read {}: {e}", self.path.display()),
		})?;

		contents
			.lines()
			.filter(|line| !line.trim().is_empty())
			.map(|line| {
				serde_json::from_str(line).map_err(|e| SinkError::Serialization {
					message: format!("Failed to parse {}: {e}", self.path.display()),
				})
			})
			.collect()
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), SinkError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| SinkError::Backend {
				message: format!("Failed to create log directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn append_locked(&self, rows: &[LogRow]) -> Result<(), SinkError> {
		let mut buffer = Vec::new();

		for row in rows {
			serde_json::to_writer(&mut buffer, row).map_err(|e| SinkError::Serialization {
				message: format!("Failed to serialize log row: {e}"),
			})?;
			buffer.push(b'\n');
		}

		Self::ensure_parent_exists(&self.path)?;

		let mut file =
			OpenOptions::new().create(true).append(true).open(&self.path).map_err(|e| {
				let message = format!("Failed to open {}: {e}", self.path.display());

				SinkError::Backend { message }
			})?;

		file.write_all(&buffer).map_err(|e| SinkError::Backend {
			message: format!("Failed to write {}: {e}", self.path.display()),
		})?;
		file.sync_all().map_err(|e| SinkError::Backend {
			message: format!("Failed to sync {}: {e}", self.path.display()),
		})
	}
}
impl LogSink for FileLogSink {
	fn append<'a>(&'a self, rows: &'a [LogRow]) -> SinkFuture<'a> {
		Box::pin(async move {
			let _guard = self.lock.lock();

			self.append_locked(rows)
		})
	}
}
