use std::time::Duration;

use thiserror::Error;

/// Errors raised by executor primitives.
#[derive(Debug, Error)]
pub enum WorkerError {
	/// The serial executor did not become idle before the deadline.
	#[error("executor `{name}` still had {pending} queued task(s) after {timeout:?}")]
	IdleTimeout { name: String, pending: usize, timeout: Duration },

	/// The looper thread could not be started.
	#[error("failed to spawn looper thread `{name}`: {source}")]
	LooperSpawn {
		name: String,
		#[source]
		source: std::io::Error,
	},
}

pub type Result<T> = std::result::Result<T, WorkerError>;
