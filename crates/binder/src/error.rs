//! Error types for binding and configuration.

use std::path::PathBuf;

use pagebind_model::{Container, ItemId};
use thiserror::Error;

/// Contract violations that abort a bind cycle under a strict policy.
///
/// A stale unit is not an error: it is absorbed inside the scheduler and
/// reported as [`crate::UnitOutcome::Stale`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
	/// A consumer returned no visible-page set.
	#[error("consumer `{consumer}` returned no visible-page set")]
	NullContract { consumer: String },

	/// An item sits in a container the pipeline does not recognize.
	#[error("item {item} has unrecognized container {container}")]
	UnknownContainer { item: ItemId, container: Container },

	/// A recognized container holds an item whose position it cannot order,
	/// such as a ranked item on the grid.
	#[error("item {item} has a position {container} cannot order")]
	MisplacedItem { item: ItemId, container: Container },

	/// A one-shot list was fired or released a second time.
	#[error("{what} fired more than once")]
	DoubleCompletion { what: &'static str },

	/// An action was appended to a one-shot list after it fired.
	#[error("action appended to {what} after it fired")]
	AppendAfterFire { what: &'static str },
}

/// Errors that can occur when loading binder configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// TOML syntax or schema error.
	#[error("config parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A field holds a value outside its allowed range.
	#[error("invalid config value for `{field}`: {reason}")]
	Invalid { field: &'static str, reason: String },
}

/// Result type for binding operations.
pub type Result<T> = std::result::Result<T, BindError>;
