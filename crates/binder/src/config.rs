//! Binder configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! chunk_size = 6
//! widget_chunk_size = 1
//! async_materialization = false
//! first_page_pinned_toggle = false
//! contract_policy = "strict"
//! unknown_container = "fatal"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, ConfigError};

/// Plain-item batch size; small enough that one batch stays under a frame.
pub const DEFAULT_CHUNK_SIZE: usize = 6;

/// Widgets bind one per batch.
pub const DEFAULT_WIDGET_CHUNK_SIZE: usize = 1;

/// How contract violations are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractPolicy {
	/// Fail the operation and abort the bind cycle.
	Strict,
	/// Log and degrade to a no-op.
	Lenient,
}

impl Default for ContractPolicy {
	fn default() -> Self {
		if cfg!(debug_assertions) { Self::Strict } else { Self::Lenient }
	}
}

impl ContractPolicy {
	/// Surfaces `err` under [`Self::Strict`], swallows it under [`Self::Lenient`].
	pub fn enforce(self, err: BindError) -> Result<(), BindError> {
		match self {
			Self::Strict => {
				tracing::error!(%err, "binding contract violated");
				Err(err)
			}
			Self::Lenient => {
				tracing::warn!(%err, "binding contract violated; ignoring");
				Ok(())
			}
		}
	}
}

/// How items in unrecognized containers are ordered and partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownContainerPolicy {
	/// Raise [`BindError::UnknownContainer`].
	Fatal,
	/// Drop from partitions; sort with rank 0.
	DefaultRank,
}

impl Default for UnknownContainerPolicy {
	fn default() -> Self {
		if cfg!(debug_assertions) { Self::Fatal } else { Self::DefaultRank }
	}
}

/// Tunables consumed by [`crate::ModelBinder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinderConfig {
	/// Plain items per chunked batch.
	pub chunk_size: usize,
	/// Widgets per chunked batch.
	pub widget_chunk_size: usize,
	/// Materialize items on the background executor when the consumer
	/// provides a materializer.
	pub async_materialization: bool,
	/// Deliver the model's first-page pinned item flag at session start.
	pub first_page_pinned_toggle: bool,
	pub contract_policy: ContractPolicy,
	pub unknown_container: UnknownContainerPolicy,
}

impl Default for BinderConfig {
	fn default() -> Self {
		Self {
			chunk_size: DEFAULT_CHUNK_SIZE,
			widget_chunk_size: DEFAULT_WIDGET_CHUNK_SIZE,
			async_materialization: false,
			first_page_pinned_toggle: false,
			contract_policy: ContractPolicy::default(),
			unknown_container: UnknownContainerPolicy::default(),
		}
	}
}

impl BinderConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.chunk_size == 0 {
			return Err(ConfigError::Invalid {
				field: "chunk_size",
				reason: "must be greater than zero".into(),
			});
		}
		if self.widget_chunk_size == 0 {
			return Err(ConfigError::Invalid {
				field: "widget_chunk_size",
				reason: "must be greater than zero".into(),
			});
		}
		Ok(())
	}
}
