use thiserror::Error;

use crate::item::ItemId;

/// Errors raised by loader writes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
	/// A new item names a collection that does not exist in the model.
	#[error("item {item} targets nonexistent collection {parent}")]
	UnknownCollection { item: ItemId, parent: ItemId },
}

pub type Result<T> = std::result::Result<T, ModelError>;
