use std::collections::BTreeMap;

use crate::item::{ExtraGroup, Item, ItemId, PageId};
use crate::strings::StringCache;

/// Immutable copy of the model taken under one lock scope.
///
/// Consumed by exactly one bind cycle. Content is a pure function of the
/// model state at copy time; `generation` only tags which cycle it feeds.
#[derive(Debug, Clone)]
pub struct Snapshot {
	pub generation: u64,
	pub items: BTreeMap<ItemId, Item>,
	/// Ordered page ids, ascending.
	pub pages: Vec<PageId>,
	pub extras: Vec<ExtraGroup>,
	pub strings: StringCache,
	pub first_page_pinned_item_enabled: bool,
}

impl Snapshot {
	/// Total number of items in the id map.
	pub fn item_count(&self) -> usize {
		self.items.len()
	}

	pub fn get(&self, id: ItemId) -> Option<&Item> {
		self.items.get(&id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Item> {
		self.items.values()
	}
}
