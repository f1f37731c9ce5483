//! Visibility and kind partitioning of snapshot items.

use std::collections::BTreeSet;

use pagebind_model::{Container, Item, ItemId, ItemKind};

use crate::config::UnknownContainerPolicy;
use crate::error::{BindError, Result};
use crate::pages::PageSet;

/// Snapshot items split into {current, other} x {plain, widget}.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
	pub current_items: Vec<Item>,
	pub current_widgets: Vec<Item>,
	pub other_items: Vec<Item>,
	pub other_widgets: Vec<Item>,
	/// Collection children, delivered inside their collection's `contents`.
	pub nested: Vec<ItemId>,
	/// Items dropped because their container was not recognized or their
	/// collection is missing.
	pub orphaned: Vec<ItemId>,
}

impl Partition {
	/// Items placed in one of the four buckets.
	pub fn bucketed_len(&self) -> usize {
		self.current_items.len() + self.current_widgets.len() + self.other_items.len() + self.other_widgets.len()
	}

	fn push(&mut self, item: &Item, current: bool) {
		let bucket = match (current, item.is_widget()) {
			(true, false) => &mut self.current_items,
			(true, true) => &mut self.current_widgets,
			(false, false) => &mut self.other_items,
			(false, true) => &mut self.other_widgets,
		};
		bucket.push(item.clone());
	}
}

/// Classifies every item.
///
/// Items in `primary` are current when their page is in `visible`. The
/// fixed strip is visible on every page, so its items are always current.
/// Children of a collection present in `items` travel in its `contents` and
/// are only counted in [`Partition::nested`]; children of a missing
/// collection are orphaned. Anything else is unrecognized and handled per
/// `policy`.
pub fn partition<'a>(items: impl IntoIterator<Item = &'a Item>, primary: Container, visible: &PageSet, policy: UnknownContainerPolicy) -> Result<Partition> {
	let items: Vec<&Item> = items.into_iter().collect();
	let collections: BTreeSet<ItemId> = items.iter().filter(|item| item.kind == ItemKind::Collection).map(|item| item.id).collect();
	let mut out = Partition::default();

	for item in items {
		match item.container {
			c if c == primary => {
				let current = item.page().is_some_and(|page| visible.contains(page));
				out.push(item, current);
			}
			Container::Hotseat => out.push(item, true),
			Container::Collection(parent) if collections.contains(&parent) => {
				tracing::trace!(item = item.id, parent, "partition.nested");
				out.nested.push(item.id);
			}
			Container::Collection(parent) => {
				tracing::warn!(item = item.id, parent, "dropping child of a missing collection");
				out.orphaned.push(item.id);
			}
			container => match policy {
				UnknownContainerPolicy::Fatal => {
					return Err(BindError::UnknownContainer { item: item.id, container });
				}
				UnknownContainerPolicy::DefaultRank => {
					tracing::warn!(item = item.id, %container, "dropping item in unrecognized container");
					out.orphaned.push(item.id);
				}
			},
		}
	}

	Ok(out)
}
