use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use pagebind_worker::{EpochClock, EpochToken};
use parking_lot::Mutex;

use crate::error::{ModelError, Result};
use crate::item::{Container, ExtraGroup, FIRST_PAGE_ID, GroupTag, Item, ItemId, ItemKind, PageId, Position};
use crate::shortcuts::{DeepShortcutMap, ShortcutInfo, UserId, update_counts};
use crate::snapshot::Snapshot;
use crate::strings::StringCache;

/// Static options for page collection and write validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelOptions {
	/// Always include [`FIRST_PAGE_ID`] in the page list (pinned first-page content).
	pub first_page_always_present: bool,
	/// Reject new items targeting a nonexistent collection instead of logging.
	pub strict_collections: bool,
}

/// Collections guarded by the model lock.
///
/// Only reachable through [`SharedModel::write`], so every multi-field
/// mutation happens inside one exclusive scope.
#[derive(Debug, Default)]
pub struct ModelTables {
	items: BTreeMap<ItemId, Item>,
	extras: BTreeMap<GroupTag, ExtraGroup>,
	deep_shortcuts: DeepShortcutMap,
	strings: StringCache,
	first_page_pinned_item_enabled: bool,
	load_counter: u64,
	last_load_id: Option<u64>,
	options: ModelOptions,
}

impl ModelTables {
	/// Inserts or replaces an item.
	///
	/// `is_new` marks items created by this write rather than reloaded; only
	/// those are validated against their parent collection.
	pub fn add_item(&mut self, item: Item, is_new: bool) -> Result<()> {
		if is_new
			&& let Container::Collection(parent) = item.container
			&& !matches!(self.items.get(&parent), Some(p) if p.kind == ItemKind::Collection)
		{
			if self.options.strict_collections {
				return Err(ModelError::UnknownCollection { item: item.id, parent });
			}
			tracing::warn!(item = item.id, parent, "adding item to a nonexistent collection");
		}
		self.items.insert(item.id, item);
		Ok(())
	}

	/// Removes items by id and returns the ones that existed.
	pub fn remove_items(&mut self, ids: &[ItemId]) -> Vec<Item> {
		for &id in ids {
			let Some(item) = self.items.get(&id) else { continue };
			if item.kind != ItemKind::Collection {
				continue;
			}
			for child in self.items.values().filter(|c| c.container == Container::Collection(id) && !ids.contains(&c.id)) {
				tracing::warn!(collection = id, child = child.id, "removing a collection that still contains items");
			}
		}
		ids.iter().filter_map(|id| self.items.remove(id)).collect()
	}

	/// Moves an existing item. Returns false when the id is unknown.
	pub fn move_item(&mut self, id: ItemId, container: Container, position: Position) -> bool {
		match self.items.get_mut(&id) {
			Some(item) => {
				item.container = container;
				item.position = position;
				true
			}
			None => false,
		}
	}

	pub fn set_extra_group(&mut self, group: ExtraGroup) {
		self.extras.insert(group.tag, group);
	}

	pub fn remove_extra_group(&mut self, tag: GroupTag) -> Option<ExtraGroup> {
		self.extras.remove(&tag)
	}

	pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.strings.set(key, value);
	}

	pub fn set_first_page_pinned_item_enabled(&mut self, enabled: bool) {
		self.first_page_pinned_item_enabled = enabled;
	}

	/// See [`ShortcutInfo::counted_component`] for which shortcuts count.
	pub fn update_deep_shortcut_counts(&mut self, package: Option<&str>, user: UserId, shortcuts: &[ShortcutInfo]) {
		update_counts(&mut self.deep_shortcuts, package, user, shortcuts);
	}

	/// Drops every item, extra group, and shortcut count.
	pub fn clear(&mut self) {
		self.items.clear();
		self.extras.clear();
		self.deep_shortcuts.clear();
	}

	pub fn item(&self, id: ItemId) -> Option<&Item> {
		self.items.get(&id)
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Derives the ascending page list from desktop items.
	pub fn collect_pages(&self) -> Vec<PageId> {
		let mut pages: BTreeSet<PageId> = self.items.values().filter(|item| item.container == Container::Desktop).filter_map(Item::page).collect();
		if self.options.first_page_always_present || pages.is_empty() {
			pages.insert(FIRST_PAGE_ID);
		}
		pages.into_iter().collect()
	}
}

/// Copies each collection's children, in rank order, into its `contents`.
///
/// Children stay in the id map too. Children whose parent is missing or is
/// not a collection are left alone.
fn nest_collection_contents(items: &mut BTreeMap<ItemId, Item>) {
	let mut nested: BTreeMap<ItemId, Vec<Item>> = BTreeMap::new();
	for item in items.values() {
		if let Container::Collection(parent) = item.container
			&& items.get(&parent).is_some_and(|p| p.kind == ItemKind::Collection)
		{
			nested.entry(parent).or_default().push(item.clone());
		}
	}
	for (parent, mut children) in nested {
		children.sort_by_key(Item::rank);
		if let Some(collection) = items.get_mut(&parent) {
			collection.contents = children;
		}
	}
}

/// The authoritative model shared between the loader and the binder.
#[derive(Debug, Default)]
pub struct SharedModel {
	tables: Mutex<ModelTables>,
	clock: EpochClock,
}

impl SharedModel {
	pub fn new(options: ModelOptions) -> Self {
		Self {
			tables: Mutex::new(ModelTables {
				options,
				..ModelTables::default()
			}),
			clock: EpochClock::new(),
		}
	}

	/// Runs a loader write while holding the exclusive lock.
	pub fn write<R>(&self, f: impl FnOnce(&mut ModelTables) -> R) -> R {
		f(&mut self.tables.lock())
	}

	/// Advances the load counter; called by the loader at the start of a load.
	pub fn begin_load(&self) -> u64 {
		let mut tables = self.tables.lock();
		tables.load_counter += 1;
		tables.load_counter
	}

	/// Load id recorded by the most recent generation-advancing snapshot.
	pub fn last_load_id(&self) -> Option<u64> {
		self.tables.lock().last_load_id
	}

	/// Copies every collection a bind cycle needs under one lock scope.
	///
	/// With `advance_generation` the generation counter moves forward, which
	/// immediately invalidates work still in flight from older cycles.
	pub fn take_snapshot(&self, advance_generation: bool) -> Snapshot {
		let mut tables = self.tables.lock();
		let generation = if advance_generation {
			tables.last_load_id = Some(tables.load_counter);
			self.clock.advance()
		} else {
			self.clock.current()
		};

		let mut items = tables.items.clone();
		nest_collection_contents(&mut items);

		Snapshot {
			generation,
			items,
			pages: tables.collect_pages(),
			extras: tables.extras.values().cloned().collect(),
			strings: tables.strings.clone(),
			first_page_pinned_item_enabled: tables.first_page_pinned_item_enabled,
		}
	}

	pub fn deep_shortcuts(&self) -> DeepShortcutMap {
		self.tables.lock().deep_shortcuts.clone()
	}

	pub fn string_cache(&self) -> StringCache {
		self.tables.lock().strings.clone()
	}

	/// Live generation counter.
	pub fn generation(&self) -> u64 {
		self.clock.current()
	}

	/// Mints a staleness token for `generation`.
	pub fn token_for(&self, generation: u64) -> EpochToken {
		self.clock.token_for(generation)
	}

	/// Renders the model for diagnostics. `all` includes shortcut counts.
	pub fn dump(&self, all: bool) -> String {
		let tables = self.tables.lock();
		let mut out = String::from("Data Model:\n ---- items id map\n");
		for item in tables.items.values() {
			let _ = writeln!(out, "\t{item}");
		}
		out.push_str(" ---- extra items\n");
		for group in tables.extras.values() {
			let _ = writeln!(out, "\t{group}");
		}
		if all {
			let mut counts: Vec<_> = tables.deep_shortcuts.iter().collect();
			counts.sort();
			let counts: Vec<String> = counts.into_iter().map(|(key, n)| format!("{}/{}={n}", key.package, key.activity)).collect();
			let _ = writeln!(out, "shortcut counts: {}", counts.join(", "));
		}
		out
	}
}
