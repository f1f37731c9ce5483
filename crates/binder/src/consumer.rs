//! The contract between the binder and a display surface.

use std::sync::Arc;

use pagebind_model::{DeepShortcutMap, ExtraGroup, Item, PageId, StringCache};

use crate::completion::{CompletionSignal, DeferredWork};
use crate::pages::PageSet;

/// Background hook turning an item into a display-ready value.
///
/// Runs on the background executor; it must not touch consumer state.
pub trait Materializer<V>: Send + Sync {
	fn materialize(&self, item: &Item) -> V;
}

impl<V, F> Materializer<V> for F
where
	F: Fn(&Item) -> V + Send + Sync,
{
	fn materialize(&self, item: &Item) -> V {
		self(item)
	}
}

/// An item paired with the value its consumer's materializer built for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized<V> {
	pub item: Item,
	pub view: V,
}

/// Final report of one bind session, handed to [`Consumer::on_session_settled`].
#[derive(Debug)]
pub struct SessionSettled {
	/// Pages whose items were bound first.
	pub visible_pages: PageSet,
	/// Lower-priority units; nothing in here runs until the consumer calls
	/// [`DeferredWork::release`].
	pub deferred: DeferredWork,
	/// Fires after the last deferred unit of this cycle.
	pub completion: CompletionSignal,
	pub item_count: usize,
	/// True when the host asked for a correct first frame immediately.
	pub synchronous: bool,
}

/// One display surface fed by the binder.
///
/// Every `bind_*` call and the session callbacks arrive on the UI executor,
/// in the order the binder posted them. Only [`Self::visible_pages`] and
/// [`Self::materializer`] are called on the thread that starts the cycle.
pub trait Consumer: Send + Sync + 'static {
	/// Display-ready representation produced by this consumer's materializer.
	type View: Send + 'static;

	/// Name used in logs and cycle reports.
	fn name(&self) -> &str;

	/// Pages to bind first, given the snapshot's ordered pages.
	///
	/// `None` violates the contract and aborts binding for this consumer.
	fn visible_pages(&self, pages: &[PageId]) -> Option<PageSet>;

	/// Background materialization hook, if the consumer has one.
	fn materializer(&self) -> Option<Arc<dyn Materializer<Self::View>>> {
		None
	}

	/// Drop any partially bound state; a new session starts.
	fn begin_session(&self);

	fn set_first_page_pinned_item_enabled(&self, _enabled: bool) {}

	/// Allocate (empty) containers for every page before any item arrives.
	fn bind_containers(&self, pages: &[PageId]);

	fn bind_items(&self, items: &[Item], widgets: bool);

	/// Receives one materialized batch. Defaults to forwarding the bare items.
	fn bind_materialized(&self, batch: Vec<Materialized<Self::View>>, widgets: bool) {
		let items: Vec<Item> = batch.into_iter().map(|m| m.item).collect();
		self.bind_items(&items, widgets);
	}

	fn bind_extra_group(&self, group: &ExtraGroup);

	fn bind_string_cache(&self, cache: &StringCache);

	/// Every item of the session has been delivered.
	fn finish_binding(&self, visible: &PageSet);

	fn on_session_settled(&self, settled: SessionSettled);

	fn bind_deep_shortcuts(&self, _counts: &DeepShortcutMap) {}
}
