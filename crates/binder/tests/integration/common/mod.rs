//! Shared fixtures for binder integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::mpsc;

use pagebind_binder::{BinderConfig, CompletionSignal, Consumer, ContractPolicy, DeferredWork, Materialized, Materializer, ModelBinder, PageSet, SessionSettled, UnknownContainerPolicy};
use pagebind_model::{DeepShortcutMap, ExtraGroup, GroupTag, InstallQueue, Item, ItemId, ItemKind, ModelOptions, PageId, SharedModel, StringCache};
use pagebind_worker::SerialExecutor;
use parking_lot::Mutex;

/// One observed consumer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	Begin,
	Pinned(bool),
	Containers(Vec<PageId>),
	Items { ids: Vec<ItemId>, widgets: bool },
	Materialized { ids: Vec<ItemId>, views: Vec<String>, widgets: bool },
	Extra(GroupTag),
	Strings(usize),
	Finish(PageSet),
	Settled { visible: PageSet, item_count: usize, synchronous: bool },
	Complete,
	Shortcuts(usize),
}

/// Callback log shared with completion listeners.
#[derive(Default)]
struct Log {
	events: Mutex<Vec<Event>>,
	/// Live generation observed at each callback, when a model is attached.
	generations: Mutex<Vec<u64>>,
	/// Children seen inside delivered collections, keyed by collection id.
	contents: Mutex<Vec<(ItemId, Vec<ItemId>)>>,
	model: Option<Arc<SharedModel>>,
}

impl Log {
	fn record(&self, event: Event) {
		if let Some(model) = &self.model {
			self.generations.lock().push(model.generation());
		}
		self.events.lock().push(event);
	}

	fn record_contents<'a>(&self, items: impl IntoIterator<Item = &'a Item>) {
		let mut contents = self.contents.lock();
		for item in items.into_iter().filter(|item| !item.contents.is_empty()) {
			contents.push((item.id, item.contents.iter().map(|c| c.id).collect()));
		}
	}
}

/// Consumer that records every callback in arrival order.
pub struct RecordingConsumer {
	name: String,
	visible: Option<PageSet>,
	materialize: bool,
	hold_deferred: bool,
	log: Arc<Log>,
	held: Mutex<Vec<(DeferredWork, CompletionSignal)>>,
	completed: Mutex<Option<mpsc::Sender<()>>>,
}

impl RecordingConsumer {
	pub fn new(name: &str, visible: impl IntoIterator<Item = PageId>) -> Self {
		Self {
			name: name.to_owned(),
			visible: Some(visible.into_iter().collect()),
			materialize: false,
			hold_deferred: false,
			log: Arc::default(),
			held: Mutex::default(),
			completed: Mutex::default(),
		}
	}

	/// A consumer that breaks the contract by reporting no visible pages.
	pub fn without_visible_pages(name: &str) -> Self {
		Self {
			visible: None,
			..Self::new(name, [])
		}
	}

	pub fn materializing(mut self) -> Self {
		self.materialize = true;
		self
	}

	/// Keep deferred work instead of releasing it on settle.
	pub fn holding_deferred(mut self) -> Self {
		self.hold_deferred = true;
		self
	}

	/// Stamp every callback with the model's live generation.
	pub fn stamped_by(mut self, model: Arc<SharedModel>) -> Self {
		self.log = Arc::new(Log {
			model: Some(model),
			..Log::default()
		});
		self
	}

	pub fn events(&self) -> Vec<Event> {
		self.log.events.lock().clone()
	}

	/// Events paired with the generation live when each was recorded.
	pub fn stamped_events(&self) -> Vec<(u64, Event)> {
		let generations = self.log.generations.lock();
		generations.iter().copied().zip(self.log.events.lock().iter().cloned()).collect()
	}

	/// Collection children delivered so far, as `(collection, children)`.
	pub fn collection_contents(&self) -> Vec<(ItemId, Vec<ItemId>)> {
		self.log.contents.lock().clone()
	}

	pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
		self.log.events.lock().iter().filter(|e| pred(e)).count()
	}

	/// Plain-item batches as delivered, in order.
	pub fn item_batches(&self) -> Vec<Vec<ItemId>> {
		self.log
			.events
			.lock()
			.iter()
			.filter_map(|e| match e {
				Event::Items { ids, widgets: false } | Event::Materialized { ids, widgets: false, .. } => Some(ids.clone()),
				_ => None,
			})
			.collect()
	}

	/// Events recorded since the most recent `begin_session`.
	pub fn last_session(&self) -> Vec<Event> {
		let events = self.log.events.lock();
		let start = events.iter().rposition(|e| *e == Event::Begin).unwrap_or(0);
		events[start..].to_vec()
	}

	pub fn take_held(&self) -> Vec<(DeferredWork, CompletionSignal)> {
		std::mem::take(&mut *self.held.lock())
	}

	pub fn notify_on_complete(&self) -> mpsc::Receiver<()> {
		let (tx, rx) = mpsc::channel();
		*self.completed.lock() = Some(tx);
		rx
	}

	fn record(&self, event: Event) {
		self.log.record(event);
	}
}

impl Consumer for RecordingConsumer {
	type View = String;

	fn name(&self) -> &str {
		&self.name
	}

	fn visible_pages(&self, _pages: &[PageId]) -> Option<PageSet> {
		self.visible.clone()
	}

	fn materializer(&self) -> Option<Arc<dyn Materializer<String>>> {
		if !self.materialize {
			return None;
		}
		let materializer: Arc<dyn Materializer<String>> = Arc::new(|item: &Item| format!("view:{}", item.id));
		Some(materializer)
	}

	fn begin_session(&self) {
		self.record(Event::Begin);
	}

	fn set_first_page_pinned_item_enabled(&self, enabled: bool) {
		self.record(Event::Pinned(enabled));
	}

	fn bind_containers(&self, pages: &[PageId]) {
		self.record(Event::Containers(pages.to_vec()));
	}

	fn bind_items(&self, items: &[Item], widgets: bool) {
		self.log.record_contents(items);
		self.record(Event::Items {
			ids: items.iter().map(|i| i.id).collect(),
			widgets,
		});
	}

	fn bind_materialized(&self, batch: Vec<Materialized<String>>, widgets: bool) {
		self.log.record_contents(batch.iter().map(|m| &m.item));
		let (ids, views): (Vec<ItemId>, Vec<String>) = batch.into_iter().map(|m| (m.item.id, m.view)).unzip();
		self.record(Event::Materialized { ids, views, widgets });
	}

	fn bind_extra_group(&self, group: &ExtraGroup) {
		self.record(Event::Extra(group.tag));
	}

	fn bind_string_cache(&self, cache: &StringCache) {
		self.record(Event::Strings(cache.len()));
	}

	fn finish_binding(&self, visible: &PageSet) {
		self.record(Event::Finish(visible.clone()));
	}

	fn on_session_settled(&self, settled: SessionSettled) {
		self.record(Event::Settled {
			visible: settled.visible_pages.clone(),
			item_count: settled.item_count,
			synchronous: settled.synchronous,
		});

		let log = Arc::clone(&self.log);
		let notify = self.completed.lock().clone();
		settled
			.completion
			.on_complete(move || {
				log.record(Event::Complete);
				if let Some(tx) = notify {
					let _ = tx.send(());
				}
			})
			.expect("completion still open at settle");

		if self.hold_deferred {
			self.held.lock().push((settled.deferred, settled.completion));
		} else {
			settled.deferred.release().expect("deferred work released once");
		}
	}

	fn bind_deep_shortcuts(&self, counts: &DeepShortcutMap) {
		self.record(Event::Shortcuts(counts.values().sum()));
	}
}

/// Model plus manually pumped executors.
pub struct Harness {
	pub model: Arc<SharedModel>,
	pub ui: SerialExecutor,
	pub background: SerialExecutor,
	pub install: Arc<InstallQueue>,
}

impl Harness {
	pub fn new() -> Self {
		let _ = tracing_subscriber::fmt::try_init();
		let model = Arc::new(SharedModel::new(ModelOptions::default()));
		Self {
			install: Arc::new(InstallQueue::new(Arc::clone(&model))),
			model,
			ui: SerialExecutor::new("ui"),
			background: SerialExecutor::new("background"),
		}
	}

	pub fn add(&self, items: impl IntoIterator<Item = Item>) {
		self.model.write(|tables| {
			for item in items {
				tables.add_item(item, false).expect("reloaded items are not validated");
			}
		});
	}

	pub fn binder(&self, config: BinderConfig, consumers: &[&Arc<RecordingConsumer>]) -> ModelBinder<RecordingConsumer> {
		let binder = ModelBinder::new(Arc::clone(&self.model), Arc::new(self.ui.clone()), Arc::new(self.background.clone()), config).with_install_queue(Arc::clone(&self.install));
		consumers.iter().fold(binder, |binder, consumer| binder.with_consumer(Arc::clone(consumer)))
	}

	/// Alternates both executors until neither has work.
	pub fn pump(&self) -> usize {
		let mut ran = 0;
		loop {
			let step = self.ui.run_until_idle() + self.background.run_until_idle();
			if step == 0 {
				return ran;
			}
			ran += step;
		}
	}
}

pub fn config(chunk_size: usize) -> BinderConfig {
	BinderConfig {
		chunk_size,
		contract_policy: ContractPolicy::Strict,
		unknown_container: UnknownContainerPolicy::Fatal,
		..BinderConfig::default()
	}
}

/// `n` plain items filling page `page` in reading order, ids descending.
pub fn grid(page: PageId, n: usize, first_id: ItemId) -> Vec<Item> {
	(0..n).map(|i| Item::cell(first_id - i as ItemId, ItemKind::Shortcut, page, (i % 4) as u16, (i / 4) as u16)).collect()
}
