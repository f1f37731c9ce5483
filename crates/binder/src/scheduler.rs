//! Per-consumer dispatch of one bind cycle.
//!
//! A [`ConsumerSession`] walks [`BindPhase`] once, posting units to the UI
//! executor (current phase) or into the session's [`DeferredWork`] (other
//! phase). Every consumer-visible unit carries the cycle's [`EpochToken`] and
//! re-checks it just before running; a unit from a superseded cycle is
//! dropped without touching the consumer.

mod phase;

use std::fmt;
use std::sync::Arc;

use pagebind_model::{Container, Item, Snapshot};
use pagebind_worker::{EpochToken, Executor, Task};

pub use self::phase::BindPhase;
use crate::completion::{CompletionSignal, DeferredWork};
use crate::config::BinderConfig;
use crate::consumer::{Consumer, Materialized, Materializer, SessionSettled};
use crate::error::{BindError, Result};
use crate::hold::SessionHold;
use crate::pages::PageSet;
use crate::partition::{Partition, partition};
use crate::sort::sort_spatially;

/// What happened to one guarded unit when its turn came.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
	/// Epoch matched; the payload ran.
	Delivered,
	/// A newer cycle had started; the payload was dropped.
	Stale,
}

/// Runs `f` only if `token` still names the live generation.
pub(crate) fn run_guarded(token: &EpochToken, consumer: &str, unit: &'static str, f: impl FnOnce()) -> UnitOutcome {
	if token.is_stale() {
		tracing::debug!(epoch = token.epoch(), consumer, unit, "skipping obsolete data-bind");
		return UnitOutcome::Stale;
	}
	f();
	UnitOutcome::Delivered
}

/// Builds epoch-guarded tasks addressed to one consumer.
pub(crate) struct UnitFactory<C> {
	consumer: Arc<C>,
	token: EpochToken,
}

impl<C: Consumer> UnitFactory<C> {
	pub(crate) fn new(consumer: Arc<C>, token: EpochToken) -> Self {
		Self { consumer, token }
	}

	pub(crate) fn unit(&self, unit: &'static str, f: impl FnOnce(&C) + Send + 'static) -> Task {
		self.unit_or_else(unit, f, || {})
	}

	/// Like [`unit`](Self::unit), but runs `on_stale` when the unit is dropped.
	pub(crate) fn unit_or_else(&self, unit: &'static str, f: impl FnOnce(&C) + Send + 'static, on_stale: impl FnOnce() + Send + 'static) -> Task {
		let consumer = Arc::clone(&self.consumer);
		let token = self.token.clone();
		Box::new(move || {
			if run_guarded(&token, consumer.name(), unit, || f(&*consumer)) == UnitOutcome::Stale {
				on_stale();
			}
		})
	}
}

/// Delivery strategy for item batches, chosen per consumer from config.
pub enum Delivery<V> {
	/// Fixed-size batches, one UI unit each.
	Chunked { items: usize, widgets: usize },
	/// Whole lists materialized on the background executor, one UI unit each.
	Materialize(Arc<dyn Materializer<V>>),
}

impl<V> Delivery<V> {
	pub fn select(config: &BinderConfig, materializer: Option<Arc<dyn Materializer<V>>>) -> Self {
		match materializer {
			Some(materializer) if config.async_materialization => Self::Materialize(materializer),
			_ => Self::Chunked {
				items: config.chunk_size.max(1),
				widgets: config.widget_chunk_size.max(1),
			},
		}
	}

	pub fn kind(&self) -> DeliveryKind {
		match self {
			Self::Chunked { .. } => DeliveryKind::Chunked,
			Self::Materialize(_) => DeliveryKind::Materialize,
		}
	}
}

impl<V> fmt::Debug for Delivery<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Chunked { items, widgets } => f.debug_struct("Chunked").field("items", items).field("widgets", widgets).finish(),
			Self::Materialize(_) => f.write_str("Materialize"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
	Chunked,
	Materialize,
}

/// Executors and knobs shared by every session of a binder.
#[derive(Clone)]
pub(crate) struct DispatchContext {
	pub ui: Arc<dyn Executor>,
	pub background: Arc<dyn Executor>,
	pub config: BinderConfig,
}

/// Visible pages and sorted buckets computed for one consumer.
#[derive(Debug)]
pub(crate) struct SessionPlan {
	pub visible: PageSet,
	pub buckets: Partition,
}

impl SessionPlan {
	/// Queries the consumer, partitions the snapshot and sorts every bucket.
	///
	/// Returns `Ok(None)` when the consumer broke its contract under a lenient
	/// policy; that consumer is skipped for this cycle.
	pub(crate) fn prepare<C: Consumer>(consumer: &C, snapshot: &Snapshot, config: &BinderConfig) -> Result<Option<Self>> {
		let Some(visible) = consumer.visible_pages(&snapshot.pages) else {
			config.contract_policy.enforce(BindError::NullContract {
				consumer: consumer.name().to_owned(),
			})?;
			return Ok(None);
		};

		let mut buckets = partition(snapshot.iter(), Container::Desktop, &visible, config.unknown_container)?;
		for bucket in [&mut buckets.current_items, &mut buckets.current_widgets, &mut buckets.other_items, &mut buckets.other_widgets] {
			sort_spatially(bucket, &snapshot.pages, config.unknown_container)?;
		}
		Ok(Some(Self { visible, buckets }))
	}
}

/// One consumer's walk through one bind cycle.
pub(crate) struct ConsumerSession<C: Consumer> {
	units: UnitFactory<C>,
	consumer_name: String,
	snapshot: Arc<Snapshot>,
	plan: SessionPlan,
	delivery: Delivery<C::View>,
	ctx: DispatchContext,
	synchronous: bool,
	phase: BindPhase,
	/// This session's share of the cycle's install-queue pause.
	hold: Option<SessionHold>,
}

impl<C: Consumer> ConsumerSession<C> {
	pub(crate) fn new(consumer: Arc<C>, plan: SessionPlan, snapshot: Arc<Snapshot>, token: EpochToken, ctx: DispatchContext, synchronous: bool) -> Self {
		let delivery = Delivery::select(&ctx.config, consumer.materializer());
		Self {
			consumer_name: consumer.name().to_owned(),
			units: UnitFactory::new(consumer, token),
			snapshot,
			plan,
			delivery,
			ctx,
			synchronous,
			phase: BindPhase::NotStarted,
			hold: None,
		}
	}

	pub(crate) fn with_hold(mut self, hold: Option<SessionHold>) -> Self {
		self.hold = hold;
		self
	}

	/// Gives up this session's pause share once it can no longer reach its tail.
	fn release_hold(&self) {
		if let Some(hold) = &self.hold {
			hold.release();
		}
	}

	pub(crate) fn delivery_kind(&self) -> DeliveryKind {
		self.delivery.kind()
	}

	/// Schedules the whole session. Never blocks on a posted unit.
	pub(crate) fn run(self) {
		let materializer = match &self.delivery {
			Delivery::Materialize(materializer) => Some(Arc::clone(materializer)),
			Delivery::Chunked { .. } => None,
		};
		match materializer {
			Some(materializer) => self.run_materialized(materializer),
			None => self.run_chunked(),
		}
	}

	fn enter(&mut self, phase: BindPhase) {
		debug_assert_eq!(self.phase.next(), Some(phase), "bind phases advance one step at a time");
		self.phase = phase;
		tracing::trace!(consumer = %self.consumer_name, epoch = self.units.token.epoch(), phase = phase.as_str(), "bind.phase");
	}

	fn post(&self, task: Task) {
		self.ctx.ui.execute(task);
	}

	fn begin(&mut self) {
		self.enter(BindPhase::Clearing);
		let pinned = self.ctx.config.first_page_pinned_toggle.then_some(self.snapshot.first_page_pinned_item_enabled);
		self.post(self.units.unit("begin_session", move |c| {
			c.begin_session();
			if let Some(enabled) = pinned {
				c.set_first_page_pinned_item_enabled(enabled);
			}
		}));

		self.enter(BindPhase::ScreensBound);
		let pages = self.snapshot.pages.clone();
		self.post(self.units.unit("bind_containers", move |c| c.bind_containers(&pages)));
	}

	fn chunk_units(&self, items: &[Item], size: usize, widgets: bool) -> Vec<Task> {
		let unit = if widgets { "bind_widgets" } else { "bind_items" };
		items
			.chunks(size)
			.map(|chunk| {
				let batch = chunk.to_vec();
				self.units.unit(unit, move |c| c.bind_items(&batch, widgets))
			})
			.collect()
	}

	fn materialized_unit(&self, materializer: &dyn Materializer<C::View>, items: &[Item], widgets: bool) -> Option<Task> {
		if items.is_empty() {
			return None;
		}
		let batch: Vec<Materialized<C::View>> = items
			.iter()
			.map(|item| Materialized {
				item: item.clone(),
				view: materializer.materialize(item),
			})
			.collect();
		let unit = if widgets { "bind_materialized_widgets" } else { "bind_materialized_items" };
		Some(self.units.unit(unit, move |c| c.bind_materialized(batch, widgets)))
	}

	fn post_extras(&self) {
		for group in &self.snapshot.extras {
			let group = group.clone();
			self.post(self.units.unit("bind_extra_group", move |c| c.bind_extra_group(&group)));
		}
	}

	fn trackers(&self) -> (DeferredWork, CompletionSignal) {
		let policy = self.ctx.config.contract_policy;
		(DeferredWork::new(Arc::clone(&self.ctx.ui), policy), CompletionSignal::new(policy))
	}

	/// String cache, finish signal, write-queue resume, then completion.
	///
	/// The resume is the only unit that ignores the epoch.
	fn push_tail(&self, deferred: &DeferredWork, completion: &CompletionSignal) {
		let strings = self.snapshot.strings.clone();
		deferred.push(self.units.unit("bind_string_cache", move |c| c.bind_string_cache(&strings)));

		let visible = self.plan.visible.clone();
		deferred.push(self.units.unit("finish_binding", move |c| c.finish_binding(&visible)));

		if let Some(hold) = self.hold.clone() {
			deferred.push(Box::new(move || hold.release()));
		}

		let completion = completion.clone();
		deferred.push(self.units.unit("complete", move |_| {
			if let Err(err) = completion.fire() {
				tracing::error!(%err, "completion signal rejected");
			}
		}));
	}

	/// A stale settled unit drops the deferred work, resume included, so it
	/// gives the pause share back itself.
	fn post_settled(&mut self, deferred: DeferredWork, completion: CompletionSignal) {
		self.enter(BindPhase::Settled);
		let settled = SessionSettled {
			visible_pages: self.plan.visible.clone(),
			deferred,
			completion,
			item_count: self.snapshot.item_count(),
			synchronous: self.synchronous,
		};
		let hold = self.hold.clone();
		self.post(self.units.unit_or_else(
			"on_session_settled",
			move |c| c.on_session_settled(settled),
			move || {
				if let Some(hold) = hold {
					hold.release();
				}
			},
		));
	}

	fn run_chunked(mut self) {
		let (item_chunk, widget_chunk) = match self.delivery {
			Delivery::Chunked { items, widgets } => (items, widgets),
			Delivery::Materialize(_) => (self.ctx.config.chunk_size.max(1), self.ctx.config.widget_chunk_size.max(1)),
		};

		self.begin();

		self.enter(BindPhase::CurrentBound);
		let current = self
			.chunk_units(&self.plan.buckets.current_items, item_chunk, false)
			.into_iter()
			.chain(self.chunk_units(&self.plan.buckets.current_widgets, widget_chunk, true));
		for task in current {
			self.post(task);
		}
		self.post_extras();

		self.enter(BindPhase::OtherScheduled);
		let (deferred, completion) = self.trackers();
		let other = self
			.chunk_units(&self.plan.buckets.other_items, item_chunk, false)
			.into_iter()
			.chain(self.chunk_units(&self.plan.buckets.other_widgets, widget_chunk, true));
		for task in other {
			deferred.push(task);
		}
		self.push_tail(&deferred, &completion);

		self.post_settled(deferred, completion);
	}

	fn run_materialized(mut self, materializer: Arc<dyn Materializer<C::View>>) {
		self.begin();
		let background = Arc::clone(&self.ctx.background);
		background.execute(Box::new(move || self.materialize_current(materializer)));
	}

	fn materialize_current(mut self, materializer: Arc<dyn Materializer<C::View>>) {
		if self.units.token.is_stale() {
			tracing::debug!(consumer = %self.consumer_name, epoch = self.units.token.epoch(), "skipping obsolete data-bind");
			self.release_hold();
			return;
		}
		tracing::trace!(consumer = %self.consumer_name, items = self.plan.buckets.current_items.len(), widgets = self.plan.buckets.current_widgets.len(), "materialize.current");

		self.enter(BindPhase::CurrentBound);
		let current = [
			self.materialized_unit(&*materializer, &self.plan.buckets.current_items, false),
			self.materialized_unit(&*materializer, &self.plan.buckets.current_widgets, true),
		];
		for task in current.into_iter().flatten() {
			self.post(task);
		}
		self.post_extras();

		self.enter(BindPhase::OtherScheduled);
		let (deferred, completion) = self.trackers();
		let background = Arc::clone(&self.ctx.background);
		let other = OtherJob {
			deferred: deferred.clone(),
			completion: completion.clone(),
			materializer,
		};

		self.post_settled(deferred, completion);
		background.execute(Box::new(move || other.run(self)));
	}
}

/// Background materialization of the "other" buckets into deferred work.
struct OtherJob<V> {
	deferred: DeferredWork,
	completion: CompletionSignal,
	materializer: Arc<dyn Materializer<V>>,
}

impl<V: Send + 'static> OtherJob<V> {
	fn run<C: Consumer<View = V>>(self, session: ConsumerSession<C>) {
		if session.units.token.is_stale() {
			tracing::debug!(consumer = %session.consumer_name, epoch = session.units.token.epoch(), "skipping obsolete data-bind");
			session.release_hold();
			return;
		}
		tracing::trace!(consumer = %session.consumer_name, items = session.plan.buckets.other_items.len(), widgets = session.plan.buckets.other_widgets.len(), "materialize.other");

		let other = [
			session.materialized_unit(&*self.materializer, &session.plan.buckets.other_items, false),
			session.materialized_unit(&*self.materializer, &session.plan.buckets.other_widgets, true),
		];
		for task in other.into_iter().flatten() {
			self.deferred.push(task);
		}
		session.push_tail(&self.deferred, &self.completion);
	}
}
