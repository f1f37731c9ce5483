//! Top-level entry point tying the model, the executors and the consumers.

use std::sync::Arc;

use pagebind_model::{InstallQueue, SharedModel};
use pagebind_worker::Executor;
use parking_lot::Mutex;

use crate::config::BinderConfig;
use crate::consumer::Consumer;
use crate::error::Result;
use crate::hold::{CycleHold, LoaderHold};
use crate::pages::PageSet;
use crate::scheduler::{ConsumerSession, DeliveryKind, DispatchContext, SessionPlan, UnitFactory};

/// What one consumer was scheduled to receive in a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
	pub consumer: String,
	pub visible_pages: PageSet,
	pub delivery: DeliveryKind,
	pub current_items: usize,
	pub current_widgets: usize,
	pub other_items: usize,
	pub other_widgets: usize,
	/// Collection children carried inside their collection's contents.
	pub nested: usize,
	pub orphaned: usize,
}

/// Summary of a scheduled bind cycle.
///
/// Returned once every unit is posted; none of them has necessarily run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindCycle {
	pub generation: u64,
	pub item_count: usize,
	pub consumers: Vec<ConsumerReport>,
	/// Consumers skipped because they broke the contract under a lenient policy.
	pub skipped: Vec<String>,
}

/// Binds snapshots of a [`SharedModel`] into a set of consumers.
pub struct ModelBinder<C: Consumer> {
	model: Arc<SharedModel>,
	consumers: Vec<Arc<C>>,
	ctx: DispatchContext,
	install: Option<Arc<LoaderHold>>,
	/// Pause taken by the most recent cycle that scheduled a session.
	last_hold: Mutex<Option<Arc<CycleHold>>>,
}

impl<C: Consumer> ModelBinder<C> {
	/// `ui` must run tasks in post order; `background` may run them anywhere.
	pub fn new(model: Arc<SharedModel>, ui: Arc<dyn Executor>, background: Arc<dyn Executor>, config: BinderConfig) -> Self {
		Self {
			model,
			consumers: Vec::new(),
			ctx: DispatchContext {
				ui,
				background,
				config,
			},
			install: None,
			last_hold: Mutex::new(None),
		}
	}

	pub fn with_consumer(mut self, consumer: Arc<C>) -> Self {
		self.consumers.push(consumer);
		self
	}

	/// Pauses `queue` while a cycle's sessions are binding.
	///
	/// The pause ends when every session has run its tail or been found
	/// stale, or when a newer cycle replaces it.
	pub fn with_install_queue(mut self, queue: Arc<InstallQueue>) -> Self {
		self.install = Some(LoaderHold::new(queue));
		self
	}

	pub fn config(&self) -> &BinderConfig {
		&self.ctx.config
	}

	pub fn consumers(&self) -> &[Arc<C>] {
		&self.consumers
	}

	pub fn model(&self) -> &Arc<SharedModel> {
		&self.model
	}

	/// Takes a snapshot and schedules one session per consumer.
	///
	/// With `advance_generation` every unit still in flight from an older
	/// cycle becomes stale. Every consumer is planned before anything is
	/// posted, so a strict contract error leaves all consumers untouched.
	/// The install queue is paused only when at least one session runs.
	pub fn bind_workspace(&self, advance_generation: bool, synchronous: bool) -> Result<BindCycle> {
		let snapshot = Arc::new(self.model.take_snapshot(advance_generation));
		let _span = tracing::debug_span!("bind_workspace", generation = snapshot.generation).entered();

		let plans = self
			.consumers
			.iter()
			.map(|consumer| SessionPlan::prepare(&**consumer, &snapshot, &self.ctx.config).map(|plan| (consumer, plan)))
			.collect::<Result<Vec<_>>>()
			.inspect_err(|_| self.release_superseded(snapshot.generation))?;

		// The new pause is taken before an older one is given back, so held
		// writes never flush between two cycles.
		let sessions = plans.iter().filter(|(_, plan)| plan.is_some()).count();
		let hold = match &self.install {
			Some(install) if sessions > 0 => {
				let hold = install.acquire(snapshot.generation, sessions);
				if let Some(previous) = self.last_hold.lock().replace(Arc::clone(&hold)) {
					previous.abandon();
				}
				Some(hold)
			}
			_ => {
				self.release_superseded(snapshot.generation);
				None
			}
		};

		let mut cycle = BindCycle {
			generation: snapshot.generation,
			item_count: snapshot.item_count(),
			consumers: Vec::with_capacity(plans.len()),
			skipped: Vec::new(),
		};

		for (consumer, plan) in plans {
			let Some(plan) = plan else {
				cycle.skipped.push(consumer.name().to_owned());
				continue;
			};

			let buckets = &plan.buckets;
			let mut report = ConsumerReport {
				consumer: consumer.name().to_owned(),
				visible_pages: plan.visible.clone(),
				delivery: DeliveryKind::Chunked,
				current_items: buckets.current_items.len(),
				current_widgets: buckets.current_widgets.len(),
				other_items: buckets.other_items.len(),
				other_widgets: buckets.other_widgets.len(),
				nested: buckets.nested.len(),
				orphaned: buckets.orphaned.len(),
			};

			let session = ConsumerSession::new(Arc::clone(consumer), plan, Arc::clone(&snapshot), self.model.token_for(snapshot.generation), self.ctx.clone(), synchronous)
				.with_hold(hold.as_ref().map(CycleHold::session));
			report.delivery = session.delivery_kind();
			tracing::debug!(consumer = %report.consumer, visible = %report.visible_pages, delivery = ?report.delivery, "bind.session");
			session.run();
			cycle.consumers.push(report);
		}

		Ok(cycle)
	}

	/// Ends the pause of an older cycle that `generation` has superseded.
	fn release_superseded(&self, generation: u64) {
		let superseded = self.last_hold.lock().take_if(|hold| hold.generation() < generation);
		if let Some(hold) = superseded {
			tracing::debug!(generation = hold.generation(), "install.release_superseded");
			hold.abandon();
		}
	}

	/// Delivers the current deep-shortcut counts to every consumer.
	pub fn bind_deep_shortcuts(&self) {
		let counts = Arc::new(self.model.deep_shortcuts());
		let token = self.model.token_for(self.model.generation());
		for consumer in &self.consumers {
			let counts = Arc::clone(&counts);
			let units = UnitFactory::new(Arc::clone(consumer), token.clone());
			self.ctx.ui.execute(units.unit("bind_deep_shortcuts", move |c| c.bind_deep_shortcuts(&counts)));
		}
	}
}
