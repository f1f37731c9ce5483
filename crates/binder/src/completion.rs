//! One-shot callback lists handed to consumers at the end of a session.
//!
//! [`CompletionSignal`] is the "all done" signal for one bind cycle.
//! [`DeferredWork`] holds the cycle's lower-priority units until the
//! consumer releases them onto the UI executor.

use std::fmt;
use std::sync::Arc;

use pagebind_worker::{Executor, Task};
use parking_lot::Mutex;

use crate::config::ContractPolicy;
use crate::error::{BindError, Result};

enum ListState {
	Open(Vec<Task>),
	Fired,
}

/// Append-only list of actions that runs once and then refuses further use.
pub struct RunnableList {
	what: &'static str,
	policy: ContractPolicy,
	state: Mutex<ListState>,
}

impl fmt::Debug for RunnableList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RunnableList").field("what", &self.what).field("pending", &self.len()).field("fired", &self.is_fired()).finish()
	}
}

impl RunnableList {
	pub fn new(what: &'static str, policy: ContractPolicy) -> Self {
		Self {
			what,
			policy,
			state: Mutex::new(ListState::Open(Vec::new())),
		}
	}

	/// Appends `task`; appending after the list fired is a contract violation.
	pub fn add(&self, task: Task) -> Result<()> {
		if let ListState::Open(tasks) = &mut *self.state.lock() {
			tasks.push(task);
			return Ok(());
		}
		self.policy.enforce(BindError::AppendAfterFire { what: self.what })
	}

	/// Runs every action in append order and marks the list consumed.
	///
	/// Actions run outside the lock, so an action may inspect the list.
	pub fn execute_all_and_destroy(&self) -> Result<()> {
		let tasks = match std::mem::replace(&mut *self.state.lock(), ListState::Fired) {
			ListState::Open(tasks) => tasks,
			ListState::Fired => return self.policy.enforce(BindError::DoubleCompletion { what: self.what }),
		};
		tracing::trace!(what = self.what, actions = tasks.len(), "runnable_list.fire");
		for task in tasks {
			task();
		}
		Ok(())
	}

	pub fn is_fired(&self) -> bool {
		matches!(*self.state.lock(), ListState::Fired)
	}

	/// Number of actions waiting to run.
	pub fn len(&self) -> usize {
		match &*self.state.lock() {
			ListState::Open(tasks) => tasks.len(),
			ListState::Fired => 0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Shared handle to a cycle's "all done" signal.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
	list: Arc<RunnableList>,
}

impl CompletionSignal {
	pub fn new(policy: ContractPolicy) -> Self {
		Self {
			list: Arc::new(RunnableList::new("completion signal", policy)),
		}
	}

	/// Registers `f` to run when every unit of the cycle has executed.
	pub fn on_complete(&self, f: impl FnOnce() + Send + 'static) -> Result<()> {
		self.list.add(Box::new(f))
	}

	pub(crate) fn fire(&self) -> Result<()> {
		self.list.execute_all_and_destroy()
	}

	pub fn is_complete(&self) -> bool {
		self.list.is_fired()
	}
}

struct DeferredState {
	queue: Vec<Task>,
	released: bool,
}

struct DeferredInner {
	state: Mutex<DeferredState>,
	ui: Arc<dyn Executor>,
	policy: ContractPolicy,
}

/// Units held back until the consumer decides the first frame is done.
///
/// [`Self::release`] posts each held unit to the UI executor as its own task,
/// so unrelated UI work can interleave between them. Units pushed after the
/// release go straight to the UI executor, behind the released ones.
#[derive(Clone)]
pub struct DeferredWork {
	inner: Arc<DeferredInner>,
}

impl fmt::Debug for DeferredWork {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeferredWork").field("held", &self.len()).field("released", &self.is_released()).finish()
	}
}

impl DeferredWork {
	pub fn new(ui: Arc<dyn Executor>, policy: ContractPolicy) -> Self {
		Self {
			inner: Arc::new(DeferredInner {
				state: Mutex::new(DeferredState {
					queue: Vec::new(),
					released: false,
				}),
				ui,
				policy,
			}),
		}
	}

	pub(crate) fn push(&self, task: Task) {
		let mut state = self.inner.state.lock();
		if state.released {
			self.inner.ui.execute(task);
		} else {
			state.queue.push(task);
		}
	}

	/// Posts every held unit to the UI executor in push order.
	///
	/// Releasing twice is a contract violation.
	pub fn release(&self) -> Result<()> {
		let mut state = self.inner.state.lock();
		if state.released {
			drop(state);
			return self.inner.policy.enforce(BindError::DoubleCompletion { what: "deferred work" });
		}
		state.released = true;
		let queue = std::mem::take(&mut state.queue);
		tracing::trace!(units = queue.len(), "deferred.release");
		// Posted under the lock so a concurrent push cannot overtake them.
		for task in queue {
			self.inner.ui.execute(task);
		}
		Ok(())
	}

	/// Number of units still held.
	pub fn len(&self) -> usize {
		self.inner.state.lock().queue.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_released(&self) -> bool {
		self.inner.state.lock().released
	}
}
