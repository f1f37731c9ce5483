use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::executor::{Executor, Task};
use crate::{TaskClass, spawn_blocking};

/// Releases one in-flight slot when a task finishes, even by unwinding.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::AcqRel);
	}
}

/// Background executor backed by the runtime's blocking pool.
///
/// Posted tasks may run concurrently and in any order; callers that need
/// ordering chain their own continuations onto a [`crate::SerialExecutor`].
#[derive(Debug, Clone)]
pub struct WorkerPool {
	class: TaskClass,
	in_flight: Arc<AtomicUsize>,
}

impl Default for WorkerPool {
	fn default() -> Self {
		Self::new(TaskClass::Background)
	}
}

impl WorkerPool {
	pub fn new(class: TaskClass) -> Self {
		Self {
			class,
			in_flight: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Returns the number of posted tasks that have not finished yet.
	pub fn in_flight(&self) -> usize {
		self.in_flight.load(Ordering::Acquire)
	}
}

impl Executor for WorkerPool {
	fn execute(&self, task: Task) {
		self.in_flight.fetch_add(1, Ordering::AcqRel);
		let slot = InFlight(Arc::clone(&self.in_flight));
		let handle = spawn_blocking(self.class, move || {
			let _slot = slot;
			task();
		});
		// Detached: a panicking task is surfaced through its own join error only.
		drop(handle);
	}
}
