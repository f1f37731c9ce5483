//! Ordered single-consumer executor for consumer-visible work.
//!
//! Tasks run strictly in the order they were posted. The queue is either
//! pumped by the host's own loop ([`SerialExecutor::run_next`],
//! [`SerialExecutor::drain`]) or handed to a dedicated looper thread
//! ([`SerialExecutor::start_looper`]). Never both: the looper takes over the
//! pump until its handle is shut down.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::budget::{DrainBudget, DrainReport};
use crate::error::{Result, WorkerError};
use crate::executor::{Executor, Task};
use crate::spawn::spawn_named_thread;
use crate::TaskClass;

struct QueueState {
	tasks: VecDeque<Task>,
	/// True while a popped task is executing.
	running: bool,
	shutdown: bool,
}

/// Clears `running` when a task finishes, even by unwinding.
struct RunningGuard<'a>(&'a SerialInner);

impl Drop for RunningGuard<'_> {
	fn drop(&mut self) {
		let mut state = self.0.state.lock();
		state.running = false;
		if state.tasks.is_empty() {
			self.0.idle.notify_all();
		}
	}
}

struct SerialInner {
	name: String,
	state: Mutex<QueueState>,
	/// Signalled when a task is posted or shutdown is requested.
	posted: Condvar,
	/// Signalled when the queue drains with nothing running.
	idle: Condvar,
}

/// FIFO executor owning all consumer-visible mutation.
#[derive(Clone)]
pub struct SerialExecutor {
	inner: Arc<SerialInner>,
}

impl std::fmt::Debug for SerialExecutor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SerialExecutor").field("name", &self.inner.name).field("pending", &self.len()).finish()
	}
}

impl SerialExecutor {
	/// Creates an empty executor; `name` is used for diagnostics and the looper thread.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			inner: Arc::new(SerialInner {
				name: name.into(),
				state: Mutex::new(QueueState {
					tasks: VecDeque::new(),
					running: false,
					shutdown: false,
				}),
				posted: Condvar::new(),
				idle: Condvar::new(),
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// Returns the number of queued tasks, excluding one currently running.
	pub fn len(&self) -> usize {
		self.inner.state.lock().tasks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns true when nothing is queued and nothing is running.
	pub fn is_idle(&self) -> bool {
		let state = self.inner.state.lock();
		state.tasks.is_empty() && !state.running
	}

	/// Runs the oldest queued task on the calling thread.
	///
	/// Returns false when the queue was empty. Tasks posted by the running
	/// task are queued behind everything already pending. A panicking task
	/// still leaves the executor able to go idle.
	pub fn run_next(&self) -> bool {
		let task = {
			let mut state = self.inner.state.lock();
			let Some(task) = state.tasks.pop_front() else {
				return false;
			};
			state.running = true;
			task
		};

		let _running = RunningGuard(&self.inner);
		task();
		true
	}

	/// Runs queued tasks until the queue is empty, including tasks posted
	/// while draining. Returns the number of tasks run.
	pub fn run_until_idle(&self) -> usize {
		let mut completed = 0;
		while self.run_next() {
			completed += 1;
		}
		completed
	}

	/// Runs queued tasks under one budget.
	pub fn drain(&self, budget: DrainBudget) -> DrainReport {
		let deadline = Instant::now().checked_add(budget.duration);
		let mut completed = 0usize;

		loop {
			if completed >= budget.max_completions || deadline.is_some_and(|d| Instant::now() >= d) {
				break;
			}
			if !self.run_next() {
				break;
			}
			completed += 1;
		}

		let pending = self.len();
		DrainReport {
			completed,
			pending,
			budget_exhausted: pending > 0,
		}
	}

	/// Blocks until the queue is idle or `timeout` elapses.
	///
	/// This is the only blocking wait in the pipeline; it is meant for the
	/// loader to yield to a busy UI executor before starting bulk work. A
	/// timeout too large to represent waits without a deadline.
	pub fn wait_idle(&self, timeout: Duration) -> Result<()> {
		let deadline = Instant::now().checked_add(timeout);
		let mut state = self.inner.state.lock();
		while !state.tasks.is_empty() || state.running {
			let Some(deadline) = deadline else {
				self.inner.idle.wait(&mut state);
				continue;
			};
			if self.inner.idle.wait_until(&mut state, deadline).timed_out() {
				if state.tasks.is_empty() && !state.running {
					break;
				}
				return Err(WorkerError::IdleTimeout {
					name: self.inner.name.clone(),
					pending: state.tasks.len(),
					timeout,
				});
			}
		}
		Ok(())
	}

	/// Hands the pump to a dedicated named thread.
	pub fn start_looper(&self) -> Result<LooperHandle> {
		{
			let mut state = self.inner.state.lock();
			state.shutdown = false;
		}
		let executor = self.clone();
		let stop = Arc::new(AtomicBool::new(false));
		let stop_flag = Arc::clone(&stop);
		let name = self.inner.name.clone();

		let join = spawn_named_thread(TaskClass::Interactive, name.clone(), move || executor.loop_until_shutdown(&stop_flag))
			.map_err(|source| WorkerError::LooperSpawn { name, source })?;

		Ok(LooperHandle {
			executor: self.clone(),
			stop,
			join: Some(join),
		})
	}

	fn loop_until_shutdown(&self, stop: &AtomicBool) {
		tracing::debug!(executor = %self.inner.name, "looper.start");
		loop {
			{
				let mut state = self.inner.state.lock();
				while state.tasks.is_empty() && !state.shutdown {
					self.inner.posted.wait(&mut state);
				}
				if state.shutdown && (state.tasks.is_empty() || stop.load(Ordering::Acquire)) {
					break;
				}
			}
			self.run_next();
		}
		tracing::debug!(executor = %self.inner.name, "looper.stop");
	}
}

impl Executor for SerialExecutor {
	fn execute(&self, task: Task) {
		let mut state = self.inner.state.lock();
		state.tasks.push_back(task);
		tracing::trace!(executor = %self.inner.name, pending = state.tasks.len(), "serial.post");
		self.inner.posted.notify_one();
	}
}

/// Owner of a running looper thread.
///
/// Dropping the handle stops the looper after the queue drains.
pub struct LooperHandle {
	executor: SerialExecutor,
	stop: Arc<AtomicBool>,
	join: Option<std::thread::JoinHandle<()>>,
}

impl LooperHandle {
	/// Stops the looper once queued tasks have run and joins the thread.
	pub fn shutdown(mut self) {
		self.stop_and_join(false);
	}

	/// Stops the looper after the current task, leaving queued tasks behind.
	pub fn abort(mut self) {
		self.stop_and_join(true);
	}

	fn stop_and_join(&mut self, immediate: bool) {
		self.stop.store(immediate, Ordering::Release);
		{
			let mut state = self.executor.inner.state.lock();
			state.shutdown = true;
			self.executor.inner.posted.notify_all();
		}
		if let Some(join) = self.join.take()
			&& join.join().is_err()
		{
			tracing::error!(executor = %self.executor.inner.name, "looper thread panicked");
		}
	}
}

impl Drop for LooperHandle {
	fn drop(&mut self) {
		if self.join.is_some() {
			self.stop_and_join(false);
		}
	}
}
