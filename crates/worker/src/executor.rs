use std::sync::Arc;

/// One posted continuation.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Anything that accepts posted continuations.
///
/// `execute` never blocks on the task running; ordering guarantees are
/// implementation specific ([`crate::SerialExecutor`] is strictly FIFO).
pub trait Executor: Send + Sync {
	fn execute(&self, task: Task);
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
	fn execute(&self, task: Task) {
		(**self).execute(task);
	}
}

impl<E: Executor + ?Sized> Executor for &E {
	fn execute(&self, task: Task) {
		(**self).execute(task);
	}
}
