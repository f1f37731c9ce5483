//! Executor primitives shared by the model loader and the binder.
//!
//! Two logical executors exist:
//! - a single-threaded, ordered [`SerialExecutor`] that owns every
//!   consumer-visible mutation (the "UI-affine" executor)
//! - a [`WorkerPool`] running blocking work on background threads
//!
//! Both implement [`Executor`], so scheduling code posts continuations without
//! knowing which one it talks to. [`EpochClock`] and [`EpochToken`] provide the
//! cooperative cancellation used to drop work from superseded bind cycles.

mod budget;
mod class;
mod epoch;
mod error;
mod executor;
mod pool;
mod serial;
mod spawn;

pub use budget::{DrainBudget, DrainReport};
pub use class::TaskClass;
pub use epoch::{EpochClock, EpochToken};
pub use error::{Result, WorkerError};
pub use executor::{Executor, Task};
pub use pool::WorkerPool;
pub use serial::{LooperHandle, SerialExecutor};
pub use spawn::{spawn_blocking, spawn_named_thread};
