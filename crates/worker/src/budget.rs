use std::time::Duration;

/// Bound on one pump of a serial executor.
#[derive(Debug, Clone, Copy)]
pub struct DrainBudget {
	/// Wall-clock allowance for the pump.
	pub duration: Duration,
	/// Maximum number of tasks to run.
	pub max_completions: usize,
}

impl DrainBudget {
	/// Roughly one 60Hz frame.
	pub const FRAME: Self = Self {
		duration: Duration::from_millis(16),
		max_completions: usize::MAX,
	};

	/// Runs at most `n` tasks regardless of time.
	pub const fn tasks(n: usize) -> Self {
		Self {
			duration: Duration::MAX,
			max_completions: n,
		}
	}
}

/// Outcome of one budgeted pump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
	pub completed: usize,
	pub pending: usize,
	pub budget_exhausted: bool,
}
