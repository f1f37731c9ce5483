use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic bind-generation counter shared between the model and every
/// in-flight unit of work.
///
/// The clock is the only piece of mutable state read outside the model lock;
/// it is always accessed as a single atomic load or increment.
#[derive(Debug, Default, Clone)]
pub struct EpochClock {
	current: Arc<AtomicU64>,
}

impl EpochClock {
	/// Creates a clock at generation 0.
	pub fn new() -> Self {
		Self::default()
	}

	/// Advances the generation and returns the new value.
	///
	/// Every token minted before this call becomes stale.
	pub fn advance(&self) -> u64 {
		self.current.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Returns the live generation.
	pub fn current(&self) -> u64 {
		self.current.load(Ordering::Acquire)
	}

	/// Mints a token for the live generation.
	pub fn token(&self) -> EpochToken {
		self.token_for(self.current())
	}

	/// Mints a token stamped with an explicit generation.
	pub fn token_for(&self, epoch: u64) -> EpochToken {
		EpochToken {
			epoch,
			clock: self.clone(),
		}
	}
}

/// Cooperative cancellation token for one bind cycle.
///
/// A unit carrying a token checks [`Self::is_current`] at the last moment
/// before taking effect; there is no explicit cancel.
#[derive(Debug, Clone)]
pub struct EpochToken {
	epoch: u64,
	clock: EpochClock,
}

impl EpochToken {
	/// Returns the generation this token was stamped with.
	pub const fn epoch(&self) -> u64 {
		self.epoch
	}

	/// Returns true while no newer cycle has started.
	pub fn is_current(&self) -> bool {
		self.clock.current() == self.epoch
	}

	/// Returns true once a newer cycle has started.
	pub fn is_stale(&self) -> bool {
		!self.is_current()
	}
}
