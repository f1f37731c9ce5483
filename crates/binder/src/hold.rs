//! Install-queue pauses owned by bind cycles.
//!
//! A cycle pauses the queue once for all of its sessions. Each session gives
//! its share back exactly once: from the deferred tail when it runs, or from
//! whichever guarded step first finds the session superseded. A newer cycle
//! also reclaims the share of any older cycle it replaces, so a session whose
//! deferred work is never released cannot hold writes back forever.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pagebind_model::{InstallQueue, PauseFlags};
use parking_lot::Mutex;

/// Keeps [`PauseFlags::LOADER_RUNNING`] set while any cycle still owes a resume.
#[derive(Debug)]
pub(crate) struct LoaderHold {
	install: Arc<InstallQueue>,
	/// Cycles that have paused the queue and not yet given it back.
	live: Mutex<usize>,
}

impl LoaderHold {
	pub(crate) fn new(install: Arc<InstallQueue>) -> Arc<Self> {
		Arc::new(Self { install, live: Mutex::new(0) })
	}

	/// Pauses the queue on behalf of a cycle running `sessions` sessions.
	pub(crate) fn acquire(self: &Arc<Self>, generation: u64, sessions: usize) -> Arc<CycleHold> {
		debug_assert!(sessions > 0, "a cycle without sessions never resumes");
		let mut live = self.live.lock();
		if *live == 0 {
			self.install.pause(PauseFlags::LOADER_RUNNING);
		}
		*live += 1;
		tracing::trace!(generation, sessions, live = *live, "install.hold");
		Arc::new(CycleHold {
			owner: Arc::clone(self),
			generation,
			outstanding: AtomicUsize::new(sessions),
		})
	}

	fn release(&self, generation: u64) {
		let mut live = self.live.lock();
		*live = live.saturating_sub(1);
		tracing::trace!(generation, live = *live, "install.release");
		if *live == 0 {
			self.install.resume(PauseFlags::LOADER_RUNNING);
		}
	}
}

/// One cycle's pause, shared by its sessions.
#[derive(Debug)]
pub(crate) struct CycleHold {
	owner: Arc<LoaderHold>,
	generation: u64,
	outstanding: AtomicUsize,
}

impl CycleHold {
	pub(crate) fn generation(&self) -> u64 {
		self.generation
	}

	pub(crate) fn session(self: &Arc<Self>) -> SessionHold {
		SessionHold {
			cycle: Arc::clone(self),
			done: Arc::new(AtomicBool::new(false)),
		}
	}

	/// Gives the pause back now, whatever the sessions still owe.
	pub(crate) fn abandon(&self) {
		if self.outstanding.swap(0, Ordering::AcqRel) > 0 {
			self.owner.release(self.generation);
		}
	}

	fn session_done(&self) {
		if self.outstanding.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1)) == Ok(1) {
			self.owner.release(self.generation);
		}
	}
}

/// One session's share of a [`CycleHold`]. Clones share the same share.
#[derive(Debug, Clone)]
pub(crate) struct SessionHold {
	cycle: Arc<CycleHold>,
	done: Arc<AtomicBool>,
}

impl SessionHold {
	/// Returns this session's share; later calls are no-ops.
	pub(crate) fn release(&self) {
		if !self.done.swap(true, Ordering::AcqRel) {
			self.cycle.session_done();
		}
	}
}
