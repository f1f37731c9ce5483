use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;

use crate::error::Result;
use crate::item::Item;
use crate::shared::SharedModel;

bitflags! {
	/// Reasons the install queue is holding writes back.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct PauseFlags: u32 {
		/// A load or bind cycle is in progress.
		const LOADER_RUNNING = 1 << 0;
		/// The user is dragging an item.
		const DRAG_AND_DROP = 1 << 1;
	}
}

#[derive(Debug, Default)]
struct InstallState {
	paused: PauseFlags,
	pending: Vec<Item>,
}

/// Loader-side queue for item insertions requested while binding runs.
///
/// Lock order is queue state, then model; the model never calls back here.
#[derive(Debug)]
pub struct InstallQueue {
	model: Arc<SharedModel>,
	state: Mutex<InstallState>,
}

impl InstallQueue {
	pub fn new(model: Arc<SharedModel>) -> Self {
		Self {
			model,
			state: Mutex::new(InstallState::default()),
		}
	}

	/// Applies `item` now, or holds it while any pause flag is set.
	///
	/// Returns true when the item reached the model immediately.
	pub fn queue(&self, item: Item) -> Result<bool> {
		let mut state = self.state.lock();
		if !state.paused.is_empty() {
			tracing::trace!(item = item.id, paused = ?state.paused, "install.hold");
			state.pending.push(item);
			return Ok(false);
		}
		self.model.write(|tables| tables.add_item(item, true))?;
		Ok(true)
	}

	pub fn pause(&self, flag: PauseFlags) {
		self.state.lock().paused.insert(flag);
	}

	/// Clears `flag`; once no flag remains, flushes held items into the model
	/// in arrival order and returns how many were applied.
	pub fn resume(&self, flag: PauseFlags) -> usize {
		let mut state = self.state.lock();
		state.paused.remove(flag);
		if !state.paused.is_empty() || state.pending.is_empty() {
			return 0;
		}

		let pending = std::mem::take(&mut state.pending);
		let applied = self.model.write(|tables| {
			pending
				.into_iter()
				.filter_map(|item| {
					tables
						.add_item(item, true)
						.inspect_err(|err| tracing::warn!(%err, "dropping held install"))
						.ok()
				})
				.count()
		});
		tracing::debug!(applied, "install.flush");
		applied
	}

	pub fn is_paused(&self) -> bool {
		!self.state.lock().paused.is_empty()
	}

	pub fn pending_len(&self) -> usize {
		self.state.lock().pending.len()
	}
}
