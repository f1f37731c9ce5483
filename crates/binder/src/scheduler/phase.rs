use std::fmt;

/// Per-consumer progress through one bind cycle.
///
/// Phases advance one step at a time; none may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BindPhase {
	#[default]
	NotStarted,
	/// Consumer told to drop partial state and start a session.
	Clearing,
	/// Ordered page list delivered.
	ScreensBound,
	/// Visible-page items, widgets and extra groups scheduled.
	CurrentBound,
	/// Remaining items and the session tail scheduled as deferred work.
	OtherScheduled,
	/// Settled report scheduled. Terminal.
	Settled,
}

impl BindPhase {
	pub const fn next(self) -> Option<Self> {
		match self {
			Self::NotStarted => Some(Self::Clearing),
			Self::Clearing => Some(Self::ScreensBound),
			Self::ScreensBound => Some(Self::CurrentBound),
			Self::CurrentBound => Some(Self::OtherScheduled),
			Self::OtherScheduled => Some(Self::Settled),
			Self::Settled => None,
		}
	}

	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Settled)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::NotStarted => "not-started",
			Self::Clearing => "clearing",
			Self::ScreensBound => "screens-bound",
			Self::CurrentBound => "current-bound",
			Self::OtherScheduled => "other-scheduled",
			Self::Settled => "settled",
		}
	}
}

impl fmt::Display for BindPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
