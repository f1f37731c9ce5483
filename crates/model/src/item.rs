use std::fmt;

/// Stable item identifier, unique within one generation.
pub type ItemId = i32;

/// Logical page identifier on the paginated grid.
pub type PageId = i32;

/// Page that always exists, even when no item lives on it.
pub const FIRST_PAGE_ID: PageId = 0;

/// Logical group an item is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Container {
	/// The paginated grid.
	Desktop,
	/// The fixed-rank strip shown on every page.
	Hotseat,
	/// Nested inside the collection item with this id.
	Collection(ItemId),
	/// A raw container tag this build does not understand.
	Unknown(i32),
}

impl Container {
	pub const DESKTOP_TAG: i32 = -100;
	pub const HOTSEAT_TAG: i32 = -101;

	/// Decodes a persisted container tag.
	///
	/// Non-negative tags reference the collection item that owns the row.
	pub const fn from_raw(raw: i32) -> Self {
		match raw {
			Self::DESKTOP_TAG => Self::Desktop,
			Self::HOTSEAT_TAG => Self::Hotseat,
			id if id >= 0 => Self::Collection(id),
			other => Self::Unknown(other),
		}
	}

	pub const fn raw(self) -> i32 {
		match self {
			Self::Desktop => Self::DESKTOP_TAG,
			Self::Hotseat => Self::HOTSEAT_TAG,
			Self::Collection(id) => id,
			Self::Unknown(raw) => raw,
		}
	}
}

impl fmt::Display for Container {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Desktop => f.write_str("desktop"),
			Self::Hotseat => f.write_str("hotseat"),
			Self::Collection(id) => write!(f, "collection#{id}"),
			Self::Unknown(raw) => write!(f, "unknown({raw})"),
		}
	}
}

/// Where an item sits inside its container.
///
/// Grid cells are meaningful for [`Container::Desktop`]; ranks for the strip
/// and for collection children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
	Cell { page: PageId, x: u16, y: u16 },
	Rank(u32),
}

/// Item kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
	/// Plain launchable entry.
	Shortcut,
	/// Entry backed by a deep-link shortcut.
	DeepShortcut,
	/// Folder-like collection owning child items.
	Collection,
	/// Multi-cell container widget.
	Widget { span_x: u8, span_y: u8 },
}

impl ItemKind {
	pub const fn is_widget(self) -> bool {
		matches!(self, Self::Widget { .. })
	}
}

/// One placed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
	pub id: ItemId,
	pub container: Container,
	pub position: Position,
	pub kind: ItemKind,
	pub title: String,
	/// Rank-ordered children of a collection, filled in by
	/// [`crate::SharedModel::take_snapshot`]. Empty in the model itself.
	pub contents: Vec<Item>,
}

impl Item {
	/// Creates a desktop item at a grid cell.
	pub fn cell(id: ItemId, kind: ItemKind, page: PageId, x: u16, y: u16) -> Self {
		Self {
			id,
			container: Container::Desktop,
			position: Position::Cell { page, x, y },
			kind,
			title: String::new(),
			contents: Vec::new(),
		}
	}

	/// Creates a strip item at a rank.
	pub fn ranked(id: ItemId, kind: ItemKind, rank: u32) -> Self {
		Self {
			id,
			container: Container::Hotseat,
			position: Position::Rank(rank),
			kind,
			title: String::new(),
			contents: Vec::new(),
		}
	}

	/// Creates a child of the collection `parent`.
	pub fn child_of(id: ItemId, parent: ItemId, rank: u32) -> Self {
		Self {
			id,
			container: Container::Collection(parent),
			position: Position::Rank(rank),
			kind: ItemKind::Shortcut,
			title: String::new(),
			contents: Vec::new(),
		}
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = title.into();
		self
	}

	pub fn with_container(mut self, container: Container) -> Self {
		self.container = container;
		self
	}

	/// Returns the grid page for cell-placed items.
	pub const fn page(&self) -> Option<PageId> {
		match self.position {
			Position::Cell { page, .. } => Some(page),
			Position::Rank(_) => None,
		}
	}

	pub const fn is_widget(&self) -> bool {
		self.kind.is_widget()
	}

	/// Ordering rank inside a strip or collection; grid cells sort last.
	pub const fn rank(&self) -> u32 {
		match self.position {
			Position::Rank(rank) => rank,
			Position::Cell { .. } => u32::MAX,
		}
	}
}

impl fmt::Display for Item {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "item#{} {} ", self.id, self.container)?;
		match self.position {
			Position::Cell { page, x, y } => write!(f, "page={page} cell=({x},{y})")?,
			Position::Rank(rank) => write!(f, "rank={rank}")?,
		}
		if !self.title.is_empty() {
			write!(f, " {:?}", self.title)?;
		}
		if !self.contents.is_empty() {
			write!(f, " contents={}", self.contents.len())?;
		}
		Ok(())
	}
}

/// Stable tag for a fixed or extra group (for example a prediction row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupTag(pub i32);

impl GroupTag {
	pub const PREDICTION: Self = Self(-102);
	pub const HOTSEAT_PREDICTION: Self = Self(-103);
	pub const WIDGETS_PREDICTION: Self = Self(-111);
}

/// Items owned by a fixed container, delivered as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraGroup {
	pub tag: GroupTag,
	pub items: Vec<Item>,
}

impl ExtraGroup {
	pub fn new(tag: GroupTag, items: Vec<Item>) -> Self {
		Self { tag, items }
	}
}

impl fmt::Display for ExtraGroup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "extra group {} ({} items)", self.tag.0, self.items.len())
	}
}
