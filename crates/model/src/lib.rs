//! In-memory item model shared by the loader and the binder.
//!
//! The loader mutates [`SharedModel`] through [`SharedModel::write`], which
//! holds the model's exclusive lock for the whole closure. Readers never lock
//! the model themselves; they call [`SharedModel::take_snapshot`] (or one of
//! the narrower copy accessors) and work on the returned immutable copy.

/// Error types for model writes.
pub mod error;
/// Loader-side queue of writes held back while binding is in progress.
pub mod install;
/// Placed items, containers, and positions.
pub mod item;
/// The lock-guarded model and its write tables.
pub mod shared;
/// Deep-shortcut count bookkeeping.
pub mod shortcuts;
/// Point-in-time copies handed to the binder.
pub mod snapshot;
/// Auxiliary string cache delivered alongside items.
pub mod strings;

pub use error::{ModelError, Result};
pub use install::{InstallQueue, PauseFlags};
pub use item::{Container, ExtraGroup, FIRST_PAGE_ID, GroupTag, Item, ItemId, ItemKind, PageId, Position};
pub use shared::{ModelOptions, ModelTables, SharedModel};
pub use shortcuts::{ComponentKey, DeepShortcutMap, ShortcutInfo, UserId};
pub use snapshot::Snapshot;
pub use strings::StringCache;
