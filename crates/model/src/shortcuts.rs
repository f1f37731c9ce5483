use rustc_hash::FxHashMap;

/// Profile identifier that owns an activity.
pub type UserId = u32;

/// Identity of a launchable activity within one profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey {
	pub package: String,
	pub activity: String,
	pub user: UserId,
}

/// Number of deep-link shortcuts exposed by each activity.
pub type DeepShortcutMap = FxHashMap<ComponentKey, usize>;

/// Shortcut metadata reported by the host for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
	pub package: String,
	/// Owning activity; shortcuts without one are not counted.
	pub activity: Option<String>,
	pub user: UserId,
	pub enabled: bool,
	pub declared_in_manifest: bool,
	pub dynamic: bool,
}

impl ShortcutInfo {
	/// Returns the component this shortcut counts toward, if it counts at all.
	pub fn counted_component(&self) -> Option<ComponentKey> {
		if !self.enabled || !(self.declared_in_manifest || self.dynamic) {
			return None;
		}
		let activity = self.activity.as_ref()?;
		Some(ComponentKey {
			package: self.package.clone(),
			activity: activity.clone(),
			user: self.user,
		})
	}
}

/// Replaces the counts for `package`/`user` with counts derived from `shortcuts`.
///
/// When `package` is `None` nothing is cleared and the new counts are added.
pub(crate) fn update_counts(map: &mut DeepShortcutMap, package: Option<&str>, user: UserId, shortcuts: &[ShortcutInfo]) {
	if let Some(package) = package {
		map.retain(|key, _| !(key.package == package && key.user == user));
	}
	for key in shortcuts.iter().filter_map(ShortcutInfo::counted_component) {
		*map.entry(key).or_insert(0) += 1;
	}
}
