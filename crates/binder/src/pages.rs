use std::collections::BTreeSet;
use std::fmt;

use pagebind_model::PageId;

/// Set of page ids a consumer wants bound first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet(BTreeSet<PageId>);

impl PageSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, page: PageId) -> bool {
		self.0.contains(&page)
	}

	pub fn insert(&mut self, page: PageId) -> bool {
		self.0.insert(page)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Pages in ascending order.
	pub fn iter(&self) -> impl Iterator<Item = PageId> + '_ {
		self.0.iter().copied()
	}
}

impl FromIterator<PageId> for PageSet {
	fn from_iter<I: IntoIterator<Item = PageId>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl<const N: usize> From<[PageId; N]> for PageSet {
	fn from(pages: [PageId; N]) -> Self {
		pages.into_iter().collect()
	}
}

impl fmt::Display for PageSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		for (i, page) in self.iter().enumerate() {
			if i > 0 {
				f.write_str(",")?;
			}
			write!(f, "{page}")?;
		}
		f.write_str("}")
	}
}
