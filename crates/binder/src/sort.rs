//! Reading-order sort for partition buckets.

use pagebind_model::{Container, Item, PageId, Position};

use crate::config::UnknownContainerPolicy;
use crate::error::{BindError, Result};

/// Composite sort key: container tag, then page rank, row, column and rank.
type SortKey = (i32, usize, u16, u16, u32);

fn sort_key(item: &Item, pages: &[PageId], policy: UnknownContainerPolicy) -> Result<SortKey> {
	let raw = item.container.raw();
	match (item.container, item.position) {
		(Container::Desktop, Position::Cell { page, x, y }) => {
			let page_rank = pages.iter().position(|p| *p == page).unwrap_or(pages.len());
			Ok((raw, page_rank, y, x, 0))
		}
		(Container::Hotseat, Position::Rank(rank)) => Ok((raw, 0, 0, 0, rank)),
		(Container::Hotseat, Position::Cell { x, y, .. }) => Ok((raw, 0, y, x, 0)),
		(container, _) => match policy {
			UnknownContainerPolicy::Fatal if matches!(container, Container::Unknown(_)) => Err(BindError::UnknownContainer { item: item.id, container }),
			UnknownContainerPolicy::Fatal => Err(BindError::MisplacedItem { item: item.id, container }),
			UnknownContainerPolicy::DefaultRank => Ok((raw, 0, 0, 0, 0)),
		},
	}
}

/// Sorts `items` in place into spatial reading order.
///
/// Grid items order by `(page rank, row, column)`, where the page rank is the
/// index of the item's page in `pages`. Strip items order by rank. Between
/// containers the raw container tag decides, so the strip sorts first. The
/// sort is stable, so items tied under [`UnknownContainerPolicy::DefaultRank`]
/// keep their input order.
pub fn sort_spatially(items: &mut [Item], pages: &[PageId], policy: UnknownContainerPolicy) -> Result<()> {
	let mut keyed = items.iter().map(|item| sort_key(item, pages, policy).map(|key| (key, item.clone()))).collect::<Result<Vec<_>>>()?;
	keyed.sort_by_key(|(key, _)| *key);
	for (slot, (_, item)) in items.iter_mut().zip(keyed) {
		*slot = item;
	}
	Ok(())
}
