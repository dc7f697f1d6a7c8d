//! The block finder (§4.2): first-fit within a class, with ascending fallback across classes.

use core::ptr::NonNull;

use crate::freelist::FreeListRegistry;
use crate::header::Header;
use crate::sizeclass::CLASS_COUNT;

/// Searches `home`, then each class above it in turn, for the first block whose payload is at
/// least `target`. No wrap-around; classes below `home` are never consulted. Returns the class
/// the fit was found in along with the block and its predecessor.
///
/// # Safety
/// Every block reachable from any of `registry`'s heads must be a live, correctly linked header.
pub unsafe fn find_across_classes(
	registry: &FreeListRegistry,
	home: usize,
	target: usize,
) -> Option<(usize, NonNull<Header>, Option<NonNull<Header>>)> {
	for class in home..CLASS_COUNT {
		if let Some((block, predecessor)) = unsafe { registry.find_first_fit(class, target) } {
			return Some((class, block, predecessor));
		}
	}
	None
}
