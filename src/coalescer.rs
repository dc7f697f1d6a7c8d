//! The coalescer (§4.7): merges a newly freed block with its immediate physical neighbors, right
//! then left, folding their payload and header overhead into a single larger free block.

use core::mem;
use core::ptr::NonNull;

use crate::header::{Header, Link};

/// `block` has just been spliced into its class's free list at `predecessor`/`successor`
/// (address-ordered neighbors, not necessarily physical ones). Merges it with its *physical*
/// right neighbor if that neighbor is free, then with its physical left neighbor if that is free.
/// Returns the header of the resulting block, which is `predecessor` when a left merge occurred
/// and `block` otherwise.
///
/// Merging only ever rewrites `metadata`/`link` on the surviving header; every list head and
/// every other block's `link` field was already correct the moment `insert_sorted` ran, so no
/// further list bookkeeping is needed here.
///
/// # Safety
/// `block`, `predecessor`, and `successor` must be exactly the header and free-list neighbors
/// `FreeListRegistry::insert_sorted` returned for `block` in class `class`.
pub unsafe fn coalesce(
	class: usize,
	mut block: NonNull<Header>,
	predecessor: Option<NonNull<Header>>,
	successor: Option<NonNull<Header>>,
) -> NonNull<Header> {
	let header_size = mem::size_of::<Header>();

	if let Some(next) = successor {
		if unsafe { Header::right_neighbor(block) } == next {
			let merged = unsafe { block.as_ref() }.payload_size()
				+ header_size
				+ unsafe { next.as_ref() }.payload_size();
			let next_link = match unsafe { next.as_ref() }.link() {
				Link::Free(tail) => tail,
				_ => unreachable!("a free list's successor is always itself free-linked"),
			};
			unsafe { (*block.as_ptr()).write(merged, class, false, Link::Free(next_link)) };
		}
	}

	if let Some(prev) = predecessor {
		if unsafe { Header::right_neighbor(prev) } == block {
			let merged = unsafe { prev.as_ref() }.payload_size()
				+ header_size
				+ unsafe { block.as_ref() }.payload_size();
			let block_link = match unsafe { block.as_ref() }.link() {
				Link::Free(tail) => tail,
				_ => unreachable!("a free list's member is always itself free-linked"),
			};
			unsafe { (*prev.as_ptr()).write(merged, class, false, Link::Free(block_link)) };
			block = prev;
		}
	}

	block
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw_block(buf: &mut [u8], offset: usize, payload_size: usize, allocated: bool) -> NonNull<Header> {
		let ptr: NonNull<Header> = unsafe { NonNull::new_unchecked(buf.as_mut_ptr().add(offset).cast()) };
		unsafe {
			let mut header = Header::zeroed();
			header.write(payload_size, 0, allocated, Link::Allocated);
			ptr.as_ptr().write(header);
		}
		ptr
	}

	#[test]
	fn merges_right_neighbor_when_physically_adjacent_and_free() {
		let header_size = mem::size_of::<Header>();
		let mut buf = vec![0u8; header_size * 3 + 64 + 64];
		let block = raw_block(&mut buf, 0, 64, false);
		let right = raw_block(&mut buf, header_size + 64, 64, false);
		unsafe { (*right.as_ptr()).set_link(Link::Free(None)) };

		let result = unsafe { coalesce(0, block, None, Some(right)) };
		assert_eq!(result, block);
		assert_eq!(unsafe { result.as_ref() }.payload_size(), 64 + header_size + 64);
		assert_eq!(unsafe { result.as_ref() }.link(), Link::Free(None));
	}

	#[test]
	fn merges_left_neighbor_and_reports_it_as_the_survivor() {
		let header_size = mem::size_of::<Header>();
		let mut buf = vec![0u8; header_size * 3 + 32 + 32];
		let left = raw_block(&mut buf, 0, 32, false);
		let block = raw_block(&mut buf, header_size + 32, 32, false);
		unsafe { (*block.as_ptr()).set_link(Link::Free(None)) };

		let result = unsafe { coalesce(0, block, Some(left), None) };
		assert_eq!(result, left);
		assert_eq!(unsafe { result.as_ref() }.payload_size(), 32 + header_size + 32);
	}

	#[test]
	fn does_not_merge_non_adjacent_free_neighbors() {
		let header_size = mem::size_of::<Header>();
		let mut buf = vec![0u8; header_size * 4 + 32 + 32 + 32];
		let block = raw_block(&mut buf, 0, 32, false);
		// Leave a gap: `far` sits two blocks away, not immediately to the right of `block`.
		let far = raw_block(&mut buf, header_size * 2 + 64, 32, false);

		let result = unsafe { coalesce(0, block, None, Some(far)) };
		assert_eq!(result, block);
		assert_eq!(unsafe { result.as_ref() }.payload_size(), 32);
	}
}
