//! The splitter (§4.5): decides whether a located block should be carved into an exact-fit piece
//! plus a remainder, or handed out whole.

use core::mem;
use core::ptr::NonNull;

use crate::header::{Header, Link, ALIGNMENT};

/// Considers splitting `block` (currently sized for `block.payload_size()`) down to `target`
/// bytes. If a split happens, `block`'s header is rewritten to `target` bytes in place and the
/// carved-off remainder is returned, already fully headered (sized, classed, and flagged
/// allocated) so the caller can route it straight through the insert-and-coalesce path as if it
/// were a tiny freed block. Returns `None` if the block is handed out whole, in which case
/// `block`'s header is left untouched.
///
/// # Safety
/// `block` must be a live header with a correctly populated `payload_size`, not the chunk
/// sentinel, and `target <= block.payload_size()`.
pub unsafe fn split(block: NonNull<Header>, target: usize) -> Option<NonNull<Header>> {
	let header_size = mem::size_of::<Header>();
	let size = unsafe { block.as_ref() }.payload_size();
	let block_total = size + header_size;
	let alloc_total = target + header_size;

	if block_total <= alloc_total {
		return None;
	}
	let remain = block_total - alloc_total;

	// Split when the leftover is itself a useful free block: either it would immediately
	// coalesce with an already-free physical neighbor, or it clears the quarter-of-original-size
	// threshold on its own.
	let adjacent = unsafe { Header::right_neighbor(block) };
	let adjacent_is_free = {
		let adjacent_ref = unsafe { adjacent.as_ref() };
		!adjacent_ref.is_sentinel() && !adjacent_ref.is_allocated()
	};
	let clears_quarter_threshold = remain >= header_size + ALIGNMENT && remain >= block_total / 4;

	if !(adjacent_is_free || clears_quarter_threshold) {
		return None;
	}

	let class = unsafe { block.as_ref() }.class_index();
	// Shrinks the size bits only; the caller finalizes class/allocated once it knows the final
	// size (unchanged here, but kept symmetric with the whole-block path in `block_alloc.rs`).
	unsafe { (*block.as_ptr()).set_size_only(target) };

	let remainder_offset = header_size + target;
	let remainder: NonNull<Header> = unsafe {
		NonNull::new_unchecked(block.as_ptr().cast::<u8>().add(remainder_offset).cast())
	};
	let remainder_payload = remain - header_size;
	unsafe {
		let mut header = Header::zeroed();
		header.write(remainder_payload, class, true, Link::Allocated);
		remainder.as_ptr().write(header);
	}

	Some(remainder)
}
