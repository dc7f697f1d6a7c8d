//! The region grower (§4.3): asks the chunk provider for a new region when no existing free
//! block can satisfy a request, carves it into one large free block plus a trailing sentinel, and
//! splices the free block into the registry.

use core::alloc::Layout;
use core::mem;
use core::ptr::NonNull;

use crate::freelist::FreeListRegistry;
use crate::header::{Header, Link, ALIGNMENT};
use crate::provider::ChunkProvider;

/// `page / 4` is the starting chunk size; it doubles until it comfortably holds `target` plus
/// header overhead. Mirrors `umalloc.c`'s `extend`, which starts from a quarter-page and doubles.
const PAGE_SIZE: usize = 4096;

/// Requests a new chunk sized to hold at least `target` bytes in size class `home`, splices its
/// single free block into `registry`, and returns that block's payload_size (for the caller to
/// fold into the total-payload counter). Returns `None` if the provider refuses.
pub fn grow<P: ChunkProvider>(
	provider: &P,
	registry: &mut FreeListRegistry,
	home: usize,
	target: usize,
) -> Option<usize> {
	let header_size = mem::size_of::<Header>();

	let mut chunk_size = PAGE_SIZE / 4;
	while chunk_size < target + header_size {
		chunk_size *= 2;
	}

	// One guard header up front, one sentinel at the tail, and the leading free block's own
	// header: three words of overhead beyond the raw chunk size, as the design calls for.
	let request_size = chunk_size + 3 * header_size;
	let layout = Layout::from_size_align(request_size, ALIGNMENT).ok()?;
	let region = provider.request_chunk(layout)?;

	let free_payload_size = request_size - 2 * header_size;
	let block: NonNull<Header> = region.cast();
	unsafe {
		let mut header = Header::zeroed();
		header.write(free_payload_size, home, false, Link::Free(None));
		block.as_ptr().write(header);
	}

	let sentinel_offset = request_size - header_size;
	let sentinel: NonNull<Header> =
		unsafe { NonNull::new_unchecked(region.as_ptr().add(sentinel_offset).cast()) };
	unsafe {
		let mut header = Header::zeroed();
		header.write(0, home, true, Link::ChunkEnd);
		sentinel.as_ptr().write(header);
	}

	log::debug!(
		"grew a {request_size}-byte chunk for size class {home} (requested payload {target})"
	);

	unsafe { registry.insert_sorted(home, block) };
	Some(free_payload_size)
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::cell::Cell;

	struct RecordingProvider {
		last_layout: Cell<Option<Layout>>,
	}

	impl ChunkProvider for RecordingProvider {
		fn request_chunk(&self, layout: Layout) -> Option<NonNull<u8>> {
			self.last_layout.set(Some(layout));
			let buf = Box::leak(vec![0u8; layout.size()].into_boxed_slice());
			NonNull::new(buf.as_mut_ptr())
		}
	}

	#[test]
	fn grown_chunk_is_reachable_and_sentinel_terminated() {
		let provider = RecordingProvider { last_layout: Cell::new(None) };
		let mut registry = FreeListRegistry::new();

		let grown = grow(&provider, &mut registry, 0, 100).expect("provider succeeds");
		assert!(grown >= 100);

		let (block, predecessor) =
			unsafe { registry.find_first_fit(0, 100) }.expect("the new block is in the registry");
		assert!(predecessor.is_none());

		let right = unsafe { Header::right_neighbor(block) };
		assert!(unsafe { right.as_ref() }.is_sentinel());
	}

	#[test]
	fn chunk_size_doubles_from_a_quarter_page_until_it_fits() {
		let provider = RecordingProvider { last_layout: Cell::new(None) };
		let mut registry = FreeListRegistry::new();

		grow(&provider, &mut registry, 0, 16).unwrap();
		let small_layout = provider.last_layout.get().unwrap();
		assert!(small_layout.size() >= PAGE_SIZE / 4);

		grow(&provider, &mut registry, 0, 100_000).unwrap();
		let big_layout = provider.last_layout.get().unwrap();
		assert!(big_layout.size() > small_layout.size());
	}
}
