//! The chunk provider abstraction (§4.10): the one external collaborator the region grower calls
//! into. spec.md treats "the underlying large-region provider" as an opaque external actor that
//! can hand back aligned, requested-size chunks and is never asked to give them back; this trait
//! is the concrete shape of that assumption.

use core::alloc::Layout;
use core::ptr::NonNull;

/// A source of large contiguous memory regions for the region grower to carve into blocks.
///
/// Implementers hand out regions that live for as long as the allocator does; nothing in this
/// crate ever calls back in to release one (see the Non-goals: shrinking the heap back to the
/// provider is explicitly out of scope).
pub trait ChunkProvider {
	/// Requests a region matching `layout`. Returns `None` if the provider cannot satisfy it.
	fn request_chunk(&self, layout: Layout) -> Option<NonNull<u8>>;
}

/// The default host-backed provider: chunks come from the process's global allocator.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemChunkProvider;

#[cfg(feature = "std")]
impl ChunkProvider for SystemChunkProvider {
	fn request_chunk(&self, layout: Layout) -> Option<NonNull<u8>> {
		// SAFETY: `layout` is non-zero-sized (the grower never requests an empty chunk) and
		// well-formed (`Layout::from_size_align` already validated it).
		let ptr = unsafe { std::alloc::alloc(layout) };
		NonNull::new(ptr)
	}
}
