//! `BinAlloc`: the core, non-`Sync` segregated-free-list allocator (§4.1, §4.4, §4.6, §4.8, §4.9).
//! See [`crate::unsafe_alloc`] and [`crate::sync_alloc`] for the `Sync` wrappers layered on top.

use core::cell::{Cell, UnsafeCell};
use core::ptr::{self, NonNull};

use crate::coalescer::coalesce;
use crate::finder::find_across_classes;
use crate::freelist::FreeListRegistry;
use crate::grower::grow;
use crate::header::{align_up, Header, Link};
use crate::provider::ChunkProvider;
use crate::sizeclass::class_of;

#[cfg(feature = "std")]
use crate::provider::SystemChunkProvider;

/// A segregated free-list allocator over memory obtained from a [`ChunkProvider`] `P`.
///
/// Not `Sync`: every method takes `&self` and mutates shared state through interior mutability,
/// which is sound only when calls are externally serialized. See [`crate::unsafe_alloc::UnsafeBinAlloc`]
/// and [`crate::sync_alloc::SyncBinAlloc`] to share one across threads.
pub struct BinAlloc<P> {
	registry: UnsafeCell<FreeListRegistry>,
	payload_bytes: Cell<usize>,
	provider: P,
}

impl<P> BinAlloc<P> {
	/// Builds an empty allocator over `provider`. No chunks are requested until the first
	/// `alloc` call that can't be satisfied by an existing free block (there are none yet).
	pub const fn new_in(provider: P) -> Self {
		Self {
			registry: UnsafeCell::new(FreeListRegistry::new()),
			payload_bytes: Cell::new(0),
			provider,
		}
	}
}

#[cfg(feature = "std")]
impl BinAlloc<SystemChunkProvider> {
	/// An allocator backed by the process's own global allocator as its chunk source.
	pub const fn new() -> Self {
		Self::new_in(SystemChunkProvider)
	}
}

#[cfg(feature = "std")]
impl Default for BinAlloc<SystemChunkProvider> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P: ChunkProvider> BinAlloc<P> {
	/// Resets every free-list head and the payload counter (§4.9).
	///
	/// # Safety
	/// Every pointer previously returned by `alloc` becomes invalid to pass to `free`. Chunks
	/// already obtained from the provider are not released; they are simply abandoned.
	pub unsafe fn init(&self) {
		unsafe { (*self.registry.get()).clear() };
		self.payload_bytes.set(0);
	}

	/// The cumulative payload_size of every chunk ever grown, regardless of the current
	/// free/allocated split (§4.8). Monotonically non-decreasing.
	pub fn heap_payload_bytes(&self) -> usize {
		self.payload_bytes.get()
	}

	/// Returns a pointer to at least `align_up(n, 16)` writable, 16-aligned bytes, or null if `n`
	/// is zero or no chunk the provider can supply would satisfy the request (§4.4).
	pub fn alloc(&self, n: usize) -> *mut u8 {
		if n == 0 {
			return ptr::null_mut();
		}
		let target = align_up(n);
		let home = class_of(target);
		let registry = unsafe { &mut *self.registry.get() };

		let mut found = unsafe { find_across_classes(registry, home, target) };
		if found.is_none() {
			let Some(grown_payload) = grow(&self.provider, registry, home, target) else {
				return ptr::null_mut();
			};
			self.payload_bytes.set(self.payload_bytes.get() + grown_payload);
			found = unsafe { registry.find_first_fit(home, target) }
				.map(|(block, predecessor)| (home, block, predecessor));
		}
		let Some((class, block, predecessor)) = found else {
			return ptr::null_mut();
		};

		unsafe { registry.unlink(class, predecessor, block) };

		if let Some(remainder) = unsafe { crate::splitter::split(block, target) } {
			Self::release_internal(registry, remainder);
		}

		let final_size = unsafe { block.as_ref() }.payload_size();
		unsafe { (*block.as_ptr()).write(final_size, class, true, Link::Allocated) };

		Header::payload_ptr(block).as_ptr()
	}

	/// Returns `p` to the free list, coalescing it with any free physical neighbors (§4.6, §4.7).
	/// `p == null` is a no-op. Freeing a pointer that is not currently allocated (already freed,
	/// or never returned by this allocator) is logged and otherwise ignored rather than causing
	/// undefined behavior on the allocator's own bookkeeping.
	///
	/// # Safety
	/// `p` must be null or a pointer previously returned by `self.alloc`, not already freed by a
	/// call to `self.free`.
	pub unsafe fn free(&self, p: *mut u8) {
		let Some(payload) = NonNull::new(p) else { return };
		let header = unsafe { Header::of(payload) };
		let registry = unsafe { &mut *self.registry.get() };
		Self::release_internal(registry, header);
	}

	/// Clears the allocated flag, splices `header` into its recorded class's free list, and
	/// coalesces it with any free physical neighbors. Shared by `free` and by `alloc`'s handling
	/// of a splitter remainder, so the splitter never has to re-enter through the public `free`
	/// API to dispose of the piece it didn't hand out.
	fn release_internal(registry: &mut FreeListRegistry, header: NonNull<Header>) {
		if !unsafe { header.as_ref() }.is_allocated() {
			log::warn!("double free (or free of a foreign pointer) at {:p}", header.as_ptr());
			return;
		}

		let class = unsafe { header.as_ref() }.class_index();
		unsafe { (*header.as_ptr()).clear_allocated() };
		let (predecessor, successor) = unsafe { registry.insert_sorted(class, header) };
		unsafe { coalesce(class, header, predecessor, successor) };
	}

	/// Satisfies `layout` through the raw `alloc`/`free` contract above, rejecting layouts over
	/// [`crate::header::ALIGNMENT`] (§4.11) and handling the zero-size case specially: a `Layout`
	/// of size 0 needs a dangling, correctly-aligned pointer so collection types can distinguish
	/// "no allocation needed" from "allocation failed", whereas the raw `alloc(0)` contract (§4.4)
	/// returns null for exactly that input.
	pub(crate) fn allocate_layout(
		&self,
		layout: crate::alloc_compat::Layout,
	) -> Result<NonNull<[u8]>, crate::alloc_compat::AllocError> {
		use crate::alloc_compat::AllocError;

		if layout.align() > crate::header::ALIGNMENT {
			return Err(AllocError);
		}
		if layout.size() == 0 {
			let dangling = NonNull::new(layout.align() as *mut u8).ok_or(AllocError)?;
			return Ok(NonNull::slice_from_raw_parts(dangling, 0));
		}
		let raw = self.alloc(layout.size());
		let ptr = NonNull::new(raw).ok_or(AllocError)?;
		Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
	}

	/// # Safety
	/// `ptr` must either be dangling with `layout.size() == 0`, or a live pointer this allocator
	/// previously returned for `layout` via [`Self::allocate_layout`].
	pub(crate) unsafe fn deallocate_layout(&self, ptr: NonNull<u8>, layout: crate::alloc_compat::Layout) {
		if layout.size() == 0 {
			return;
		}
		unsafe { self.free(ptr.as_ptr()) };
	}

	/// Implements grow/shrink uniformly as allocate-new, copy the overlapping prefix, free-old
	/// (§4.11): this allocator never attempts in-place growth of the current occupant.
	///
	/// # Safety
	/// Same preconditions as [`Self::deallocate_layout`] for `(ptr, old_layout)`.
	pub(crate) unsafe fn realloc_layout(
		&self,
		ptr: NonNull<u8>,
		old_layout: crate::alloc_compat::Layout,
		new_layout: crate::alloc_compat::Layout,
	) -> Result<NonNull<[u8]>, crate::alloc_compat::AllocError> {
		let new = self.allocate_layout(new_layout)?;
		let copy_len = old_layout.size().min(new_layout.size());
		if copy_len > 0 {
			unsafe { ptr::copy_nonoverlapping(ptr.as_ptr(), new.as_ptr() as *mut u8, copy_len) };
		}
		unsafe { self.deallocate_layout(ptr, old_layout) };
		Ok(new)
	}
}

#[cfg(any(feature = "allocator-api", feature = "allocator-api2"))]
mod allocator_impl {
	use super::*;
	use crate::alloc_compat::{AllocError, Allocator, Layout};

	/// Lets `BinAlloc<P>` directly back a `Vec`/`Box`/`String` via `Vec::new_in(&alloc)` etc.
	/// `Allocator` has no `Sync` bound, so this works on the bare, non-`Sync` core exactly as it
	/// does on the teacher crate's own core allocator type; only `#[global_allocator]` use needs
	/// one of the `Sync` wrappers.
	unsafe impl<P: ChunkProvider> Allocator for BinAlloc<P> {
		fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
			self.allocate_layout(layout)
		}

		unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
			unsafe { self.deallocate_layout(ptr, layout) };
		}

		unsafe fn grow(
			&self,
			ptr: NonNull<u8>,
			old_layout: Layout,
			new_layout: Layout,
		) -> Result<NonNull<[u8]>, AllocError> {
			unsafe { self.realloc_layout(ptr, old_layout, new_layout) }
		}

		unsafe fn shrink(
			&self,
			ptr: NonNull<u8>,
			old_layout: Layout,
			new_layout: Layout,
		) -> Result<NonNull<[u8]>, AllocError> {
			unsafe { self.realloc_layout(ptr, old_layout, new_layout) }
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::ChunkProvider;
	use core::alloc::Layout;

	struct LeakingProvider;
	impl ChunkProvider for LeakingProvider {
		fn request_chunk(&self, layout: Layout) -> Option<NonNull<u8>> {
			let buf = Box::leak(vec![0u8; layout.size()].into_boxed_slice());
			NonNull::new(buf.as_mut_ptr())
		}
	}

	struct FailingProvider;
	impl ChunkProvider for FailingProvider {
		fn request_chunk(&self, _layout: Layout) -> Option<NonNull<u8>> {
			None
		}
	}

	#[test]
	fn zero_size_alloc_returns_null() {
		let alloc = BinAlloc::new_in(LeakingProvider);
		assert!(alloc.alloc(0).is_null());
	}

	#[test]
	fn alloc_then_free_round_trips_and_tracks_payload() {
		let alloc = BinAlloc::new_in(LeakingProvider);
		let p = alloc.alloc(64);
		assert!(!p.is_null());
		assert!(alloc.heap_payload_bytes() >= 64);
		unsafe {
			p.write_bytes(0xAB, 64);
			alloc.free(p);
		}
	}

	#[test]
	fn exhausted_provider_yields_null() {
		let alloc = BinAlloc::new_in(FailingProvider);
		assert!(alloc.alloc(128).is_null());
	}

	#[test]
	fn freeing_twice_does_not_panic() {
		let alloc = BinAlloc::new_in(LeakingProvider);
		let p = alloc.alloc(32);
		unsafe {
			alloc.free(p);
			alloc.free(p); // double free: logged and ignored, not UB in this allocator's own state
		}
	}

	#[test]
	fn reuses_freed_block_for_a_later_allocation_of_the_same_class() {
		let alloc = BinAlloc::new_in(LeakingProvider);
		let a = alloc.alloc(64);
		unsafe { alloc.free(a) };
		let before = alloc.heap_payload_bytes();
		let b = alloc.alloc(64);
		assert_eq!(alloc.heap_payload_bytes(), before, "no new chunk should have been grown");
		assert!(!b.is_null());
		unsafe { alloc.free(b) };
	}

	#[test]
	fn init_abandons_all_outstanding_state() {
		let alloc = BinAlloc::new_in(LeakingProvider);
		let _ = alloc.alloc(64);
		unsafe { alloc.init() };
		assert_eq!(alloc.heap_payload_bytes(), 0);
	}

	#[test]
	fn zero_size_layout_gives_a_dangling_nonnull_pointer() {
		let alloc = BinAlloc::new_in(LeakingProvider);
		let layout = core::alloc::Layout::from_size_align(0, 8).unwrap();
		let slice = alloc.allocate_layout(layout).expect("zero-size never fails");
		assert_eq!(slice.len(), 0);
	}

	#[test]
	fn over_wide_alignment_layout_is_rejected() {
		let alloc = BinAlloc::new_in(LeakingProvider);
		let layout = core::alloc::Layout::from_size_align(64, 64).unwrap();
		assert!(alloc.allocate_layout(layout).is_err());
	}

	#[test]
	fn realloc_layout_copies_overlapping_prefix() {
		let alloc = BinAlloc::new_in(LeakingProvider);
		let old_layout = core::alloc::Layout::from_size_align(32, 16).unwrap();
		let new_layout = core::alloc::Layout::from_size_align(256, 16).unwrap();
		let original = alloc.allocate_layout(old_layout).unwrap().cast::<u8>();
		unsafe { original.as_ptr().write_bytes(0x7A, 32) };
		let grown = unsafe { alloc.realloc_layout(original, old_layout, new_layout) }
			.expect("growth should succeed against a leaking provider")
			.cast::<u8>();
		assert_eq!(unsafe { *grown.as_ptr() }, 0x7A);
	}
}
