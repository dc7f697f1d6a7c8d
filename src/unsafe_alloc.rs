//! `UnsafeBinAlloc`: a `Sync`-asserting wrapper around [`BinAlloc`] with no synchronization of
//! its own (§4.12). Safe to construct only when the caller can prove out-of-band that it is never
//! accessed concurrently - typically a `#[global_allocator]` in a single-threaded program.

use core::fmt::{self, Debug, Formatter};
use core::ops::Deref;
use core::ptr::{self, NonNull};

use crate::block_alloc::BinAlloc;
use crate::header::ALIGNMENT;
use crate::provider::ChunkProvider;

#[cfg(feature = "std")]
use crate::provider::SystemChunkProvider;

/// Wraps [`BinAlloc`] and asserts `Sync` without adding any locking.
///
/// # Safety of construction
/// Constructing this type is `unsafe`: nothing prevents two threads from calling `alloc`/`free`
/// on the same instance concurrently, which is undefined behavior on the wrapped core (§5). Only
/// construct this in a program (or a scope of one) that is provably single-threaded.
pub struct UnsafeBinAlloc<P> {
	inner: BinAlloc<P>,
}

impl<P> Deref for UnsafeBinAlloc<P> {
	type Target = BinAlloc<P>;

	fn deref(&self) -> &Self::Target {
		&self.inner
	}
}

impl<P> Debug for UnsafeBinAlloc<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "UnsafeBinAlloc {{ heap_payload_bytes: {} }}", self.inner.heap_payload_bytes())
	}
}

impl<P> UnsafeBinAlloc<P> {
	/// # Safety
	/// See the type-level safety note: the caller must ensure this value is never accessed from
	/// more than one thread at a time.
	pub const unsafe fn new_in(provider: P) -> Self {
		Self { inner: BinAlloc::new_in(provider) }
	}
}

#[cfg(feature = "std")]
impl UnsafeBinAlloc<SystemChunkProvider> {
	/// # Safety
	/// See the type-level safety note.
	pub const unsafe fn new() -> Self {
		// SAFETY: forwarded to the caller of this function.
		unsafe { Self::new_in(SystemChunkProvider) }
	}
}

unsafe impl<P> Sync for UnsafeBinAlloc<P> {}

#[cfg(any(feature = "allocator-api", feature = "allocator-api2"))]
mod allocator_impl {
	use super::*;
	use crate::alloc_compat::{AllocError, Allocator, Layout};

	/// Delegates straight to the wrapped core's own `Allocator` impl (block_alloc.rs); `Deref`
	/// gives call sites field-and-method access to `BinAlloc`, but trait bounds like
	/// `A: Allocator` are not satisfied through `Deref`, so each method still needs forwarding.
	unsafe impl<P: ChunkProvider> Allocator for UnsafeBinAlloc<P> {
		fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
			self.inner.allocate(layout)
		}

		unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
			unsafe { self.inner.deallocate(ptr, layout) };
		}

		unsafe fn grow(
			&self,
			ptr: NonNull<u8>,
			old_layout: Layout,
			new_layout: Layout,
		) -> Result<NonNull<[u8]>, AllocError> {
			unsafe { self.inner.grow(ptr, old_layout, new_layout) }
		}

		unsafe fn shrink(
			&self,
			ptr: NonNull<u8>,
			old_layout: Layout,
			new_layout: Layout,
		) -> Result<NonNull<[u8]>, AllocError> {
			unsafe { self.inner.shrink(ptr, old_layout, new_layout) }
		}
	}
}

unsafe impl<P: ChunkProvider> core::alloc::GlobalAlloc for UnsafeBinAlloc<P> {
	unsafe fn alloc(&self, layout: core::alloc::Layout) -> *mut u8 {
		if layout.align() > ALIGNMENT {
			return ptr::null_mut();
		}
		self.inner.alloc(layout.size())
	}

	unsafe fn dealloc(&self, ptr: *mut u8, _layout: core::alloc::Layout) {
		unsafe { self.inner.free(ptr) };
	}

	unsafe fn realloc(
		&self,
		ptr: *mut u8,
		layout: core::alloc::Layout,
		new_size: usize,
	) -> *mut u8 {
		if layout.align() > ALIGNMENT {
			return ptr::null_mut();
		}
		let new = self.inner.alloc(new_size);
		if new.is_null() {
			return ptr::null_mut();
		}
		let copy_len = layout.size().min(new_size);
		if copy_len > 0 {
			unsafe { ptr::copy_nonoverlapping(ptr, new, copy_len) };
		}
		unsafe { self.inner.free(ptr) };
		new
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::alloc::Layout as StdLayout;

	struct LeakingProvider;
	impl ChunkProvider for LeakingProvider {
		fn request_chunk(&self, layout: core::alloc::Layout) -> Option<NonNull<u8>> {
			let buf = Box::leak(vec![0u8; layout.size()].into_boxed_slice());
			NonNull::new(buf.as_mut_ptr())
		}
	}

	#[test]
	fn global_alloc_realloc_moves_and_copies_prefix() {
		let alloc = unsafe { UnsafeBinAlloc::new_in(LeakingProvider) };
		let layout = StdLayout::from_size_align(32, 16).unwrap();
		unsafe {
			let p = core::alloc::GlobalAlloc::alloc(&alloc, layout);
			assert!(!p.is_null());
			p.write_bytes(0x42, 32);
			let grown = core::alloc::GlobalAlloc::realloc(&alloc, p, layout, 512);
			assert!(!grown.is_null());
			assert_eq!(*grown, 0x42);
			core::alloc::GlobalAlloc::dealloc(&alloc, grown, StdLayout::from_size_align(512, 16).unwrap());
		}
	}

	#[test]
	fn global_alloc_rejects_over_wide_alignment() {
		let alloc = unsafe { UnsafeBinAlloc::new_in(LeakingProvider) };
		let layout = StdLayout::from_size_align(64, 64).unwrap();
		let p = unsafe { core::alloc::GlobalAlloc::alloc(&alloc, layout) };
		assert!(p.is_null());
	}
}
