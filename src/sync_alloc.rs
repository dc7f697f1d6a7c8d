//! `SyncBinAlloc`: a `Mutex`-backed, safe-to-construct `Sync` wrapper around [`BinAlloc`] (§4.12).
//! Safe for genuinely multi-threaded callers at the cost of lock overhead on every call; see
//! [`UnsafeBinAlloc`] for a lock-free alternative when single-threaded access can be proven
//! out-of-band.

use core::fmt::{self, Debug, Formatter};
use std::sync::{Mutex, MutexGuard};

use crate::alloc_compat::{AllocError, Layout};
use crate::provider::ChunkProvider;
use crate::unsafe_alloc::UnsafeBinAlloc;

#[cfg(feature = "std")]
use crate::provider::SystemChunkProvider;

/// A `Mutex<UnsafeBinAlloc<P>>` in substance: every public method acquires the lock, forwards to
/// the inner wrapper, and releases it. The wrapped core's single-threaded contract (§5) holds
/// because the lock serializes every entry.
pub struct SyncBinAlloc<P> {
	inner: Mutex<UnsafeBinAlloc<P>>,
}

impl<P> SyncBinAlloc<P> {
	pub fn new_in(provider: P) -> Self {
		Self {
			// SAFETY: the Mutex below serializes every access to the wrapped core.
			inner: Mutex::new(unsafe { UnsafeBinAlloc::new_in(provider) }),
		}
	}

	fn lock(&self) -> MutexGuard<'_, UnsafeBinAlloc<P>> {
		// A panic inside one of the allocator's own methods is already undefined behavior on the
		// core (§7's "caller corrupts a header" class of issue); treating a poisoned lock as
		// equally unrecoverable rather than smuggling a recovery path through matches that.
		self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[cfg(feature = "std")]
impl SyncBinAlloc<SystemChunkProvider> {
	pub fn new() -> Self {
		Self::new_in(SystemChunkProvider)
	}
}

#[cfg(feature = "std")]
impl Default for SyncBinAlloc<SystemChunkProvider> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P> Debug for SyncBinAlloc<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self.lock())
	}
}

impl<P: ChunkProvider> SyncBinAlloc<P> {
	/// # Safety
	/// Same as [`crate::BinAlloc::init`]: invalidates every outstanding pointer obtained from
	/// this allocator.
	pub unsafe fn init(&self) {
		unsafe { self.lock().init() };
	}

	pub fn heap_payload_bytes(&self) -> usize {
		self.lock().heap_payload_bytes()
	}

	pub fn alloc(&self, n: usize) -> *mut u8 {
		self.lock().alloc(n)
	}

	/// # Safety
	/// Same as [`crate::BinAlloc::free`].
	pub unsafe fn free(&self, p: *mut u8) {
		unsafe { self.lock().free(p) };
	}
}

#[cfg(any(feature = "allocator-api", feature = "allocator-api2"))]
mod allocator_impl {
	use super::*;
	use crate::alloc_compat::Allocator;
	use core::ptr::NonNull;

	unsafe impl<P: ChunkProvider> Allocator for SyncBinAlloc<P> {
		fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
			self.lock().allocate(layout)
		}

		unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
			unsafe { self.lock().deallocate(ptr, layout) };
		}

		unsafe fn grow(
			&self,
			ptr: NonNull<u8>,
			old_layout: Layout,
			new_layout: Layout,
		) -> Result<NonNull<[u8]>, AllocError> {
			unsafe { self.lock().grow(ptr, old_layout, new_layout) }
		}

		unsafe fn shrink(
			&self,
			ptr: NonNull<u8>,
			old_layout: Layout,
			new_layout: Layout,
		) -> Result<NonNull<[u8]>, AllocError> {
			unsafe { self.lock().shrink(ptr, old_layout, new_layout) }
		}
	}
}

unsafe impl<P: ChunkProvider> core::alloc::GlobalAlloc for SyncBinAlloc<P> {
	unsafe fn alloc(&self, layout: core::alloc::Layout) -> *mut u8 {
		unsafe { core::alloc::GlobalAlloc::alloc(&*self.lock(), layout) }
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: core::alloc::Layout) {
		unsafe { core::alloc::GlobalAlloc::dealloc(&*self.lock(), ptr, layout) };
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: core::alloc::Layout, new_size: usize) -> *mut u8 {
		unsafe { core::alloc::GlobalAlloc::realloc(&*self.lock(), ptr, layout, new_size) }
	}
}
