//! Selects which `Allocator`/`AllocError`/`Layout` types the `core::alloc` integration (§4.11)
//! builds against, mirroring the teacher crate's `allocator-api`/`allocator-api2`/bare-`std`
//! three-way feature split.
//!
//! - `allocator-api`: use nightly's `core::alloc::Allocator` directly.
//! - `allocator-api2`: use the `allocator-api2` polyfill, which mirrors the nightly trait on
//!   stable Rust.
//! - neither: no `Allocator` impl is compiled, only `GlobalAlloc` (which is stable on its own).
//!   A local `AllocError` polyfill is still provided so the crate's public error type doesn't
//!   disappear depending on feature selection.

#[cfg(feature = "allocator-api")]
pub use core::alloc::{AllocError, Allocator, Layout};

#[cfg(feature = "allocator-api2")]
pub use allocator_api2::alloc::{AllocError, Allocator, Layout};

#[cfg(not(any(feature = "allocator-api", feature = "allocator-api2")))]
pub use core::alloc::Layout;

/// A polyfill for `core::alloc::AllocError`, used when neither allocator-API feature is enabled.
#[cfg(not(any(feature = "allocator-api", feature = "allocator-api2")))]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct AllocError;

#[cfg(not(any(feature = "allocator-api", feature = "allocator-api2")))]
impl core::fmt::Display for AllocError {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
		f.write_str("memory allocation failed")
	}
}

#[cfg(all(feature = "std", not(any(feature = "allocator-api", feature = "allocator-api2"))))]
impl std::error::Error for AllocError {}
