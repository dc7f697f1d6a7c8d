//! A segregated-free-list, first-fit dynamic memory allocator.
//!
//! The allocator manages one or more large contiguous regions obtained from a pluggable
//! [`ChunkProvider`] and subdivides them into variable-sized blocks tracked in six
//! address-ordered free lists, one per size class. See [`BinAlloc`] for the raw, non-`Sync`
//! core, and [`UnsafeBinAlloc`]/[`SyncBinAlloc`] for the two `Sync` wrappers that let it back a
//! `Vec`, a `Box`, or a `#[global_allocator]`.
//!
//! ```
//! use binalloc::BinAlloc;
//!
//! let alloc = BinAlloc::new();
//! let p = alloc.alloc(64);
//! assert!(!p.is_null());
//! unsafe {
//!     p.write_bytes(0, 64);
//!     alloc.free(p);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(feature = "allocator-api", feature(allocator_api))]

#[cfg(all(feature = "allocator-api", feature = "allocator-api2"))]
compile_error!("The `allocator-api` and `allocator-api2` features are mutually exclusive.");

mod alloc_compat;
pub use alloc_compat::{AllocError, Layout};
#[cfg(any(feature = "allocator-api", feature = "allocator-api2"))]
pub use alloc_compat::Allocator;

pub mod coalescer;
pub mod finder;
pub mod freelist;
pub mod grower;
pub mod header;
pub mod provider;
pub mod sizeclass;
pub mod splitter;

mod block_alloc;
pub use block_alloc::BinAlloc;

mod unsafe_alloc;
pub use unsafe_alloc::UnsafeBinAlloc;

#[cfg(feature = "std")]
mod sync_alloc;
#[cfg(feature = "std")]
pub use sync_alloc::SyncBinAlloc;

pub use header::ALIGNMENT;
pub use provider::ChunkProvider;
#[cfg(feature = "std")]
pub use provider::SystemChunkProvider;
