//! Uses `BinAlloc` directly as a `Vec`'s backing allocator via the `Allocator` trait.
//!
//! Requires one of the `allocator-api`/`allocator-api2` features. `std::vec::Vec::new_in` is
//! itself nightly-unstable regardless of which `Allocator` impl backs it, so the stable path uses
//! `allocator_api2`'s own `Vec` instead.
#![cfg_attr(feature = "allocator-api", feature(allocator_api))]

#[cfg(feature = "allocator-api")]
fn main() {
	use binalloc::BinAlloc;

	let alloc = BinAlloc::new();

	let mut a = Vec::new_in(&alloc);
	let mut b = Vec::new_in(&alloc);
	for i in 0..10 {
		a.push(i);
		b.push(i * i);
	}

	println!("a = {a:?}");
	println!("b = {b:?}");
	println!("heap_payload_bytes = {}", alloc.heap_payload_bytes());
}

#[cfg(all(feature = "allocator-api2", not(feature = "allocator-api")))]
fn main() {
	use allocator_api2::vec::Vec;
	use binalloc::BinAlloc;

	let alloc = BinAlloc::new();

	let mut a: Vec<i32, _> = Vec::new_in(&alloc);
	let mut b: Vec<i32, _> = Vec::new_in(&alloc);
	for i in 0..10 {
		a.push(i);
		b.push(i * i);
	}

	println!("a = {a:?}");
	println!("b = {b:?}");
	println!("heap_payload_bytes = {}", alloc.heap_payload_bytes());
}

#[cfg(not(any(feature = "allocator-api", feature = "allocator-api2")))]
fn main() {
	eprintln!("run with --features allocator-api2 to see this demo");
}
