//! Installs the allocator as the process's `#[global_allocator]` via the lock-free `Sync`
//! wrapper. Safe here because the whole demo is single-threaded; use `SyncBinAlloc` instead if
//! that isn't true of your program.

use binalloc::UnsafeBinAlloc;

// SAFETY: this binary never spawns a thread, so nothing can call into `GLOBAL` concurrently.
#[global_allocator]
static GLOBAL: UnsafeBinAlloc<binalloc::SystemChunkProvider> = unsafe { UnsafeBinAlloc::new() };

fn main() {
	let mut v = Vec::new();
	for i in 0..10_000u32 {
		v.push(i);
	}
	println!("sum = {}", v.iter().sum::<u32>());
	println!("heap_payload_bytes = {}", GLOBAL.heap_payload_bytes());
}
