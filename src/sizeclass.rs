//! The fixed size-class table. Six classes, thresholds fixed and independent of runtime state.

pub const CLASS_COUNT: usize = 6;

const CLASS_BOUNDS: [usize; CLASS_COUNT] = [512, 2048, 8192, 16384, 32768, usize::MAX];

/// The smallest class whose upper bound is `>= payload_size`.
pub fn class_of(payload_size: usize) -> usize {
	CLASS_BOUNDS
		.iter()
		.position(|&bound| payload_size <= bound)
		.unwrap_or(CLASS_COUNT - 1)
}
