//! # Constants with reserved meanings in vmap-transforms

/// The maximum vmap nesting depth a [`LevelSet`](crate::LevelSet) can describe.
///
/// Levels are valid in `0..VMAP_NUM_LEVELS`. Entering a vmap level at or above
/// this value is rejected by [`BatchedTensor::new`](crate::BatchedTensor::new).
pub const VMAP_NUM_LEVELS: usize = 64;

/// Inline capacity of [`BatchDims`](crate::BatchDims) before it spills to the heap.
pub const BATCH_DIMS_STACK_SIZE: usize = 5;
