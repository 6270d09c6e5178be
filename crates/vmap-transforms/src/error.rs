//! Provides error definitions.
use thiserror::Error;

use crate::constant::VMAP_NUM_LEVELS;
use crate::level::VmapLevel;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Enumerates the recoverable errors raised while moving between logical and physical views.
///
/// Internal invariant violations (for example, building a
/// [`PhysicalView`](crate::PhysicalView) from a tensor that is still batched)
/// are not represented here: they panic.
#[derive(Error, Debug)]
pub enum Error {
    /// A logical dimension index is still outside `[0, rank)` after negative wrapping.
    #[error("dimension out of range (expected to be in range of [-{rank}, {rank}), but got {dim})")]
    DimOutOfRange { dim: i64, rank: usize },

    /// A batch dim names a vmap level the level set cannot hold.
    #[error("vmap level {0} exceeds the maximum supported nesting depth of {max}", max = VMAP_NUM_LEVELS)]
    LevelOutOfRange(VmapLevel),

    /// Batch dims must be ordered by strictly increasing level.
    #[error("batch dims must have strictly increasing levels, got level {level} after level {previous}")]
    UnorderedLevels { previous: VmapLevel, level: VmapLevel },

    /// A batch dim points past the end of the physical tensor.
    #[error("batch dim {dim} is out of range for a physical tensor of rank {rank}")]
    BatchDimOutOfRange { dim: usize, rank: usize },

    /// Two batch dims claim the same physical dimension.
    #[error("physical dim {0} is claimed by more than one batch dim")]
    DuplicateBatchDim(usize),

    /// The value handed to a batched wrapper already carries batch dims of its own.
    #[error("cannot wrap a value that is already batched; add a batch dim to it instead")]
    NestedBatchedValue,

    /// The backend cannot represent a tensor of this rank.
    #[error("rank {rank} exceeds the backend maximum of {max}")]
    RankLimit { rank: usize, max: usize },

    /// The backend rejected a permutation.
    #[error("invalid permutation {perm:?} for a tensor of rank {rank}")]
    InvalidPermutation { perm: Vec<usize>, rank: usize },

    /// Error propagated from the candle backend.
    #[cfg(feature = "candle")]
    #[error("candle error {0}")]
    Candle(#[from] candle_core::Error),
}
