//! # Batched values
//!
//! A *logical* value is a physical tensor annotated with the batch dimensions
//! that vmap threaded through it. Code inside the vmapped function sees only the
//! logical shape; the batch dims stay embedded in the physical tensor, at
//! whatever positions they were introduced.
//!
//! Consider `vmap(vmap(f, in_dims=2), in_dims=0)` applied to a tensor of shape
//! `[2, 3, 4]`. The value `f` receives is
//!
//! ```text
//! BatchedTensor(physical [2, 3, 4], bdims = [(level 1, dim 0), (level 2, dim 2)])
//! ```
//!
//! and its logical shape is `[3]`.
//!
//! The transforms only consume the [`Logical`] capability, so any wrapper type
//! can be plugged in. [`BatchedTensor`] is the wrapper this crate ships.
use smallvec::SmallVec;
use tracing::debug;

use crate::backend::Backend;
use crate::constant::{BATCH_DIMS_STACK_SIZE, VMAP_NUM_LEVELS};
use crate::error::{Error, Result};
use crate::level::VmapLevel;

/// One batch dimension of a logical value: the vmap level it belongs to and the
/// physical dim holding its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchDim {
    level: VmapLevel,
    dim: usize,
}

impl BatchDim {
    pub fn new(level: VmapLevel, dim: usize) -> Self {
        Self { level, dim }
    }

    pub fn level(&self) -> VmapLevel {
        self.level
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// The batch dims of one value, ordered by ascending level.
pub type BatchDims = SmallVec<[BatchDim; BATCH_DIMS_STACK_SIZE]>;

/// The capability the vmap transforms need from a batched-value wrapper.
///
/// Implementors keep their own representation; transforms only read the ordered
/// batch dims and the physical tensor, and build new values through
/// [`make_batched`](Logical::make_batched).
pub trait Logical: Sized {
    /// The physical tensor type underneath the logical value
    type Physical: Backend;

    /// Batch dims ordered by strictly ascending level. Empty for plain values.
    fn batch_dims(&self) -> &[BatchDim];

    /// The physical tensor, with batch dims still at their original positions
    fn physical(&self) -> &Self::Physical;

    /// Wrap `physical` as a logical value with the given batch dims
    fn make_batched(physical: Self::Physical, bdims: BatchDims) -> Result<Self>;

    /// Whether the value carries any batch dims
    fn is_batched(&self) -> bool {
        !self.batch_dims().is_empty()
    }
}

/// A physical tensor plus the batch dims that vmap threaded through it.
#[derive(Clone, Debug)]
pub struct BatchedTensor<B> {
    value: B,
    bdims: BatchDims,
}

impl<B: Backend> BatchedTensor<B> {
    /// Wraps `value` with `bdims`.
    ///
    /// Fails if a level does not fit in a [`LevelSet`](crate::LevelSet), if the
    /// levels are not strictly increasing, if a dim is outside `value`'s rank,
    /// if two batch dims share a physical dim, or if `value` is itself batched.
    pub fn new(value: B, bdims: BatchDims) -> Result<Self> {
        check_batch_dims(&value, &bdims)?;
        Ok(Self { value, bdims })
    }

    /// A plain tensor seen as a logical value without batch dims.
    pub fn unbatched(value: B) -> Self {
        Self {
            value,
            bdims: BatchDims::new(),
        }
    }

    pub fn value(&self) -> &B {
        &self.value
    }

    pub fn into_value(self) -> B {
        self.value
    }

    pub fn bdims(&self) -> &[BatchDim] {
        &self.bdims
    }

    /// Shape as seen inside the vmapped function.
    pub fn logical_shape(&self) -> Vec<usize> {
        self.value
            .shape()
            .into_iter()
            .enumerate()
            .filter(|(dim, _)| !self.is_batch_dim(*dim))
            .map(|(_, size)| size)
            .collect()
    }

    pub fn logical_rank(&self) -> usize {
        self.value.rank() - self.bdims.len()
    }

    /// Maps a logical dim, which may be negative, to the physical dim of the
    /// underlying value that holds it.
    ///
    /// Batch dims are skipped over, so for physical shape `[2, 3, 4]` with a
    /// batch dim at `1`, logical dim `1` is physical dim `2`.
    pub fn actual_dim(&self, logical_dim: i64) -> Result<usize> {
        let wrapped = wrap_dim(logical_dim, self.logical_rank())?;
        (0..self.value.rank())
            .filter(|dim| !self.is_batch_dim(*dim))
            .nth(wrapped)
            .ok_or(Error::DimOutOfRange {
                dim: logical_dim,
                rank: self.logical_rank(),
            })
    }

    /// Enters a new vmap level: `logical_dim` of `self` becomes the batch dim
    /// for `level`.
    ///
    /// `level` must be higher than every level already present.
    pub fn add_batch_dim(self, level: VmapLevel, logical_dim: i64) -> Result<Self> {
        let actual = self.actual_dim(logical_dim)?;
        let mut bdims = self.bdims;
        bdims.push(BatchDim::new(level, actual));
        Self::new(self.value, bdims)
    }

    fn is_batch_dim(&self, dim: usize) -> bool {
        self.bdims.iter().any(|bdim| bdim.dim == dim)
    }
}

impl<B: Backend> Logical for BatchedTensor<B> {
    type Physical = B;

    fn batch_dims(&self) -> &[BatchDim] {
        &self.bdims
    }

    fn physical(&self) -> &B {
        &self.value
    }

    fn make_batched(physical: B, bdims: BatchDims) -> Result<Self> {
        Self::new(physical, bdims)
    }
}

/// Wraps a possibly negative dim into `[0, rank)`.
pub(crate) fn wrap_dim(dim: i64, rank: usize) -> Result<usize> {
    let signed_rank = rank as i64;
    let wrapped = if dim < 0 { dim + signed_rank } else { dim };
    if (0..signed_rank).contains(&wrapped) {
        Ok(wrapped as usize)
    } else {
        Err(Error::DimOutOfRange { dim, rank })
    }
}

fn check_batch_dims<B: Backend>(value: &B, bdims: &[BatchDim]) -> Result<()> {
    if value.is_batched() {
        debug!("refusing to wrap an already batched value");
        return Err(Error::NestedBatchedValue);
    }
    let rank = value.rank();
    let mut previous: Option<VmapLevel> = None;
    let mut claimed = vec![false; rank];
    for bdim in bdims {
        if bdim.level >= VMAP_NUM_LEVELS {
            debug!(level = bdim.level, "batch dim level out of range");
            return Err(Error::LevelOutOfRange(bdim.level));
        }
        if let Some(previous) = previous.filter(|previous| *previous >= bdim.level) {
            debug!(previous, level = bdim.level, "batch dim levels out of order");
            return Err(Error::UnorderedLevels {
                previous,
                level: bdim.level,
            });
        }
        if bdim.dim >= rank {
            debug!(dim = bdim.dim, rank, "batch dim out of range");
            return Err(Error::BatchDimOutOfRange {
                dim: bdim.dim,
                rank,
            });
        }
        if std::mem::replace(&mut claimed[bdim.dim], true) {
            debug!(dim = bdim.dim, "physical dim claimed twice");
            return Err(Error::DuplicateBatchDim(bdim.dim));
        }
        previous = Some(bdim.level);
    }
    Ok(())
}
