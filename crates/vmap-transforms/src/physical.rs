//! # Physical views
//!
//! A [`PhysicalView`] holds a physical tensor whose batch dims have all been
//! moved to the front, together with the [`LevelSet`] naming them. Batching
//! rules use it to translate logical arguments (dims, shapes) into physical ones,
//! call the unbatched operator on [`tensor`](PhysicalView::tensor), and wrap the
//! result back up with [`new_logical_from_physical`](PhysicalView::new_logical_from_physical).
//!
//! Given `PhysicalView(tensor = ones(2, 3, 4, 5), levels = {1, 3})`, the first two
//! dims of the tensor are batch dims, so logical dim `n` is physical dim `n + 2`
//! and `physical_dims(&[0, 1])` returns `[2, 3]`.
use smallvec::SmallVec;

use crate::backend::Backend;
use crate::batched::{BatchDim, BatchDims, Logical, wrap_dim};
use crate::error::Result;
use crate::level::LevelSet;

/// Physical dims produced from a list of logical dims.
pub type VmapDimVector = SmallVec<[usize; 8]>;

/// A physical tensor with every batch dim at the front, in ascending level order.
#[derive(Clone, Debug)]
pub struct PhysicalView<B> {
    tensor: B,
    levels: LevelSet,
}

impl<B: Backend> PhysicalView<B> {
    /// Takes ownership of `tensor`, whose leading `levels.len()` dims are the
    /// batch dims for `levels` in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `tensor` is still a batched value, or if it has fewer dims than
    /// `levels`. Physical views must only be built from tensors that have
    /// already been unwrapped.
    pub fn new(tensor: B, levels: LevelSet) -> Self {
        assert!(
            !tensor.is_batched(),
            "a physical view cannot be built from a batched tensor"
        );
        assert!(
            levels.len() <= tensor.rank(),
            "{} batch levels on a tensor of rank {}",
            levels.len(),
            tensor.rank()
        );
        Self { tensor, levels }
    }

    pub fn tensor(&self) -> &B {
        &self.tensor
    }

    /// Mutable access for operators that write into the physical tensor in place.
    pub fn tensor_mut(&mut self) -> &mut B {
        &mut self.tensor
    }

    pub fn into_tensor(self) -> B {
        self.tensor
    }

    pub fn levels(&self) -> LevelSet {
        self.levels
    }

    pub fn num_batch_dims(&self) -> usize {
        self.levels.len()
    }

    pub fn num_logical_dims(&self) -> usize {
        self.tensor.rank() - self.num_batch_dims()
    }

    /// Maps a logical dim to its physical dim, wrapping negative dims.
    ///
    /// Fails with [`Error::DimOutOfRange`](crate::Error::DimOutOfRange) if the
    /// wrapped dim is not in `[0, num_logical_dims)`.
    pub fn physical_dim(&self, logical_dim: i64) -> Result<usize> {
        Ok(wrap_dim(logical_dim, self.num_logical_dims())? + self.num_batch_dims())
    }

    /// [`physical_dim`](Self::physical_dim) applied to each dim, in order.
    pub fn physical_dims(&self, logical_dims: &[i64]) -> Result<VmapDimVector> {
        logical_dims
            .iter()
            .map(|&dim| self.physical_dim(dim))
            .collect()
    }

    /// The physical shape for a logical shape: the batch sizes of this view's
    /// tensor followed by `logical_shape`.
    pub fn physical_shape(&self, logical_shape: &[usize]) -> Vec<usize> {
        let mut shape = self.tensor.shape();
        shape.truncate(self.num_batch_dims());
        shape.extend_from_slice(logical_shape);
        shape
    }

    /// Wraps a physical result as a logical value.
    ///
    /// The leading dims of `physical` must line up with this view's levels:
    /// dim `0` for the lowest level, dim `1` for the next, and so on. Can be
    /// called once per output of a multi-output operator.
    pub fn new_logical_from_physical<L>(&self, physical: B) -> Result<L>
    where
        L: Logical<Physical = B>,
    {
        let bdims: BatchDims = self
            .levels
            .iter()
            .enumerate()
            .map(|(dim, level)| BatchDim::new(level, dim))
            .collect();
        L::make_batched(physical, bdims)
    }
}
