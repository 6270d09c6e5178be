use std::fmt::Debug;

#[cfg(any(test, feature = "burn"))]
use crate::error::Error;
use crate::error::Result;

/// The backend trait that must be fulfilled by any physical tensor type to support vmap transforms.
///
/// Transforms only rearrange axes, so a backend never needs to expose its data,
/// dtype, or device. Implementations should return views rather than copies
/// from [`permute`](Backend::permute) and [`unsqueeze`](Backend::unsqueeze)
/// whenever the underlying library allows it; in-place batching rules rely on
/// the view sharing storage with the tensor it was built from.
pub trait Backend: Debug + Clone + Send + Sync + 'static {
    /// Return the shape of this tensor
    fn shape(&self) -> Vec<usize>;

    /// Number of dimensions
    fn rank(&self) -> usize {
        self.shape().len()
    }

    /// Size of dimension `dim`
    ///
    /// # Panics
    ///
    /// Panics if `dim >= self.rank()`.
    fn size(&self, dim: usize) -> usize {
        self.shape()[dim]
    }

    /// Reorder the dimensions so that output dim `i` is input dim `dims[i]`
    fn permute(&self, dims: &[usize]) -> Result<Self>;

    /// Insert a dimension of size `1` at position `dim`
    fn unsqueeze(&self, dim: usize) -> Result<Self>;

    /// Whether this tensor still carries logical batch metadata of its own.
    ///
    /// Plain tensors never do. Backends that can wrap a batched value inside
    /// their own tensor type override this so a physical view can refuse it.
    fn is_batched(&self) -> bool {
        false
    }
}

/// Checks that `dims` is a permutation of `0..rank`.
#[cfg(any(test, feature = "burn"))]
pub(crate) fn check_permutation(dims: &[usize], rank: usize) -> Result<()> {
    let mut seen = vec![false; rank];
    let valid = dims.len() == rank
        && dims
            .iter()
            .all(|&d| d < rank && !std::mem::replace(&mut seen[d], true));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidPermutation {
            perm: dims.to_vec(),
            rank,
        })
    }
}
