use crate::backend::Backend;
use crate::backend::core_trait::check_permutation;
use crate::error::{Error, Result};

/// Where an axis of a [`MockTensor`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Axis `n` of the tensor as it was constructed
    Source(usize),
    /// A size `1` axis added by `unsqueeze`
    Inserted,
}

// A shape-only tensor implementation for testing
#[derive(Clone, Debug)]
pub struct MockTensor {
    pub(crate) shape: Vec<usize>,
    pub(crate) axes: Vec<Axis>,
    pub(crate) batched: bool,
}

impl MockTensor {
    pub fn new(shape: Vec<usize>) -> Self {
        let axes = (0..shape.len()).map(Axis::Source).collect();
        Self {
            shape,
            axes,
            batched: false,
        }
    }

    /// A tensor that claims to still carry batch metadata
    pub fn batched(shape: Vec<usize>) -> Self {
        Self {
            batched: true,
            ..Self::new(shape)
        }
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }
}

impl Backend for MockTensor {
    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn permute(&self, dims: &[usize]) -> Result<Self> {
        check_permutation(dims, self.shape.len())?;
        Ok(Self {
            shape: dims.iter().map(|&d| self.shape[d]).collect(),
            axes: dims.iter().map(|&d| self.axes[d]).collect(),
            batched: self.batched,
        })
    }

    fn unsqueeze(&self, dim: usize) -> Result<Self> {
        let rank = self.shape.len();
        if dim > rank {
            return Err(Error::DimOutOfRange {
                dim: dim as i64,
                rank: rank + 1,
            });
        }
        let mut new = self.clone();
        new.shape.insert(dim, 1);
        new.axes.insert(dim, Axis::Inserted);
        Ok(new)
    }

    fn is_batched(&self) -> bool {
        self.batched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permute_tracks_axes() {
        let t = MockTensor::new(vec![2, 3, 4]);
        let p = t.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), vec![4, 2, 3]);
        assert_eq!(p.axes(), &[Axis::Source(2), Axis::Source(0), Axis::Source(1)]);
    }

    #[test]
    fn test_permute_rejects_duplicates() {
        let t = MockTensor::new(vec![2, 3]);
        assert!(matches!(
            t.permute(&[0, 0]),
            Err(Error::InvalidPermutation { rank: 2, .. })
        ));
        assert!(t.permute(&[0]).is_err());
    }

    #[test]
    fn test_unsqueeze_inserts_size_one() {
        let t = MockTensor::new(vec![2, 3]);
        let u = t.unsqueeze(1).unwrap();
        assert_eq!(u.shape(), vec![2, 1, 3]);
        assert_eq!(u.axes(), &[Axis::Source(0), Axis::Inserted, Axis::Source(1)]);
        assert_eq!(u.rank(), 3);
        assert_eq!(u.size(2), 3);
        assert!(t.unsqueeze(3).is_err());
    }
}
