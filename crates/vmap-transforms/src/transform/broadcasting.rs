use tracing::trace;

use super::{VmapTransform, permute_batch_dims_to_front};
use crate::backend::Backend;
use crate::batched::Logical;
use crate::error::Result;
use crate::level::LevelSet;
use crate::physical::PhysicalView;

/// Vmap transform for operators that broadcast all inputs.
///
/// Given some logical values, `logical_to_physical`:
/// - permutes the batch dims of each value to the front of its tensor;
/// - aligns the batch dims to the union of all levels. A value without a batch
///   dim for some level gets a size-one dim in that slot;
/// - aligns the non-batch dims to the same rank, inserting size-one dims between
///   the batch dims and the non-batch dims so logical shapes line up from the right.
///
/// Given physical inputs `(B, 2)` and `(B, 3, 2)` batched at the same level, the
/// views wrap tensors of shape `(B, 1, 2)` and `(B, 3, 2)`. Given `(B, 2)` and a
/// plain `(2,)`, they wrap `(B, 2)` and `(1, 2)`; the size-one batch slot is left
/// for the operator's own broadcasting to expand.
///
/// Logical shapes that cannot broadcast against each other are not detected
/// here; the physical operator reports them.
#[derive(Clone, Copy, Debug, Default)]
pub struct BroadcastingVmapTransform;

impl BroadcastingVmapTransform {
    fn align<B: Backend>(
        mut tensor: B,
        own_levels: LevelSet,
        levels: LevelSet,
        max_logical_rank: usize,
    ) -> Result<PhysicalView<B>> {
        // own batch dims are already in ascending order at the front, so each
        // missing level can be slotted in where it belongs
        for (slot, level) in levels.iter().enumerate() {
            if !own_levels.contains(level) {
                tensor = tensor.unsqueeze(slot)?;
            }
        }

        let num_batch_dims = levels.len();
        let logical_rank = tensor.rank() - num_batch_dims;
        for _ in logical_rank..max_logical_rank {
            tensor = tensor.unsqueeze(num_batch_dims)?;
        }

        trace!(?levels, shape = ?tensor.shape(), "broadcasting logical to physical");
        Ok(PhysicalView::new(tensor, levels))
    }
}

impl VmapTransform for BroadcastingVmapTransform {
    fn logical_to_physical<'a, L, I>(logical: I) -> Result<Vec<PhysicalView<L::Physical>>>
    where
        L: Logical + 'a,
        I: IntoIterator<Item = &'a L>,
    {
        let fronted = logical
            .into_iter()
            .map(|value| {
                let own_levels = LevelSet::from_batch_dims(value.batch_dims());
                Ok((permute_batch_dims_to_front(value)?, own_levels))
            })
            .collect::<Result<Vec<_>>>()?;

        let levels = fronted
            .iter()
            .fold(LevelSet::empty(), |acc, (_, own_levels)| acc | *own_levels);
        let max_logical_rank = fronted
            .iter()
            .map(|(tensor, own_levels)| tensor.rank() - own_levels.len())
            .max()
            .unwrap_or(0);

        trace!(
            ?levels,
            max_logical_rank,
            inputs = fronted.len(),
            "aligning values for broadcasting"
        );

        fronted
            .into_iter()
            .map(|(tensor, own_levels)| Self::align(tensor, own_levels, levels, max_logical_rank))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock_tensor::{Axis, MockTensor};
    use crate::batched::{BatchDim, BatchedTensor};
    use crate::transform::tests::Unchecked;
    use proptest::prelude::*;
    use smallvec::smallvec;

    const B: usize = 5;

    fn batched(shape: Vec<usize>, bdims: &[(usize, usize)]) -> BatchedTensor<MockTensor> {
        let bdims = bdims
            .iter()
            .map(|&(level, dim)| BatchDim::new(level, dim))
            .collect();
        BatchedTensor::new(MockTensor::new(shape), bdims).unwrap()
    }

    fn levels(levels: &[usize]) -> LevelSet {
        levels.iter().copied().collect()
    }

    #[test]
    fn test_pads_smaller_logical_rank() {
        let a = batched(vec![B, 2], &[(1, 0)]);
        let b = batched(vec![B, 3, 2], &[(1, 0)]);
        let views = BroadcastingVmapTransform::logical_to_physical([&a, &b]).unwrap();
        assert_eq!(views[0].tensor().shape(), vec![B, 1, 2]);
        assert_eq!(
            views[0].tensor().axes(),
            &[Axis::Source(0), Axis::Inserted, Axis::Source(1)]
        );
        assert_eq!(views[1].tensor().shape(), vec![B, 3, 2]);
    }

    #[test]
    fn test_unbatched_gets_size_one_batch_slot() {
        let a = batched(vec![B, 2], &[(1, 0)]);
        let b = BatchedTensor::unbatched(MockTensor::new(vec![2]));
        let views = BroadcastingVmapTransform::logical_to_physical([&a, &b]).unwrap();
        assert_eq!(views[0].tensor().shape(), vec![B, 2]);
        assert_eq!(views[1].tensor().shape(), vec![1, 2]);
        assert_eq!(views[1].levels(), levels(&[1]));
    }

    #[test]
    fn test_disjoint_levels_interleave() {
        // a is batched at levels 1 and 3, b at level 2, with batch dims embedded
        // away from the front
        let a = batched(vec![4, 7, 6], &[(1, 1), (3, 2)]);
        let b = batched(vec![3, 8], &[(2, 1)]);
        let views = BroadcastingVmapTransform::logical_to_physical([&a, &b]).unwrap();

        assert_eq!(views[0].levels(), levels(&[1, 2, 3]));
        assert_eq!(views[0].tensor().shape(), vec![7, 1, 6, 4]);
        assert_eq!(
            views[0].tensor().axes(),
            &[Axis::Source(1), Axis::Inserted, Axis::Source(2), Axis::Source(0)]
        );

        assert_eq!(views[1].levels(), levels(&[1, 2, 3]));
        assert_eq!(views[1].tensor().shape(), vec![1, 8, 1, 3]);
        assert_eq!(
            views[1].tensor().axes(),
            &[Axis::Inserted, Axis::Source(1), Axis::Inserted, Axis::Source(0)]
        );
    }

    #[test]
    fn test_all_unbatched() {
        let a = BatchedTensor::unbatched(MockTensor::new(vec![3, 2]));
        let b = BatchedTensor::unbatched(MockTensor::new(vec![2]));
        let views = BroadcastingVmapTransform::logical_to_physical([&a, &b]).unwrap();
        assert!(views[0].levels().is_empty());
        assert_eq!(views[0].tensor().shape(), vec![3, 2]);
        assert_eq!(views[1].tensor().shape(), vec![1, 2]);
    }

    #[test]
    fn test_unbroadcastable_shapes_are_not_checked() {
        let a = batched(vec![B, 2], &[(1, 0)]);
        let b = batched(vec![B, 3], &[(1, 0)]);
        let views = BroadcastingVmapTransform::logical_to_physical([&a, &b]).unwrap();
        assert_eq!(views[0].tensor().shape(), vec![B, 2]);
        assert_eq!(views[1].tensor().shape(), vec![B, 3]);
    }

    #[test]
    fn test_result_rewraps_with_union_levels() {
        let a = batched(vec![B, 2], &[(1, 0)]);
        let b = batched(vec![4, 2], &[(2, 0)]);
        let views = BroadcastingVmapTransform::logical_to_physical([&a, &b]).unwrap();
        assert_eq!(views[0].tensor().shape(), vec![B, 1, 2]);
        assert_eq!(views[1].tensor().shape(), vec![1, 4, 2]);

        // the shape a broadcasting add of the two views would produce
        let result = MockTensor::new(vec![B, 4, 2]);
        let out: BatchedTensor<MockTensor> = views[0].new_logical_from_physical(result).unwrap();
        assert_eq!(out.bdims(), &[BatchDim::new(1, 0), BatchDim::new(2, 1)]);
        assert_eq!(out.logical_shape(), vec![2]);
    }

    #[test]
    fn test_single_value_reuses_tensor_layout() {
        let a = BatchedTensor::new(
            MockTensor::new(vec![2, B]),
            smallvec![BatchDim::new(0, 1)],
        )
        .unwrap();
        let views = BroadcastingVmapTransform::logical_to_physical([&a]).unwrap();
        assert_eq!(views[0].tensor().shape(), vec![B, 2]);
    }

    fn arb_value() -> impl Strategy<Value = BatchedTensor<MockTensor>> {
        (
            proptest::collection::vec(1usize..4, 0..4),
            proptest::collection::btree_set(0usize..6, 0..3),
        )
            .prop_flat_map(|(logical_shape, level_set)| {
                let num_levels = level_set.len();
                let rank = logical_shape.len() + num_levels;
                (
                    Just(logical_shape),
                    Just(level_set),
                    Just(rank),
                    proptest::sample::subsequence((0..rank).collect::<Vec<_>>(), num_levels)
                        .prop_shuffle(),
                )
            })
            .prop_map(|(logical_shape, level_set, rank, dims)| {
                let mut sizes = logical_shape.into_iter();
                let shape = (0..rank)
                    .map(|d| if dims.contains(&d) { 2 } else { sizes.next().unwrap_or(1) })
                    .collect();
                let bdims = level_set
                    .into_iter()
                    .zip(dims)
                    .map(|(level, dim)| BatchDim::new(level, dim))
                    .collect();
                BatchedTensor::new(MockTensor::new(shape), bdims).unwrap()
            })
    }

    proptest! {
        #[test]
        fn test_union_and_broadcast_rank_laws(values in proptest::collection::vec(arb_value(), 1..4)) {
            let union = values
                .iter()
                .fold(LevelSet::empty(), |acc, v| acc | LevelSet::from_batch_dims(v.bdims()));
            let max_rank = values.iter().map(|v| v.logical_rank()).max().unwrap_or(0);

            let views = BroadcastingVmapTransform::logical_to_physical(&values).unwrap();
            prop_assert_eq!(views.len(), values.len());
            for (view, value) in views.iter().zip(&values) {
                prop_assert_eq!(view.levels(), union);
                prop_assert_eq!(view.tensor().rank(), union.len() + max_rank);

                // real batch sizes where present, size one where absent
                let shape = view.tensor().shape();
                let own = LevelSet::from_batch_dims(value.bdims());
                for (slot, level) in union.iter().enumerate() {
                    let expected = if own.contains(level) { 2 } else { 1 };
                    prop_assert_eq!(shape[slot], expected);
                }

                // logical shape right aligned behind size one padding
                let logical = value.logical_shape();
                let tail = &shape[shape.len() - logical.len()..];
                prop_assert_eq!(tail, logical.as_slice());
                let padding = &shape[union.len()..shape.len() - logical.len()];
                prop_assert!(padding.iter().all(|&size| size == 1));
            }
        }
    }

    #[test]
    #[should_panic(expected = "out of range for a physical tensor of rank 1")]
    fn test_batch_dims_beyond_rank_are_fatal() {
        let b = Unchecked::new(vec![4], &[(1, 0), (2, 1)]);
        let _ = BroadcastingVmapTransform::logical_to_physical([&b]);
    }
}
