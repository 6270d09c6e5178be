use tracing::trace;

use super::{VmapTransform, permute_batch_dims_to_front};
use crate::backend::Backend;
use crate::batched::Logical;
use crate::error::Result;
use crate::level::LevelSet;
use crate::physical::PhysicalView;

/// Vmap transform for operators that take tensors with multiple batch dims.
///
/// Every batch dim of a value is moved to the front of its physical tensor in
/// ascending level order. Values are handled independently: each view carries
/// only the levels of its own input, and a value without batch dims comes back
/// unchanged with an empty level set. Use [`BroadcastingVmapTransform`] when
/// several operands need a common batch layout.
///
/// [`BroadcastingVmapTransform`]: super::BroadcastingVmapTransform
#[derive(Clone, Copy, Debug, Default)]
pub struct MultiBatchVmapTransform;

impl MultiBatchVmapTransform {
    /// Physical view of a single logical value.
    pub fn logical_to_physical_single<L: Logical>(logical: &L) -> Result<PhysicalView<L::Physical>> {
        let levels = LevelSet::from_batch_dims(logical.batch_dims());
        let tensor = permute_batch_dims_to_front(logical)?;
        trace!(?levels, shape = ?tensor.shape(), "multi-batch logical to physical");
        Ok(PhysicalView::new(tensor, levels))
    }
}

impl VmapTransform for MultiBatchVmapTransform {
    fn logical_to_physical<'a, L, I>(logical: I) -> Result<Vec<PhysicalView<L::Physical>>>
    where
        L: Logical + 'a,
        I: IntoIterator<Item = &'a L>,
    {
        logical
            .into_iter()
            .map(Self::logical_to_physical_single)
            .collect()
    }
}
