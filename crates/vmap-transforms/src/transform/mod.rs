//! # Vmap transforms
//!
//! A vmap transform converts logical views of tensors into physical views.
//!
//! Batching rules use a transform to turn their logical arguments into
//! [`PhysicalView`]s, call one or more ordinary operators on the physical
//! tensors, and convert the physical result back with
//! [`PhysicalView::new_logical_from_physical`].
//!
//! * [`MultiBatchVmapTransform`] - for operators that accept any number of
//!   leading dims. Each value's batch dims are moved to the front on their own.
//! * [`BroadcastingVmapTransform`] - for operators that broadcast their inputs
//!   against each other. All values are aligned to the union of their levels and
//!   to the same logical rank.
//!
//! Both place batch dims front to back in ascending level order, the same order
//! [`PhysicalView::new_logical_from_physical`] assumes when it rebuilds the batch dims.
use tracing::trace;

use crate::backend::Backend;
use crate::batched::{BatchDim, BatchDims, Logical};
use crate::error::Result;
use crate::physical::PhysicalView;

mod broadcasting;
mod multi_batch;

pub use broadcasting::BroadcastingVmapTransform;
pub use multi_batch::MultiBatchVmapTransform;

/// Converts a list of logical values into physical views for one operator call.
pub trait VmapTransform {
    /// Returns one view per input, in input order. Either every view is produced
    /// or an error is returned before any physical tensor is handed out.
    fn logical_to_physical<'a, L, I>(logical: I) -> Result<Vec<PhysicalView<L::Physical>>>
    where
        L: Logical + 'a,
        I: IntoIterator<Item = &'a L>;
}

/// Permutes the physical tensor of `logical` so that its batch dims come first,
/// in ascending level order, followed by the remaining dims in their original order.
///
/// Returns the tensor unchanged when the batch dims are already in place.
///
/// # Panics
///
/// Panics if a batch dim points outside the physical tensor.
pub(crate) fn permute_batch_dims_to_front<L: Logical>(logical: &L) -> Result<L::Physical> {
    let physical = logical.physical();
    let rank = physical.rank();
    let mut bdims: BatchDims = logical.batch_dims().iter().copied().collect();
    bdims.sort_by_key(BatchDim::level);

    for bdim in &bdims {
        assert!(
            bdim.dim() < rank,
            "batch dim {} at level {} is out of range for a physical tensor of rank {}",
            bdim.dim(),
            bdim.level(),
            rank
        );
    }

    if bdims.iter().enumerate().all(|(idx, bdim)| bdim.dim() == idx) {
        return Ok(physical.clone());
    }

    let mut is_bdim = vec![false; rank];
    let mut perm = Vec::with_capacity(rank);
    for bdim in &bdims {
        is_bdim[bdim.dim()] = true;
        perm.push(bdim.dim());
    }
    perm.extend((0..rank).filter(|dim| !is_bdim[*dim]));

    trace!(?perm, "moving batch dims to front");
    physical.permute(&perm)
}
