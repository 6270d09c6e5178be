//! Two batching rules written against vmap-transforms with the candle backend.
//!
//! `add` broadcasts its operands, so it goes through the broadcasting transform.
//! `sum` reduces over a single logical dim and accepts any number of leading
//! dims, so it goes through the multi-batch transform.
use candle_core::{Device, Tensor};
use smallvec::smallvec;
use tracing::info;
use vmap_transforms::{
    BatchDim, BatchedTensor, BroadcastingVmapTransform, MultiBatchVmapTransform, Result,
    VmapTransform,
};

fn add_batching_rule(
    lhs: &BatchedTensor<Tensor>,
    rhs: &BatchedTensor<Tensor>,
) -> Result<BatchedTensor<Tensor>> {
    let views = BroadcastingVmapTransform::logical_to_physical([lhs, rhs])?;
    let result = views[0].tensor().broadcast_add(views[1].tensor())?;
    views[0].new_logical_from_physical(result)
}

fn sum_batching_rule(input: &BatchedTensor<Tensor>, dim: i64) -> Result<BatchedTensor<Tensor>> {
    let view = MultiBatchVmapTransform::logical_to_physical_single(input)?;
    let physical_dim = view.physical_dim(dim)?;
    let result = view.tensor().sum(physical_dim)?;
    view.new_logical_from_physical(result)
}

fn main() -> Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let device = Device::Cpu;

    // vmap(f, in_dims=1) over a [3, 4] tensor: f sees rows of length 3
    let x = BatchedTensor::new(
        Tensor::arange(0f32, 12., &device)?.reshape((3, 4))?,
        smallvec![BatchDim::new(1, 1)],
    )?;
    // captured from outside the vmap, so unbatched
    let bias = BatchedTensor::unbatched(Tensor::new(&[100f32, 200., 300.], &device)?);

    let shifted = add_batching_rule(&x, &bias)?;
    info!(
        logical_shape = ?shifted.logical_shape(),
        bdims = ?shifted.bdims(),
        "add"
    );
    info!("physical result:\n{}", shifted.value());

    let total = sum_batching_rule(&shifted, -1)?;
    info!(
        logical_shape = ?total.logical_shape(),
        bdims = ?total.bdims(),
        "sum"
    );
    info!("physical result:\n{}", total.value());

    Ok(())
}
