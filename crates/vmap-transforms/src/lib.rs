//! # vmap-transforms
//!
//! Logical to physical dimension transforms for vectorized map (vmap)
//! batching rules.
//!
//! ## Overview
//!
//! Inside a vmapped function every tensor is a *logical* value: batch dims that
//! vmap threaded through it are hidden, and user code sees only the remaining
//! dims. An operator implemented for ordinary tensors can still serve the
//! vmapped call if its arguments are first turned into *physical* tensors with
//! every batch dim made explicit at the front. This crate owns that index algebra
//! and layout normalization; it never computes operator results itself.
//!
//! Key components include:
//!
//! - [`LevelSet`] - a fixed-capacity set of vmap levels
//! - [`PhysicalView`] - a physical tensor plus the levels of its leading batch dims
//! - [`MultiBatchVmapTransform`] and [`BroadcastingVmapTransform`] - turn logical
//!   values into physical views
//! - [`Logical`] and [`BatchedTensor`] - the batched-value capability and the
//!   wrapper that implements it
//!
//! ## Architecture
//!
//! A batching rule receives logical values, asks a transform for physical views,
//! runs the unbatched operator on [`PhysicalView::tensor`], and wraps the result
//! with [`PhysicalView::new_logical_from_physical`].
//!
//! ```ignore
//! use vmap_transforms::{BatchedTensor, BroadcastingVmapTransform, VmapTransform};
//!
//! fn add_batching_rule(
//!     lhs: &BatchedTensor<Tensor>,
//!     rhs: &BatchedTensor<Tensor>,
//! ) -> vmap_transforms::Result<BatchedTensor<Tensor>> {
//!     let views = BroadcastingVmapTransform::logical_to_physical([lhs, rhs])?;
//!     let result = views[0].tensor().broadcast_add(views[1].tensor())?;
//!     views[0].new_logical_from_physical(result)
//! }
//! ```
//!
//! ### Assumptions
//! Regardless of backend used, batch dims are always placed front to back in
//! ascending level order. Every transform and [`PhysicalView`] agrees on this.
//!
//! ### Backend Traits
//!
//! The [`Backend`](backend::Backend) trait defines the tensor primitives a
//! physical tensor must provide (shape, permute, unsqueeze). Enable the
//! `candle` or `burn` feature for a ready-made implementation.
//!
//! ## Features
//!
//! - **candle** - Enables candle backend
//! - **burn** - Enables burn backend
//!
//! ## Logging
//!
//! Transforms emit `tracing` events at `TRACE` level; rejected batch dims are
//! reported at `DEBUG`. No subscriber is installed by the library.

mod batched;
mod error;
mod level;
mod physical;
mod transform;

pub mod backend;
pub mod constant;

pub use batched::{BatchDim, BatchDims, BatchedTensor, Logical};
pub use error::{Error, Result};
pub use level::{LevelSet, Levels, VmapLevel};
pub use physical::{PhysicalView, VmapDimVector};
pub use transform::{BroadcastingVmapTransform, MultiBatchVmapTransform, VmapTransform};
