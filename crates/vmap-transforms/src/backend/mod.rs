//! # Tensor Backend
//!
//! This module provides a unified interface for different tensor backends,
//! allowing the vmap transforms to rearrange dimensions in a backend-agnostic manner

//! ## Feature Flags
//!
//! The module uses feature flags to conditionally compile support for different backends:
//!
//! - `candle`: Enables support for the Candle tensor library
//! - `burn`: Enables support for the Burn tensor library
//!
//! ## Usage
//!
//! Batching rules work with tensors in a backend-agnostic way by:
//!
//! 1. Importing the [`Backend`] trait
//! 2. Writing the rule against [`PhysicalView`](crate::PhysicalView)s of that backend
//! 3. Enabling the appropriate feature flag for their desired backend

mod core_trait;

#[cfg_attr(docsrs, doc(cfg(feature = "candle")))]
#[cfg(feature = "candle")]
/// Candle tensor backend implementation.
///
/// This module is only available when the `candle` feature flag is enabled.
/// It provides an implementation of the [`Backend`] trait for Candle's `Tensor` type.
/// Candle's permute and unsqueeze only rewrite the layout, so every physical
/// view shares storage with its logical source.
pub mod candle;

#[cfg_attr(docsrs, doc(cfg(feature = "burn")))]
#[cfg(feature = "burn")]
/// Burn tensor backend implementation.
///
/// This module is only available when the `burn` feature flag is enabled.
/// Burn tensors carry their rank as a const generic, while vmap transforms
/// change rank at run time, so the module provides a rank-erased
/// [`BurnTensor`](burn::BurnTensor) wrapper.
pub mod burn;


// Re-export the core traits for convenient imports
pub use core_trait::*;


#[cfg(test)]
/// Mock tensor implementation.
///
/// Tracks shapes and axis provenance only
pub(crate) mod mock_tensor;
