//! The burn implementation for backend provision.
//! Since burn Tensors are constrained with const generics, while vmap transforms
//! change rank at run time, we erase the rank into [`BurnTensor`] and macro apply
//! the rank dispatch.
use super::Backend;
use super::core_trait::check_permutation;
use crate::error::{Error, Result};
use burn::prelude::{Backend as BurnBackend, Tensor};

/// Highest rank a [`BurnTensor`] can hold
pub const MAX_BURN_RANK: usize = 8;

/// A burn float tensor of any rank in `1..=MAX_BURN_RANK`.
#[derive(Clone, Debug)]
pub enum BurnTensor<B: BurnBackend> {
    Rank1(Tensor<B, 1>),
    Rank2(Tensor<B, 2>),
    Rank3(Tensor<B, 3>),
    Rank4(Tensor<B, 4>),
    Rank5(Tensor<B, 5>),
    Rank6(Tensor<B, 6>),
    Rank7(Tensor<B, 7>),
    Rank8(Tensor<B, 8>),
}

macro_rules! each_rank {
    ($value:expr, $t:ident => $body:expr) => {
        match $value {
            BurnTensor::Rank1($t) => $body,
            BurnTensor::Rank2($t) => $body,
            BurnTensor::Rank3($t) => $body,
            BurnTensor::Rank4($t) => $body,
            BurnTensor::Rank5($t) => $body,
            BurnTensor::Rank6($t) => $body,
            BurnTensor::Rank7($t) => $body,
            BurnTensor::Rank8($t) => $body,
        }
    };
}

macro_rules! impl_from_ranked_tensor {
    ($d:literal, $variant:ident) => {
        impl<B: BurnBackend> From<Tensor<B, $d>> for BurnTensor<B> {
            fn from(tensor: Tensor<B, $d>) -> Self {
                BurnTensor::$variant(tensor)
            }
        }
    };
}

macro_rules! unsqueeze_ranked {
    ($value:expr, $dim:expr, $($variant:ident => $d:literal),*) => {
        match $value {
            $(BurnTensor::$variant(t) => Ok(t.clone().unsqueeze_dim::<{ $d + 1 }>($dim).into()),)*
            BurnTensor::Rank8(_) => Err(Error::RankLimit {
                rank: MAX_BURN_RANK + 1,
                max: MAX_BURN_RANK,
            }),
        }
    };
}

impl_from_ranked_tensor!(1, Rank1);
impl_from_ranked_tensor!(2, Rank2);
impl_from_ranked_tensor!(3, Rank3);
impl_from_ranked_tensor!(4, Rank4);
impl_from_ranked_tensor!(5, Rank5);
impl_from_ranked_tensor!(6, Rank6);
impl_from_ranked_tensor!(7, Rank7);
impl_from_ranked_tensor!(8, Rank8);

fn axes<const D: usize>(dims: &[usize]) -> Result<[isize; D]> {
    let axes: Vec<isize> = dims.iter().map(|&d| d as isize).collect();
    axes.try_into().map_err(|_| Error::InvalidPermutation {
        perm: dims.to_vec(),
        rank: D,
    })
}

impl<B: BurnBackend> Backend for BurnTensor<B> {
    fn shape(&self) -> Vec<usize> {
        each_rank!(self, t => t.dims().to_vec())
    }

    fn permute(&self, dims: &[usize]) -> Result<Self> {
        check_permutation(dims, self.rank())?;
        each_rank!(self, t => Ok(t.clone().permute(axes(dims)?).into()))
    }

    fn unsqueeze(&self, dim: usize) -> Result<Self> {
        let rank = self.rank();
        if dim > rank {
            return Err(Error::DimOutOfRange {
                dim: dim as i64,
                rank: rank + 1,
            });
        }
        unsqueeze_ranked!(
            self, dim,
            Rank1 => 1, Rank2 => 2, Rank3 => 3, Rank4 => 4,
            Rank5 => 5, Rank6 => 6, Rank7 => 7
        )
    }
}
