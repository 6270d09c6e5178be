use super::Backend;
use crate::error::Result;
use candle_core::Tensor;

impl Backend for Tensor {
    fn shape(&self) -> Vec<usize> {
        self.dims().to_vec()
    }

    fn permute(&self, dims: &[usize]) -> Result<Self> {
        Ok(Tensor::permute(self, dims.to_vec())?)
    }

    fn unsqueeze(&self, dim: usize) -> Result<Self> {
        Ok(Tensor::unsqueeze(self, dim)?)
    }
}
