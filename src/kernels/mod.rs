// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the “License”);
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an “AS IS” BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Device kernel orchestration.
//!
//! Kernels here own layout plumbing only: validating attributes, moving
//! tensors between the framework's NCHW layout and the vendor library's
//! NHWC layout, and shaping outputs. The numeric work is done by the vendor
//! math library behind a trait.

pub mod grid_sample;

use std::fmt;

use half::f16;

pub use grid_sample::{
    grid_sample, grid_sample_grad, GridSampleAttrs, GridSampleGrads, GridSampleLibrary,
    InterpolationMode, PaddingMode,
};

/// Permutation taking NCHW to NHWC.
pub const NCHW_TO_NHWC: [usize; 4] = [0, 2, 3, 1];
/// Permutation taking NHWC to NCHW.
pub const NHWC_TO_NCHW: [usize; 4] = [0, 3, 1, 2];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KernelError {
    /// Attribute value the device kernel does not implement.
    #[error("unsupported {attr} '{value}' (only '{supported}' is available on this device)")]
    Unsupported {
        attr: &'static str,
        value: String,
        supported: &'static str,
    },
    #[error("shape mismatch: {0}")]
    Shape(String),
    #[error("invalid permutation {perm:?} for rank {rank}")]
    Permutation { perm: Vec<usize>, rank: usize },
    /// The vendor library reported a failure.
    #[error("{op} failed with status {status}")]
    Library { op: &'static str, status: i32 },
}

/// Element types the vendor library accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Float32,
    Float16,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Float32 => write!(f, "float32"),
            DataType::Float16 => write!(f, "float16"),
        }
    }
}

pub trait Element: Copy + Default + fmt::Debug + 'static {
    const DTYPE: DataType;
}

impl Element for f32 {
    const DTYPE: DataType = DataType::Float32;
}

impl Element for f16 {
    const DTYPE: DataType = DataType::Float16;
}

/// Dense row-major tensor in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Element> HostTensor<T> {
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self, KernelError> {
        let expected = element_count(&shape)?;
        if expected != data.len() {
            return Err(KernelError::Shape(format!(
                "shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Zero-filled tensor, the equivalent of a fresh device allocation.
    pub fn zeros(shape: Vec<usize>) -> Result<Self, KernelError> {
        let len = element_count(&shape)?;
        Ok(Self {
            shape,
            data: vec![T::default(); len],
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn dtype(&self) -> DataType {
        T::DTYPE
    }
}

fn element_count(shape: &[usize]) -> Result<usize, KernelError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| {
            KernelError::Shape(format!("shape {shape:?} overflows the element count"))
        })
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Transpose `tensor` so that output axis `i` is input axis `perm[i]`.
pub fn permute<T: Element>(
    tensor: &HostTensor<T>,
    perm: &[usize],
) -> Result<HostTensor<T>, KernelError> {
    let rank = tensor.rank();
    let mut seen = vec![false; rank];
    let valid = perm.len() == rank
        && perm
            .iter()
            .all(|&axis| axis < rank && !std::mem::replace(&mut seen[axis], true));
    if !valid {
        return Err(KernelError::Permutation {
            perm: perm.to_vec(),
            rank,
        });
    }

    let in_strides = strides(&tensor.shape);
    let out_shape: Vec<usize> = perm.iter().map(|&axis| tensor.shape[axis]).collect();
    let src_strides: Vec<usize> = perm.iter().map(|&axis| in_strides[axis]).collect();

    let len = tensor.data.len();
    let mut data = Vec::with_capacity(len);
    let mut index = vec![0usize; rank];
    for _ in 0..len {
        let offset: usize = index.iter().zip(&src_strides).map(|(i, s)| i * s).sum();
        data.push(tensor.data[offset]);

        for axis in (0..rank).rev() {
            index[axis] += 1;
            if index[axis] < out_shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }

    Ok(HostTensor {
        shape: out_shape,
        data,
    })
}
