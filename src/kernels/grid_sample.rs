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

//! `grid_sample` and its gradient.
//!
//! The framework hands over `x` as NCHW and `grid` as `[N, Ho, Wo, 2]`;
//! the vendor library works on NHWC. Inputs are transposed on the way in
//! and results on the way out.

use std::fmt;
use std::str::FromStr;

use super::{permute, Element, HostTensor, KernelError, NCHW_TO_NHWC, NHWC_TO_NCHW};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpolationMode {
    Bilinear,
    Nearest,
}

impl FromStr for InterpolationMode {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bilinear" => Ok(InterpolationMode::Bilinear),
            "nearest" => Ok(InterpolationMode::Nearest),
            other => Err(unsupported("mode", other, "bilinear")),
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationMode::Bilinear => write!(f, "bilinear"),
            InterpolationMode::Nearest => write!(f, "nearest"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaddingMode {
    Zeros,
    Border,
    Reflection,
}

impl FromStr for PaddingMode {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zeros" => Ok(PaddingMode::Zeros),
            "border" => Ok(PaddingMode::Border),
            "reflection" => Ok(PaddingMode::Reflection),
            other => Err(unsupported("padding_mode", other, "zeros")),
        }
    }
}

impl fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaddingMode::Zeros => write!(f, "zeros"),
            PaddingMode::Border => write!(f, "border"),
            PaddingMode::Reflection => write!(f, "reflection"),
        }
    }
}

fn unsupported(attr: &'static str, value: &str, supported: &'static str) -> KernelError {
    KernelError::Unsupported {
        attr,
        value: value.to_string(),
        supported,
    }
}

/// Sampling attributes, validated against what the device implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSampleAttrs {
    pub mode: InterpolationMode,
    pub padding_mode: PaddingMode,
    pub align_corners: bool,
}

impl GridSampleAttrs {
    /// Parse the framework's string attributes.
    pub fn parse(mode: &str, padding_mode: &str, align_corners: bool) -> Result<Self, KernelError> {
        let attrs = Self {
            mode: mode.parse()?,
            padding_mode: padding_mode.parse()?,
            align_corners,
        };
        attrs.validate()?;
        Ok(attrs)
    }

    /// Only bilinear sampling with zero padding is available on device.
    pub fn validate(&self) -> Result<(), KernelError> {
        if self.mode != InterpolationMode::Bilinear {
            return Err(unsupported("mode", &self.mode.to_string(), "bilinear"));
        }
        if self.padding_mode != PaddingMode::Zeros {
            return Err(unsupported(
                "padding_mode",
                &self.padding_mode.to_string(),
                "zeros",
            ));
        }
        Ok(())
    }
}

/// Vendor grid-sample primitives. Every tensor is NHWC.
pub trait GridSampleLibrary<T: Element> {
    /// `input` is `[N, H, W, C]`, `grid` is `[N, Ho, Wo, 2]`, `output` is
    /// `[N, Ho, Wo, C]`.
    fn grid_sample(
        &self,
        attrs: &GridSampleAttrs,
        input: &HostTensor<T>,
        grid: &HostTensor<T>,
        output: &mut HostTensor<T>,
    ) -> Result<(), KernelError>;

    /// `out_grad` is `[N, Ho, Wo, C]`, `input_grad` is `[N, H, W, C]`,
    /// `grid_grad` is `[N, Ho, Wo, 2]`.
    fn grid_sample_backward(
        &self,
        attrs: &GridSampleAttrs,
        out_grad: &HostTensor<T>,
        input: &HostTensor<T>,
        grid: &HostTensor<T>,
        input_grad: &mut HostTensor<T>,
        grid_grad: &mut HostTensor<T>,
    ) -> Result<(), KernelError>;
}

/// Gradients produced by [`grid_sample_grad`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridSampleGrads<T> {
    /// `[N, C, H, W]`
    pub x_grad: HostTensor<T>,
    /// `[N, Ho, Wo, 2]`
    pub grid_grad: HostTensor<T>,
}

#[derive(Debug, Clone, Copy)]
struct Dims {
    n: usize,
    c: usize,
    in_h: usize,
    in_w: usize,
    out_h: usize,
    out_w: usize,
}

fn check_dims<T: Element>(x: &HostTensor<T>, grid: &HostTensor<T>) -> Result<Dims, KernelError> {
    let (xs, gs) = (x.shape(), grid.shape());
    if xs.len() != 4 {
        return Err(KernelError::Shape(format!("x must be NCHW, got {xs:?}")));
    }
    if gs.len() != 4 || gs[3] != 2 {
        return Err(KernelError::Shape(format!(
            "grid must be [N, Ho, Wo, 2], got {gs:?}"
        )));
    }
    if xs[0] != gs[0] {
        return Err(KernelError::Shape(format!(
            "batch mismatch: x has {}, grid has {}",
            xs[0], gs[0]
        )));
    }
    Ok(Dims {
        n: xs[0],
        c: xs[1],
        in_h: xs[2],
        in_w: xs[3],
        out_h: gs[1],
        out_w: gs[2],
    })
}

/// Sample `x` at the locations in `grid`; returns `[N, C, Ho, Wo]`.
pub fn grid_sample<T, L>(
    lib: &L,
    x: &HostTensor<T>,
    grid: &HostTensor<T>,
    attrs: &GridSampleAttrs,
) -> Result<HostTensor<T>, KernelError>
where
    T: Element,
    L: GridSampleLibrary<T> + ?Sized,
{
    attrs.validate()?;
    let d = check_dims(x, grid)?;
    log::debug!(
        "grid_sample<{}> x={:?} grid={:?}",
        T::DTYPE,
        x.shape(),
        grid.shape()
    );

    let input = permute(x, &NCHW_TO_NHWC)?;
    let mut output = HostTensor::zeros(vec![d.n, d.out_h, d.out_w, d.c])?;
    lib.grid_sample(attrs, &input, grid, &mut output)?;

    permute(&output, &NHWC_TO_NCHW)
}

/// Gradients of [`grid_sample`] with respect to `x` and `grid`.
pub fn grid_sample_grad<T, L>(
    lib: &L,
    x: &HostTensor<T>,
    grid: &HostTensor<T>,
    out_grad: &HostTensor<T>,
    attrs: &GridSampleAttrs,
) -> Result<GridSampleGrads<T>, KernelError>
where
    T: Element,
    L: GridSampleLibrary<T> + ?Sized,
{
    attrs.validate()?;
    let d = check_dims(x, grid)?;
    let expected = [d.n, d.c, d.out_h, d.out_w];
    if out_grad.shape() != expected {
        return Err(KernelError::Shape(format!(
            "out_grad must be {expected:?}, got {:?}",
            out_grad.shape()
        )));
    }
    log::debug!(
        "grid_sample_grad<{}> x={:?} grid={:?}",
        T::DTYPE,
        x.shape(),
        grid.shape()
    );

    let input = permute(x, &NCHW_TO_NHWC)?;
    let out_grad = permute(out_grad, &NCHW_TO_NHWC)?;
    let mut input_grad = HostTensor::zeros(vec![d.n, d.in_h, d.in_w, d.c])?;
    let mut grid_grad = HostTensor::zeros(vec![d.n, d.out_h, d.out_w, 2])?;

    lib.grid_sample_backward(attrs, &out_grad, &input, grid, &mut input_grad, &mut grid_grad)?;

    Ok(GridSampleGrads {
        x_grad: permute(&input_grad, &NHWC_TO_NCHW)?,
        grid_grad,
    })
}
