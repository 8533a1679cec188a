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

//! Error types shared by the option builder and the compilation driver.

use std::fmt;

use crate::config::ConfigError;
use crate::kernels::KernelError;
#[cfg(feature = "native")]
use crate::toolchain::native::LoadError;

/// Native toolchain entry points the core calls, in protocol order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolchainCall {
    InitOptions,
    CreateProgram,
    CompileProgram,
    GetBinSize,
    GetBin,
    DestroyProgram,
    CreateExecutable,
}

impl ToolchainCall {
    /// Symbol name of the native function behind this call site.
    pub fn symbol(self) -> &'static str {
        match self {
            ToolchainCall::InitOptions => "topsgraphInitOptions",
            ToolchainCall::CreateProgram => "topsgraphCreateProgramFromModule",
            ToolchainCall::CompileProgram => "topsgraphCompileProgram",
            ToolchainCall::GetBinSize => "topsgraphGetBinSize",
            ToolchainCall::GetBin => "topsgraphGetBin",
            ToolchainCall::DestroyProgram => "topsgraphDestroyProgram",
            ToolchainCall::CreateExecutable => "topsCreateExecutable",
        }
    }
}

impl fmt::Display for ToolchainCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Failures surfaced while building options or compiling a module.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ToolchainError {
    /// A native call returned a non-success status.
    #[error("{call} failed with status {status}")]
    CallFailed { call: ToolchainCall, status: i32 },
    /// The target option string did not fit the bounded query buffer.
    #[error("target options do not fit in the {capacity}-byte query buffer")]
    OptionsTruncated { capacity: usize },
    /// The target option string is not valid UTF-8.
    #[error("target options are not valid UTF-8")]
    OptionsEncoding,
    /// An option token cannot be handed to C because it contains NUL.
    #[error("option {0:?} contains an interior NUL byte")]
    InteriorNul(String),
    /// A target name cannot be handed to C because it contains NUL.
    #[error("target name {0:?} contains an interior NUL byte")]
    InvalidTarget(String),
    /// The reported binary size cannot be addressed on this host.
    #[error("binary size {size} exceeds the host address space")]
    BinarySizeOverflow { size: u64 },
    /// No accelerator target was selected.
    #[error("no accelerator target selected (set GCU_TARGET_NAME or select one explicitly)")]
    TargetUnset,
}

impl ToolchainError {
    /// The native call that failed, if the error came from one.
    pub fn call(&self) -> Option<ToolchainCall> {
        match self {
            ToolchainError::CallFailed { call, .. } => Some(*call),
            ToolchainError::OptionsTruncated { .. } | ToolchainError::OptionsEncoding => {
                Some(ToolchainCall::InitOptions)
            }
            _ => None,
        }
    }
}

/// Aggregate error for callers embedding the whole backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[cfg(feature = "native")]
    #[error(transparent)]
    Load(#[from] LoadError),
}
