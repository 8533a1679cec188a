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

//! Accelerator backend glue: graph-to-executable compilation against the
//! vendor graph compiler, plus device kernel orchestration.
pub mod compiler;
pub mod config;
pub mod device;
pub mod error;
pub mod kernels;
pub mod options;
pub mod program;
pub mod toolchain;

pub use compiler::{abort_with, compile_executable, TopsCompiler};
pub use config::{BackendConfig, ConfigError};
pub use error::{BackendError, ToolchainCall, ToolchainError};
pub use options::{build_options, split_options, OptionArgv, OptionBuilder, OptionList};
pub use program::ProgramGuard;
pub use toolchain::{GraphToolchain, Status};

#[cfg(feature = "native")]
pub use toolchain::native::{HlirModule, LoadError, NativeExecutable, NativeToolchain};
