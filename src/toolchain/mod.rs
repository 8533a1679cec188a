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

//! Boundary with the vendor graph compiler.
//!
//! [`GraphToolchain`] is the contract the compilation driver is written
//! against. The native implementation binds the vendor shared libraries at
//! runtime; tests substitute recording doubles.

use std::fmt;

use crate::error::{ToolchainCall, ToolchainError};
use crate::options::OptionArgv;

#[cfg(feature = "native")]
pub mod native;

/// Raw status code reported by a toolchain call. Zero is success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    pub const SUCCESS: Status = Status(0);

    pub fn is_success(self) -> bool {
        self == Status::SUCCESS
    }

    /// Map a non-success status to a [`ToolchainError`] tagged with `call`.
    pub fn check(self, call: ToolchainCall) -> Result<(), ToolchainError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(ToolchainError::CallFailed {
                call,
                status: self.0,
            })
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag a raw toolchain result with the call site it came from.
pub(crate) fn at<T>(call: ToolchainCall, result: Result<T, Status>) -> Result<T, ToolchainError> {
    result.map_err(|status| ToolchainError::CallFailed {
        call,
        status: status.0,
    })
}

/// Capabilities of an external graph compiler.
///
/// Every call is synchronous and blocking. A program handle is created,
/// used and destroyed within one compilation; `destroy_program` takes it by
/// value so it cannot be destroyed twice.
pub trait GraphToolchain {
    /// Graph module the program is created from. Borrowed, never owned.
    type Module: ?Sized;
    /// Opaque in-progress compilation.
    type Program;
    /// Loadable artifact handed to the caller.
    type Executable;

    /// Fill `buf` with the NUL-terminated, `-`-delimited default option
    /// string for `target`.
    fn default_options(&self, target: &str, buf: &mut [u8]) -> Result<(), Status>;

    fn create_program(&self, module: &Self::Module) -> Result<Self::Program, Status>;

    fn compile_program(&self, program: &Self::Program, options: &OptionArgv)
        -> Result<(), Status>;

    fn binary_size(&self, program: &Self::Program) -> Result<u64, Status>;

    /// Copy the compiled binary into `buf`, which is exactly
    /// [`binary_size`](Self::binary_size) bytes long.
    fn binary(&self, program: &Self::Program, buf: &mut [u8]) -> Result<(), Status>;

    fn destroy_program(&self, program: Self::Program) -> Status;

    fn create_executable(&self, binary: &[u8]) -> Result<Self::Executable, Status>;
}
