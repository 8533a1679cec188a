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

//! Scoped ownership of a compiler program handle.

use crate::error::{ToolchainCall, ToolchainError};
use crate::toolchain::{self, GraphToolchain};

/// Owns one program handle and destroys it exactly once.
///
/// Destruction happens either through [`release`](Self::release) or when
/// the guard is dropped on an early-return path.
pub struct ProgramGuard<'t, T: GraphToolchain + ?Sized> {
    toolchain: &'t T,
    program: Option<T::Program>,
}

impl<'t, T: GraphToolchain + ?Sized> ProgramGuard<'t, T> {
    /// Create a program from `module` and take ownership of it.
    pub fn create(toolchain: &'t T, module: &T::Module) -> Result<Self, ToolchainError> {
        let program = toolchain::at(
            ToolchainCall::CreateProgram,
            toolchain.create_program(module),
        )?;
        Ok(Self {
            toolchain,
            program: Some(program),
        })
    }

    pub fn program(&self) -> &T::Program {
        match &self.program {
            Some(program) => program,
            // `program` is only taken by `release`, which consumes the guard.
            None => unreachable!("program guard used after release"),
        }
    }

    /// Destroy the program now.
    pub fn release(mut self) {
        self.destroy();
    }

    fn destroy(&mut self) {
        if let Some(program) = self.program.take() {
            let status = self.toolchain.destroy_program(program);
            if !status.is_success() {
                log::warn!(
                    "{} returned status {status}; handle released anyway",
                    ToolchainCall::DestroyProgram
                );
            }
        }
    }
}

impl<T: GraphToolchain + ?Sized> Drop for ProgramGuard<'_, T> {
    fn drop(&mut self) {
        self.destroy();
    }
}
