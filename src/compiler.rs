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

//! Graph module to executable compilation.
//!
//! The driver walks the toolchain's program lifecycle strictly in order:
//! build options, create the program, compile, size and extract the binary,
//! destroy the program, then wrap the binary into an executable. Any
//! non-success status stops the walk and is returned as a
//! [`ToolchainError`]; the program handle is destroyed on every path.
//!
//! Compilation happens ahead of time on internally generated graphs, so a
//! failure has no recovery. [`TopsCompiler::compile_or_abort`] is the
//! default policy for embedders and terminates the process.

use crate::config::BackendConfig;
use crate::device;
use crate::error::{ToolchainCall, ToolchainError};
use crate::options::OptionBuilder;
use crate::program::ProgramGuard;
use crate::toolchain::{self, GraphToolchain};

/// Compiles graph modules with one toolchain.
pub struct TopsCompiler<'t, T: GraphToolchain + ?Sized> {
    toolchain: &'t T,
    options: OptionBuilder,
    fallback_target: Option<String>,
}

impl<'t, T: GraphToolchain + ?Sized> TopsCompiler<'t, T> {
    pub fn new(toolchain: &'t T) -> Self {
        Self::with_options(toolchain, OptionBuilder::default())
    }

    pub fn with_options(toolchain: &'t T, options: OptionBuilder) -> Self {
        Self {
            toolchain,
            options,
            fallback_target: None,
        }
    }

    /// Compiler using `config`'s option settings, with its `target` as the
    /// fallback when the framework has not selected one.
    pub fn from_config(toolchain: &'t T, config: &BackendConfig) -> Self {
        Self::with_options(toolchain, config.option_builder())
            .with_fallback_target(config.target.clone())
    }

    pub fn with_fallback_target(mut self, target: Option<String>) -> Self {
        self.fallback_target = target;
        self
    }

    pub fn options(&self) -> &OptionBuilder {
        &self.options
    }

    /// Compile `module` for the currently selected target, else the
    /// fallback target.
    pub fn compile(&self, module: &T::Module) -> Result<T::Executable, ToolchainError> {
        let target = device::target_name_or(self.fallback_target.as_deref())?;
        self.compile_for_target(module, &target)
    }

    /// Compile `module` for `target`. The returned executable is owned by
    /// the caller.
    pub fn compile_for_target(
        &self,
        module: &T::Module,
        target: &str,
    ) -> Result<T::Executable, ToolchainError> {
        let options = self.options.build(self.toolchain, target)?;
        let argv = options.to_argv()?;

        let program = ProgramGuard::create(self.toolchain, module)?;
        log::debug!("compiling program for {target} with {} options", argv.len());
        toolchain::at(
            ToolchainCall::CompileProgram,
            self.toolchain.compile_program(program.program(), &argv),
        )?;

        let reported = toolchain::at(
            ToolchainCall::GetBinSize,
            self.toolchain.binary_size(program.program()),
        )?;
        let mut binary = allocate_binary(reported)?;
        toolchain::at(
            ToolchainCall::GetBin,
            self.toolchain.binary(program.program(), &mut binary),
        )?;
        program.release();

        let executable = toolchain::at(
            ToolchainCall::CreateExecutable,
            self.toolchain.create_executable(&binary),
        )?;
        log::debug!("created executable from {} byte binary", binary.len());
        Ok(executable)
    }

    /// [`compile`](Self::compile), terminating the process on failure.
    pub fn compile_or_abort(&self, module: &T::Module) -> T::Executable {
        match self.compile(module) {
            Ok(executable) => executable,
            Err(err) => abort_with(&err),
        }
    }
}

/// Compile `module` for `target` with the default option builder.
pub fn compile_executable<T>(
    toolchain: &T,
    module: &T::Module,
    target: &str,
) -> Result<T::Executable, ToolchainError>
where
    T: GraphToolchain + ?Sized,
{
    TopsCompiler::new(toolchain).compile_for_target(module, target)
}

/// Report a fatal toolchain error and abort the process.
pub fn abort_with(err: &ToolchainError) -> ! {
    match err.call() {
        Some(call) => log::error!("fatal: graph compilation failed in {call}: {err}"),
        None => log::error!("fatal: graph compilation failed: {err}"),
    }
    eprintln!("error[gcu-compile] {err}");
    std::process::abort()
}

fn allocate_binary(size: u64) -> Result<Vec<u8>, ToolchainError> {
    let overflow = || ToolchainError::BinarySizeOverflow { size };
    let len = usize::try_from(size).map_err(|_| overflow())?;
    let mut binary = Vec::new();
    binary.try_reserve_exact(len).map_err(|_| overflow())?;
    binary.resize(len, 0);
    Ok(binary)
}
