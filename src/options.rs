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

//! Compiler option construction for the selected accelerator target.
//!
//! The toolchain reports a target's defaults as one `-`-delimited string.
//! [`OptionBuilder`] tokenizes it, restores the `-` flag marker on every
//! token and appends the HLIR pipeline selector, which must stay last so it
//! wins over any earlier `-hlir=` the defaults may carry.

use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_char;

use crate::error::{ToolchainCall, ToolchainError};
use crate::toolchain::{self, GraphToolchain};

/// Delimiter of the toolchain's default option string.
pub const OPTION_DELIMITER: char = '-';

/// Pipeline selected when none is configured.
pub const DEFAULT_PIPELINE: &str = "tops-hlir-pipeline";

/// Capacity of the default-option query buffer, terminator included.
pub const DEFAULT_OPTION_CAPACITY: usize = 1024;

const TRIM_CHARS: [char; 4] = [' ', '\t', '\n', '\r'];

/// Split `raw` on `delimiter`, trimming each token and dropping blank ones.
///
/// Order of the surviving tokens is preserved.
pub fn split_options(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(|token| token.trim_matches(TRIM_CHARS.as_slice()))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Ordered compiler flags, pipeline selector last.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionList {
    options: Vec<String>,
}

impl OptionList {
    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.options
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.options.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.options
    }

    /// Raw pointer form for the native compile call.
    pub fn to_argv(&self) -> Result<OptionArgv, ToolchainError> {
        OptionArgv::new(self)
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for OptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.options.join(" "))
    }
}

/// Option strings together with the `const char*` array pointing into them.
///
/// The pointers are only valid while this value is alive; hand it to the
/// toolchain by reference.
#[derive(Debug)]
pub struct OptionArgv {
    strings: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl OptionArgv {
    pub fn new(list: &OptionList) -> Result<Self, ToolchainError> {
        let strings = list
            .iter()
            .map(|opt| {
                CString::new(opt.as_str()).map_err(|_| ToolchainError::InteriorNul(opt.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        // CString contents live on the heap, so moving `strings` into the
        // struct keeps these pointers valid.
        let ptrs = strings.iter().map(|s| s.as_ptr()).collect();
        Ok(Self { strings, ptrs })
    }

    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }

    pub fn as_ptr(&self) -> *const *const c_char {
        self.ptrs.as_ptr()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CStr> + '_ {
        self.strings.iter().map(CString::as_c_str)
    }
}

/// Derives the option list for a target from the toolchain's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionBuilder {
    capacity: usize,
    pipeline: String,
}

impl Default for OptionBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_OPTION_CAPACITY,
            pipeline: DEFAULT_PIPELINE.to_string(),
        }
    }
}

impl OptionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the query buffer capacity (bytes, NUL included).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = pipeline.into();
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// The synthesized pipeline option appended after the target defaults.
    pub fn pipeline_option(&self) -> String {
        format!("-hlir={}", self.pipeline)
    }

    pub fn build<T>(&self, toolchain: &T, target: &str) -> Result<OptionList, ToolchainError>
    where
        T: GraphToolchain + ?Sized,
    {
        let defaults = self.query_defaults(toolchain, target)?;

        let mut options: Vec<String> = split_options(&defaults, OPTION_DELIMITER)
            .into_iter()
            .map(|token| format!("{OPTION_DELIMITER}{token}"))
            .collect();
        options.push(self.pipeline_option());

        let list = OptionList { options };
        log::trace!("compile options: {list}");
        Ok(list)
    }

    fn query_defaults<T>(&self, toolchain: &T, target: &str) -> Result<String, ToolchainError>
    where
        T: GraphToolchain + ?Sized,
    {
        if target.contains('\0') {
            return Err(ToolchainError::InvalidTarget(target.to_string()));
        }

        let mut buf = vec![0u8; self.capacity];
        toolchain::at(
            ToolchainCall::InitOptions,
            toolchain.default_options(target, &mut buf),
        )?;

        let raw = CStr::from_bytes_until_nul(&buf).map_err(|_| {
            ToolchainError::OptionsTruncated {
                capacity: self.capacity,
            }
        })?;
        raw.to_str()
            .map(str::to_owned)
            .map_err(|_| ToolchainError::OptionsEncoding)
    }
}

/// [`OptionBuilder::build`] with the default capacity and pipeline.
pub fn build_options<T>(toolchain: &T, target: &str) -> Result<OptionList, ToolchainError>
where
    T: GraphToolchain + ?Sized,
{
    OptionBuilder::default().build(toolchain, target)
}
