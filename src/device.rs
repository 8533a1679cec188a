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

//! Process-wide accelerator target selection.
//!
//! The framework selects the target once the device is known; the compiler
//! only reads it.

use std::sync::{PoisonError, RwLock};

use crate::error::ToolchainError;

/// Environment variable consulted when no target was selected.
pub const TARGET_ENV: &str = "GCU_TARGET_NAME";

static SELECTED: RwLock<Option<String>> = RwLock::new(None);

/// Record the active target. Called by the framework, not the compiler.
pub fn select_target(name: impl Into<String>) {
    let mut slot = SELECTED.write().unwrap_or_else(PoisonError::into_inner);
    *slot = Some(name.into());
}

/// Forget the selected target.
pub fn clear_target() {
    let mut slot = SELECTED.write().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
}

/// Name of the active target: the selected one, else `GCU_TARGET_NAME`.
///
/// Names are trimmed whichever source they come from; a blank name counts
/// as unset.
pub fn target_name() -> Result<String, ToolchainError> {
    target_name_or(None)
}

/// Like [`target_name`], falling back to `fallback` (typically the
/// configured target) when neither source names one.
pub fn target_name_or(fallback: Option<&str>) -> Result<String, ToolchainError> {
    let selected = SELECTED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_deref()
        .and_then(normalize);
    if let Some(name) = selected {
        return Ok(name);
    }

    std::env::var(TARGET_ENV)
        .ok()
        .as_deref()
        .and_then(normalize)
        .or_else(|| fallback.and_then(normalize))
        .ok_or(ToolchainError::TargetUnset)
}

fn normalize(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
