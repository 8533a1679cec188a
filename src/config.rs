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

//! Backend configuration: a TOML file with environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ToolchainError;
use crate::options::{OptionBuilder, DEFAULT_OPTION_CAPACITY, DEFAULT_PIPELINE};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Vendor graph compiler library.
    pub graph_library: PathBuf,
    /// Vendor runtime library providing executables.
    pub runtime_library: PathBuf,
    /// HLIR pipeline selected by the trailing `-hlir=` option.
    pub pipeline: String,
    /// Bytes reserved for the target default-option query.
    pub option_buffer_capacity: usize,
    /// Target used when the framework has not selected one.
    pub target: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            graph_library: PathBuf::from("libtopsgraph.so"),
            runtime_library: PathBuf::from("libtopsrt.so"),
            pipeline: DEFAULT_PIPELINE.to_string(),
            option_buffer_capacity: DEFAULT_OPTION_CAPACITY,
            target: None,
        }
    }
}

impl BackendConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BackendConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `GCU_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = get("GCU_TOPSGRAPH_LIB") {
            self.graph_library = PathBuf::from(value);
        }
        if let Some(value) = get("GCU_TOPSRT_LIB") {
            self.runtime_library = PathBuf::from(value);
        }
        if let Some(value) = get("GCU_HLIR_PIPELINE") {
            self.pipeline = value;
        }
        if let Some(value) = get("GCU_OPTION_BUFFER") {
            self.option_buffer_capacity =
                value.parse().map_err(|err| ConfigError::Invalid {
                    key: "GCU_OPTION_BUFFER",
                    message: format!("{value:?}: {err}"),
                })?;
        }
        if let Some(value) = get(crate::device::TARGET_ENV) {
            self.target = Some(value);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.option_buffer_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "option_buffer_capacity",
                message: "must be at least 1 byte".into(),
            });
        }
        if self.pipeline.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "pipeline",
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// The framework's selected target, falling back to `target`.
    pub fn resolve_target(&self) -> Result<String, ToolchainError> {
        crate::device::target_name_or(self.target.as_deref())
    }

    pub fn option_builder(&self) -> OptionBuilder {
        OptionBuilder::new()
            .with_capacity(self.option_buffer_capacity)
            .with_pipeline(self.pipeline.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = BackendConfig::from_toml_str("").expect("parse");
        assert_eq!(config, BackendConfig::default());
        assert_eq!(config.option_builder(), OptionBuilder::default());
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = BackendConfig::from_toml_str("option_buffer_capacity = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "option_buffer_capacity",
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            BackendConfig::from_toml_str("pipelin = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
