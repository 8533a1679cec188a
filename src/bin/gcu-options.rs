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

//! Print the graph compiler options the backend would use for a target.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use gcu_backend::{BackendConfig, NativeToolchain, OptionList};

#[derive(Parser, Debug)]
#[command(
    name = "gcu-options",
    about = "Print the graph compiler options for an accelerator target",
    version
)]
struct Cli {
    /// Target name. Defaults to GCU_TARGET_NAME, then the config file.
    #[arg(long, value_name = "NAME")]
    target: Option<String>,
    /// Backend configuration file (TOML).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// HLIR pipeline selected by the trailing -hlir= option.
    #[arg(long, value_name = "NAME")]
    pipeline: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(options) => {
            for option in &options {
                println!("{option}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error[gcu-options] {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<OptionList> {
    let mut config = match &cli.config {
        Some(path) => BackendConfig::load(path)?,
        None => BackendConfig::default(),
    }
    .apply_env()?;

    if let Some(pipeline) = &cli.pipeline {
        config.pipeline = pipeline.clone();
        config.validate()?;
    }

    let target = match &cli.target {
        Some(target) => target.clone(),
        None => config.resolve_target()?,
    };

    let toolchain = NativeToolchain::load(&config).context("loading the vendor toolchain")?;
    config
        .option_builder()
        .build(&toolchain, &target)
        .with_context(|| format!("querying default options for target '{target}'"))
}
