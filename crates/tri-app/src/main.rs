// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tri_core::init_tracing;
use tri_platform::WinitPlatform;
use tri_render::{Bootstrap, BootstrapError, Platform, RequirementSet};
use tri_render_vk::VkDriver;

mod config;

use config::{load_cfg, AppCfg};

/// Validation layers and the debug messenger ride along in debug builds only.
const ENABLE_VALIDATION: bool = cfg!(debug_assertions);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional TOML file with window, app metadata and logging settings
    #[arg(long, default_value = "triangle.toml")]
    config: PathBuf,
}

fn run(cfg: &AppCfg) -> Result<(), BootstrapError> {
    let platform = WinitPlatform::new(cfg.poll_timeout())?;
    let platform_extensions = platform.required_instance_extensions()?;
    let requirements = RequirementSet::new(platform_extensions, ENABLE_VALIDATION);
    info!(
        "validation = {}, instance extensions = {:?}",
        ENABLE_VALIDATION,
        requirements.instance_extensions()
    );

    let mut boot = Bootstrap::new(platform, VkDriver, cfg.bootstrap_settings(), requirements);
    let result = boot.initialize().and_then(|()| boot.run());
    boot.teardown();
    result
}

fn main() -> ExitCode {
    let args = Args::parse();
    let (cfg, cfg_err) = match load_cfg(&args.config) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppCfg::default(), Some(e)),
    };
    init_tracing(&cfg.log.filter);
    if let Some(e) = cfg_err {
        warn!("{e:#}; using defaults");
    }

    match run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
