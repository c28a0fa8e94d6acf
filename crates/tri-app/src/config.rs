// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use tri_render::{AppInfo, ApiVersion, BootstrapSettings, WindowDesc};

/// `[major, minor, patch]`, rejected when a component overflows its field.
fn version_triple<'de, D: Deserializer<'de>>(d: D) -> Result<ApiVersion, D::Error> {
    let triple = <[u32; 3]>::deserialize(d)?;
    ApiVersion::try_from(triple).map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowCfg {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowCfg {
    fn default() -> Self {
        let d = WindowDesc::default();
        WindowCfg {
            width: d.width,
            height: d.height,
            title: d.title,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MetaCfg {
    pub name: String,
    #[serde(deserialize_with = "version_triple")]
    pub version: ApiVersion,
    pub engine_name: String,
    #[serde(deserialize_with = "version_triple")]
    pub engine_version: ApiVersion,
}

impl Default for MetaCfg {
    fn default() -> Self {
        MetaCfg {
            name: "Vulkan Triangle".to_owned(),
            version: ApiVersion::new(0, 1, 0, 0),
            engine_name: "No Engine".to_owned(),
            engine_version: ApiVersion::new(0, 1, 0, 0),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogCfg {
    pub filter: String,
}

impl Default for LogCfg {
    fn default() -> Self {
        LogCfg {
            filter: "info".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RunCfg {
    /// 0 polls without waiting.
    pub poll_timeout_ms: u64,
}

impl Default for RunCfg {
    fn default() -> Self {
        RunCfg {
            poll_timeout_ms: 16,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct AppCfg {
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub app: MetaCfg,
    #[serde(default)]
    pub log: LogCfg,
    #[serde(default)]
    pub run: RunCfg,
}

impl AppCfg {
    pub fn bootstrap_settings(&self) -> BootstrapSettings {
        BootstrapSettings {
            app: AppInfo {
                name: self.app.name.clone(),
                version: self.app.version,
                engine_name: self.app.engine_name.clone(),
                engine_version: self.app.engine_version,
            },
            window: WindowDesc {
                width: self.window.width.max(1),
                height: self.window.height.max(1),
                title: self.window.title.clone(),
            },
        }
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        match self.run.poll_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

pub fn parse_cfg(text: &str) -> Result<AppCfg> {
    toml::from_str::<AppCfg>(text).context("invalid config")
}

/// A missing file means defaults; anything else unreadable is an error.
pub fn load_cfg(path: &Path) -> Result<AppCfg> {
    match fs::read_to_string(path) {
        Ok(s) => parse_cfg(&s).with_context(|| format!("parsing {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AppCfg::default()),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}
