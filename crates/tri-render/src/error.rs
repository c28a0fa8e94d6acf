// SPDX-License-Identifier: CEPL-1.0
use thiserror::Error;

use crate::bootstrap::Stage;
use crate::negotiate::{NoSuitableDevice, UnsupportedExtension, UnsupportedLayer};

/// Every way the bootstrap can abort. None of them are retried.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Graphics loader unreachable: {0}")]
    HostEnvironment(String),
    #[error("Windowing layer failed to initialise: {0}")]
    PlatformInit(String),
    #[error(transparent)]
    UnsupportedLayer(#[from] UnsupportedLayer),
    #[error(transparent)]
    UnsupportedExtension(#[from] UnsupportedExtension),
    #[error(transparent)]
    NoSuitableDevice(#[from] NoSuitableDevice),
    #[error("Capability query failed ({what}): {reason}")]
    CapabilityQuery { what: &'static str, reason: String },
    #[error("Instance creation failed: {0}")]
    InstanceCreation(String),
    #[error("Debug messenger creation failed: {0}")]
    DiagnosticsSetup(String),
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),
    #[error("Logical device creation failed: {0}")]
    DeviceCreation(String),
    #[error("Bootstrap step out of order at {stage:?}: {detail}")]
    OutOfOrder { stage: Stage, detail: &'static str },
}

impl BootstrapError {
    /// Process exit status for this failure class. Zero is reserved for a
    /// clean run.
    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::HostEnvironment(_) => 2,
            BootstrapError::PlatformInit(_) => 3,
            BootstrapError::UnsupportedLayer(_) => 4,
            BootstrapError::UnsupportedExtension(_) => 5,
            BootstrapError::NoSuitableDevice(_) => 6,
            BootstrapError::CapabilityQuery { .. } => 7,
            BootstrapError::InstanceCreation(_) => 8,
            BootstrapError::DiagnosticsSetup(_) => 9,
            BootstrapError::SurfaceCreation(_) => 10,
            BootstrapError::DeviceCreation(_) => 11,
            BootstrapError::OutOfOrder { .. } => 70,
        }
    }
}
