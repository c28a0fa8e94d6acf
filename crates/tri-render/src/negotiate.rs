// SPDX-License-Identifier: CEPL-1.0
//! Matching a [`RequirementSet`] against capability snapshots.
//!
//! Layer and extension checks are fail-fast linear scans over the
//! requirement list, so the error always names the first unmet entry in
//! declaration order. Device selection takes the first candidate that
//! passes every predicate; there is deliberately no discrete-vs-integrated
//! ranking.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::caps::{DeviceFeature, PhysicalDeviceCandidate};
use crate::requirements::RequirementSet;
use crate::version::ApiVersion;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Required layer not supported: {0}")]
pub struct UnsupportedLayer(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Required extension not supported: {0}")]
pub struct UnsupportedExtension(pub String);

/// Why one candidate was turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    ApiVersionTooLow {
        found: ApiVersion,
        required: ApiVersion,
    },
    /// Non-zero variant: not the core API this bootstrap targets.
    UnsupportedVariant(u32),
    NoGraphicsQueue,
    MissingExtensions(Vec<String>),
    MissingFeatures(Vec<DeviceFeature>),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ApiVersionTooLow { found, required } => {
                write!(f, "api version {found} < {required}")
            }
            Rejection::UnsupportedVariant(variant) => write!(f, "api variant {variant}"),
            Rejection::NoGraphicsQueue => f.write_str("no graphics queue family"),
            Rejection::MissingExtensions(exts) => {
                write!(f, "missing extensions [{}]", exts.join(", "))
            }
            Rejection::MissingFeatures(features) => {
                f.write_str("missing features [")?;
                for (i, feature) in features.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{feature}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDevice {
    pub name: String,
    pub reasons: Vec<Rejection>,
}

/// No enumerated device passed every predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoSuitableDevice {
    pub rejected: Vec<RejectedDevice>,
}

impl std::error::Error for NoSuitableDevice {}

impl fmt::Display for NoSuitableDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rejected.is_empty() {
            return f.write_str("No suitable physical device: none enumerated");
        }
        f.write_str("No suitable physical device:")?;
        for device in &self.rejected {
            write!(f, " {:?} (", device.name)?;
            for (i, reason) in device.reasons.iter().enumerate() {
                if i > 0 {
                    f.write_str("; ")?;
                }
                write!(f, "{reason}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

fn first_missing<'a>(required: &'a [String], available: &[String]) -> Option<&'a String> {
    required
        .iter()
        .find(|wanted| !available.iter().any(|have| have == *wanted))
}

pub fn match_layers(required: &[String], available: &[String]) -> Result<(), UnsupportedLayer> {
    match first_missing(required, available) {
        Some(missing) => Err(UnsupportedLayer(missing.clone())),
        None => Ok(()),
    }
}

pub fn match_instance_extensions(
    required: &[String],
    available: &[String],
) -> Result<(), UnsupportedExtension> {
    match first_missing(required, available) {
        Some(missing) => Err(UnsupportedExtension(missing.clone())),
        None => Ok(()),
    }
}

/// Every predicate `candidate` fails; empty means it qualifies.
pub fn evaluate_candidate<H>(
    candidate: &PhysicalDeviceCandidate<H>,
    requirements: &RequirementSet,
) -> Vec<Rejection> {
    let mut reasons = Vec::new();

    if candidate.api_version.variant() != 0 {
        reasons.push(Rejection::UnsupportedVariant(candidate.api_version.variant()));
    }

    if candidate.api_version < requirements.min_api_version() {
        reasons.push(Rejection::ApiVersionTooLow {
            found: candidate.api_version,
            required: requirements.min_api_version(),
        });
    }

    if candidate.graphics_queue_family().is_none() {
        reasons.push(Rejection::NoGraphicsQueue);
    }

    let missing_exts: Vec<String> = requirements
        .device_extensions()
        .iter()
        .filter(|ext| !candidate.extensions.contains(*ext))
        .cloned()
        .collect();
    if !missing_exts.is_empty() {
        reasons.push(Rejection::MissingExtensions(missing_exts));
    }

    let missing_features: Vec<DeviceFeature> = requirements
        .device_features()
        .iter()
        .filter(|feature| !candidate.features.contains(*feature))
        .copied()
        .collect();
    if !missing_features.is_empty() {
        reasons.push(Rejection::MissingFeatures(missing_features));
    }

    reasons
}

pub fn select_physical_device<H>(
    candidates: Vec<PhysicalDeviceCandidate<H>>,
    requirements: &RequirementSet,
) -> Result<PhysicalDeviceCandidate<H>, NoSuitableDevice> {
    let mut rejected = Vec::new();
    for candidate in candidates {
        let reasons = evaluate_candidate(&candidate, requirements);
        if reasons.is_empty() {
            return Ok(candidate);
        }
        debug!("Skipping {:?}: {:?}", candidate.name, reasons);
        rejected.push(RejectedDevice {
            name: candidate.name,
            reasons,
        });
    }
    Err(NoSuitableDevice { rejected })
}
