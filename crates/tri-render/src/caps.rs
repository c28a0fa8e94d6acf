// SPDX-License-Identifier: CEPL-1.0
//! Capability snapshots as reported by the host graphics stack.
//!
//! Every value here is produced fresh by a [`Driver`](crate::Driver) query
//! and is only meaningful at the instant it was taken. Nothing in the crate
//! caches these across negotiation steps.

use std::collections::BTreeSet;
use std::fmt;

use bitflags::bitflags;

use crate::version::ApiVersion;

bitflags! {
    /// Command types a queue family accepts. Bit values follow `VkQueueFlagBits`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct QueueCapabilities: u32 {
        const GRAPHICS = 0x1;
        const COMPUTE = 0x2;
        const TRANSFER = 0x4;
        const SPARSE_BINDING = 0x8;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamily {
    pub index: u32,
    pub capabilities: QueueCapabilities,
    pub queue_count: u32,
}

/// Optional device capabilities requested through the feature chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceFeature {
    /// `dynamicRendering` from the Vulkan 1.3 feature block.
    DynamicRendering,
    /// `extendedDynamicState` from `VK_EXT_extended_dynamic_state`.
    ExtendedDynamicState,
}

impl fmt::Display for DeviceFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceFeature::DynamicRendering => "dynamicRendering",
            DeviceFeature::ExtendedDynamicState => "extendedDynamicState",
        })
    }
}

/// One enumerated GPU and everything the negotiator needs to judge it.
///
/// `H` is the driver's physical-device handle; it is non-owning.
#[derive(Clone, Debug)]
pub struct PhysicalDeviceCandidate<H> {
    pub handle: H,
    pub name: String,
    pub api_version: ApiVersion,
    pub queue_families: Vec<QueueFamily>,
    pub extensions: BTreeSet<String>,
    pub features: BTreeSet<DeviceFeature>,
}

impl<H> PhysicalDeviceCandidate<H> {
    /// First family in enumeration order that accepts graphics submission.
    pub fn graphics_queue_family(&self) -> Option<u32> {
        self.queue_families
            .iter()
            .find(|qf| qf.capabilities.contains(QueueCapabilities::GRAPHICS))
            .map(|qf| qf.index)
    }
}
