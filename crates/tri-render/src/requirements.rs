// SPDX-License-Identifier: CEPL-1.0
use crate::caps::DeviceFeature;
use crate::version::ApiVersion;

pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";
pub const DEBUG_UTILS_EXTENSION: &str = "VK_EXT_debug_utils";
pub const SWAPCHAIN_EXTENSION: &str = "VK_KHR_swapchain";
pub const EXTENDED_DYNAMIC_STATE_EXTENSION: &str = "VK_EXT_extended_dynamic_state";

/// Application metadata handed to the driver at instance creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: ApiVersion,
    pub engine_name: String,
    pub engine_version: ApiVersion,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Vulkan Triangle".to_owned(),
            version: ApiVersion::new(0, 1, 0, 0),
            engine_name: "No Engine".to_owned(),
            engine_version: ApiVersion::new(0, 1, 0, 0),
        }
    }
}

/// Everything the application insists on before it will touch a device.
///
/// Built once at startup and never mutated; the builder and negotiator only
/// ever see it by shared reference. Lists keep their declaration order so a
/// failed match can name the first unmet entry deterministically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequirementSet {
    layers: Vec<String>,
    instance_extensions: Vec<String>,
    device_extensions: Vec<String>,
    device_features: Vec<DeviceFeature>,
    min_api_version: ApiVersion,
    diagnostics: bool,
}

impl RequirementSet {
    /// The triangle's requirement set on top of what the platform needs for
    /// surfaces. `diagnostics` adds the validation layer and debug-utils
    /// extension.
    pub fn new<I, S>(platform_extensions: I, diagnostics: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut instance_extensions = Vec::new();
        for ext in platform_extensions {
            push_unique(&mut instance_extensions, ext.into());
        }
        let mut layers = Vec::new();
        if diagnostics {
            layers.push(VALIDATION_LAYER.to_owned());
            push_unique(&mut instance_extensions, DEBUG_UTILS_EXTENSION.to_owned());
        }

        Self {
            layers,
            instance_extensions,
            device_extensions: vec![
                SWAPCHAIN_EXTENSION.to_owned(),
                EXTENDED_DYNAMIC_STATE_EXTENSION.to_owned(),
            ],
            device_features: vec![
                DeviceFeature::DynamicRendering,
                DeviceFeature::ExtendedDynamicState,
            ],
            min_api_version: ApiVersion::V1_3,
            diagnostics,
        }
    }

    /// Replace the device-level requirements. Mostly useful for tests and
    /// tools that probe for something other than the triangle's needs.
    pub fn with_device_requirements<E, S>(
        mut self,
        extensions: E,
        features: impl IntoIterator<Item = DeviceFeature>,
        min_api_version: ApiVersion,
    ) -> Self
    where
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.device_extensions.clear();
        for ext in extensions {
            push_unique(&mut self.device_extensions, ext.into());
        }
        self.device_features.clear();
        for feature in features {
            if !self.device_features.contains(&feature) {
                self.device_features.push(feature);
            }
        }
        self.min_api_version = min_api_version;
        self
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn instance_extensions(&self) -> &[String] {
        &self.instance_extensions
    }

    pub fn device_extensions(&self) -> &[String] {
        &self.device_extensions
    }

    pub fn device_features(&self) -> &[DeviceFeature] {
        &self.device_features
    }

    pub fn min_api_version(&self) -> ApiVersion {
        self.min_api_version
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}
