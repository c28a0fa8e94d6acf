// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeSet;
use std::ffi::CStr;

use ash::vk;
use tracing::debug;

use crate::features::FeatureChain;
use tri_render::requirements::EXTENDED_DYNAMIC_STATE_EXTENSION;
use tri_render::{
  ApiVersion, BootstrapError, DeviceFeature, PhysicalDeviceCandidate, QueueCapabilities,
  QueueFamily,
};

pub(crate) fn query_err(what: &'static str) -> impl Fn(vk::Result) -> BootstrapError {
  move |e| BootstrapError::CapabilityQuery { what, reason: e.to_string() }
}

fn owned(name: &CStr) -> String {
  name.to_string_lossy().into_owned()
}

pub(crate) fn instance_layers(entry: &ash::Entry) -> Result<Vec<String>, BootstrapError> {
  // SAFETY: entry is a loaded loader; no further preconditions.
  let props = unsafe { entry.enumerate_instance_layer_properties() }
    .map_err(query_err("instance layers"))?;
  Ok(props.iter().filter_map(|p| p.layer_name_as_c_str().ok()).map(owned).collect())
}

pub(crate) fn instance_extensions(entry: &ash::Entry) -> Result<Vec<String>, BootstrapError> {
  // SAFETY: None queries the implementation's own extensions.
  let props = unsafe { entry.enumerate_instance_extension_properties(None) }
    .map_err(query_err("instance extensions"))?;
  Ok(props.iter().filter_map(|p| p.extension_name_as_c_str().ok()).map(owned).collect())
}

pub(crate) fn physical_devices(
  instance: &ash::Instance,
) -> Result<Vec<PhysicalDeviceCandidate<vk::PhysicalDevice>>, BootstrapError> {
  // SAFETY: instance is live for the duration of the call.
  let handles = unsafe { instance.enumerate_physical_devices() }
    .map_err(query_err("physical devices"))?;
  handles.into_iter().map(|phys| describe(instance, phys)).collect()
}

fn describe(
  instance: &ash::Instance,
  phys: vk::PhysicalDevice,
) -> Result<PhysicalDeviceCandidate<vk::PhysicalDevice>, BootstrapError> {
  // SAFETY: phys was enumerated from this instance (applies to every call below).
  let props = unsafe { instance.get_physical_device_properties(phys) };
  let name = props.device_name_as_c_str().map(owned).unwrap_or_else(|_| "unknown".to_owned());
  let api_version = ApiVersion::from_raw(props.api_version);

  let queue_families = unsafe { instance.get_physical_device_queue_family_properties(phys) }
    .iter()
    .enumerate()
    .map(|(i, q)| QueueFamily {
      index: i as u32,
      capabilities: QueueCapabilities::from_bits_truncate(q.queue_flags.as_raw()),
      queue_count: q.queue_count,
    })
    .collect();

  let extensions: BTreeSet<String> =
    unsafe { instance.enumerate_device_extension_properties(phys) }
      .map_err(query_err("device extensions"))?
      .iter()
      .filter_map(|e| e.extension_name_as_c_str().ok())
      .map(owned)
      .collect();

  let features = supported_features(instance, phys, api_version, &extensions);
  debug!("{name:?}: type {:?}, features {features:?}", props.device_type);

  Ok(PhysicalDeviceCandidate {
    handle: phys,
    name,
    api_version,
    queue_families,
    extensions,
    features,
  })
}

/// Walks the feature chain for the structs this device can understand:
/// the 1.3 block only on 1.3 devices, extended dynamic state only when its
/// extension is exposed.
fn supported_features(
  instance: &ash::Instance,
  phys: vk::PhysicalDevice,
  api_version: ApiVersion,
  extensions: &BTreeSet<String>,
) -> BTreeSet<DeviceFeature> {
  if api_version < ApiVersion::V1_1 {
    return BTreeSet::new();
  }

  let mut chain = FeatureChain::querying(
    api_version >= ApiVersion::V1_3,
    extensions.contains(EXTENDED_DYNAMIC_STATE_EXTENSION),
  );
  {
    let mut features2 = chain.head();
    // SAFETY: every struct in the chain is valid for this device.
    unsafe { instance.get_physical_device_features2(phys, &mut features2) };
  }
  chain.enabled()
}
