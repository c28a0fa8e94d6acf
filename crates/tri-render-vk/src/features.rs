// SPDX-License-Identifier: CEPL-1.0
//! The `pNext` feature chain shared by the device query and device creation:
//! `Features2 -> Vulkan13 -> ExtendedDynamicState`, with each link present
//! only when it carries something.

use std::collections::BTreeSet;

use ash::vk;
use tri_render::DeviceFeature;

#[derive(Default)]
pub(crate) struct FeatureChain {
  vk13: Option<vk::PhysicalDeviceVulkan13Features<'static>>,
  eds: Option<vk::PhysicalDeviceExtendedDynamicStateFeaturesEXT<'static>>,
}

impl FeatureChain {
  /// A chain that turns on exactly `features` and nothing else.
  pub(crate) fn enabling(features: &[DeviceFeature]) -> Self {
    let mut chain = Self::default();
    for feature in features {
      match feature {
        DeviceFeature::DynamicRendering => {
          chain.vk13.get_or_insert_with(Default::default).dynamic_rendering = vk::TRUE
        }
        DeviceFeature::ExtendedDynamicState => {
          chain.eds.get_or_insert_with(Default::default).extended_dynamic_state = vk::TRUE
        }
      }
    }
    chain
  }

  /// Zeroed links for a features query; only include structs the device
  /// understands.
  pub(crate) fn querying(vk13: bool, eds: bool) -> Self {
    Self {
      vk13: vk13.then(Default::default),
      eds: eds.then(Default::default),
    }
  }

  /// The chain head. The links stay borrowed until it is dropped.
  pub(crate) fn head(&mut self) -> vk::PhysicalDeviceFeatures2<'_> {
    let mut head = vk::PhysicalDeviceFeatures2::default();
    // push_next inserts right after the head, so the tail goes in first.
    if let Some(eds) = self.eds.as_mut() {
      head = head.push_next(eds);
    }
    if let Some(vk13) = self.vk13.as_mut() {
      head = head.push_next(vk13);
    }
    head
  }

  /// Features whose flag is set in the chain.
  pub(crate) fn enabled(&self) -> BTreeSet<DeviceFeature> {
    let mut found = BTreeSet::new();
    if self.vk13.is_some_and(|f| f.dynamic_rendering == vk::TRUE) {
      found.insert(DeviceFeature::DynamicRendering);
    }
    if self.eds.is_some_and(|f| f.extended_dynamic_state == vk::TRUE) {
      found.insert(DeviceFeature::ExtendedDynamicState);
    }
    found
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn links(head: &vk::PhysicalDeviceFeatures2<'_>) -> Vec<vk::StructureType> {
    let mut out = vec![head.s_type];
    let mut next = head.p_next.cast::<vk::BaseOutStructure<'_>>().cast_const();
    while !next.is_null() {
      // SAFETY: every link was pushed by FeatureChain::head and is still
      // borrowed by `head`.
      unsafe {
        out.push((*next).s_type);
        next = (*next).p_next.cast_const();
      }
    }
    out
  }

  #[test]
  fn both_features_build_the_full_chain_in_order() {
    let mut chain = FeatureChain::enabling(&[
      DeviceFeature::DynamicRendering,
      DeviceFeature::ExtendedDynamicState,
    ]);
    let head = chain.head();
    assert_eq!(
      links(&head),
      [
        vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
        vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_3_FEATURES,
        vk::StructureType::PHYSICAL_DEVICE_EXTENDED_DYNAMIC_STATE_FEATURES_EXT,
      ]
    );
    assert_eq!(
      chain.enabled(),
      BTreeSet::from([DeviceFeature::DynamicRendering, DeviceFeature::ExtendedDynamicState])
    );
  }

  #[test]
  fn dynamic_rendering_sets_only_its_flag() {
    let mut chain = FeatureChain::enabling(&[DeviceFeature::DynamicRendering]);
    let head = chain.head();
    assert_eq!(
      links(&head),
      [
        vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
        vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_3_FEATURES,
      ]
    );

    let vk13 = chain.vk13.unwrap();
    assert_eq!(vk13.dynamic_rendering, vk::TRUE);
    assert_eq!(vk13.synchronization2, vk::FALSE);
    assert_eq!(vk13.maintenance4, vk::FALSE);
    assert!(chain.eds.is_none());
  }

  #[test]
  fn extended_dynamic_state_alone_skips_the_vulkan13_link() {
    let mut chain = FeatureChain::enabling(&[DeviceFeature::ExtendedDynamicState]);
    let head = chain.head();
    assert_eq!(
      links(&head),
      [
        vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
        vk::StructureType::PHYSICAL_DEVICE_EXTENDED_DYNAMIC_STATE_FEATURES_EXT,
      ]
    );
    assert_eq!(head.features.geometry_shader, vk::FALSE);

    assert!(chain.vk13.is_none());
    assert_eq!(chain.eds.unwrap().extended_dynamic_state, vk::TRUE);
    assert_eq!(chain.enabled(), BTreeSet::from([DeviceFeature::ExtendedDynamicState]));
  }

  #[test]
  fn no_features_is_a_bare_head() {
    let mut chain = FeatureChain::enabling(&[]);
    assert_eq!(links(&chain.head()), [vk::StructureType::PHYSICAL_DEVICE_FEATURES_2]);
    assert!(chain.enabled().is_empty());
  }

  #[test]
  fn query_chain_starts_zeroed() {
    let mut chain = FeatureChain::querying(true, true);
    assert_eq!(links(&chain.head()).len(), 3);
    assert!(chain.enabled().is_empty());

    let mut chain = FeatureChain::querying(false, true);
    assert_eq!(
      links(&chain.head()),
      [
        vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
        vk::StructureType::PHYSICAL_DEVICE_EXTENDED_DYNAMIC_STATE_FEATURES_EXT,
      ]
    );
  }
}
