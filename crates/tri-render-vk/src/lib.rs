// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::ffi::{c_char, CStr, CString};

use tracing::debug;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tri_render::{
  BootstrapError, DeviceDesc, DiagnosticsSink, Driver, InstanceDesc, PhysicalDeviceCandidate,
};

use ash::{vk, Entry};
use ash::ext::debug_utils;
use ash::khr::surface;

mod debug;
mod features;
mod query;

use features::FeatureChain;

pub use ash;

/// A live `VkInstance` plus the instance-level loaders hanging off it.
pub struct VkInstance {
  handle: ash::Instance,
  surface_loader: surface::Instance,
  debug_utils: Option<debug_utils::Instance>,
  // Target of the messenger chained into vkCreateInstance; the driver may
  // still use it inside vkDestroyInstance.
  _creation_sink: Option<Box<DiagnosticsSink>>,
}

impl VkInstance {
  pub fn ash_instance(&self) -> &ash::Instance {
    &self.handle
  }
}

pub struct VkMessenger {
  handle: vk::DebugUtilsMessengerEXT,
  _sink: Box<DiagnosticsSink>,
}

/// The ash backend. Stateless: everything it creates is handed back to the
/// bootstrap, which decides when it dies.
#[derive(Debug, Default)]
pub struct VkDriver;

fn to_cstrings(
  names: &[String],
  err: fn(String) -> BootstrapError,
) -> Result<Vec<CString>, BootstrapError> {
  names
    .iter()
    .map(|n| CString::new(n.as_str()).map_err(|_| err(format!("name {n:?} contains NUL"))))
    .collect()
}

fn pointers(names: &[CString]) -> Vec<*const c_char> {
  names.iter().map(|n| n.as_ptr()).collect()
}

impl Driver for VkDriver {
  type Context = Entry;
  type Instance = VkInstance;
  type Messenger = VkMessenger;
  type Surface = vk::SurfaceKHR;
  type PhysicalDevice = vk::PhysicalDevice;
  type Device = ash::Device;
  type Queue = vk::Queue;

  fn create_context(&mut self) -> Result<Entry, BootstrapError> {
    // SAFETY: loading the system loader runs its initialisers; there is no
    // way to vouch for those beyond trusting the installed driver.
    let entry = unsafe { Entry::load() }
      .map_err(|e| BootstrapError::HostEnvironment(e.to_string()))?;
    // SAFETY: entry is loaded.
    if let Ok(Some(raw)) = unsafe { entry.try_enumerate_instance_version() } {
      debug!("Loader supports Vulkan {}", tri_render::ApiVersion::from_raw(raw));
    }
    Ok(entry)
  }

  fn instance_layers(&self, context: &Entry) -> Result<Vec<String>, BootstrapError> {
    query::instance_layers(context)
  }

  fn instance_extensions(&self, context: &Entry) -> Result<Vec<String>, BootstrapError> {
    query::instance_extensions(context)
  }

  fn create_instance(
    &mut self,
    context: &Entry,
    desc: InstanceDesc<'_>,
  ) -> Result<VkInstance, BootstrapError> {
    let app_name = CString::new(desc.app.name.as_str())
      .map_err(|_| BootstrapError::InstanceCreation("application name contains NUL".into()))?;
    let engine_name = CString::new(desc.app.engine_name.as_str())
      .map_err(|_| BootstrapError::InstanceCreation("engine name contains NUL".into()))?;
    let layers = to_cstrings(desc.layers, BootstrapError::InstanceCreation)?;
    let extensions = to_cstrings(desc.extensions, BootstrapError::InstanceCreation)?;
    let layer_ptrs = pointers(&layers);
    let ext_ptrs = pointers(&extensions);

    let app_info = vk::ApplicationInfo {
      s_type: vk::StructureType::APPLICATION_INFO,
      p_application_name: app_name.as_ptr(),
      application_version: desc.app.version.to_raw(),
      p_engine_name: engine_name.as_ptr(),
      engine_version: desc.app.engine_version.to_raw(),
      api_version: desc.api_version.to_raw(),
      ..Default::default()
    };

    let creation_sink = desc.diagnostics.map(Box::new);
    let mut debug_info = creation_sink.as_deref().map(debug::messenger_create_info);

    let mut create_info = vk::InstanceCreateInfo::default()
      .application_info(&app_info)
      .enabled_layer_names(&layer_ptrs)
      .enabled_extension_names(&ext_ptrs);
    if let Some(info) = debug_info.as_mut() {
      create_info = create_info.push_next(info);
    }

    // SAFETY: every pointer in create_info outlives the call.
    let handle = unsafe { context.create_instance(&create_info, None) }
      .map_err(|e| BootstrapError::InstanceCreation(e.to_string()))?;

    let surface_loader = surface::Instance::new(context, &handle);
    let debug_utils = creation_sink
      .is_some()
      .then(|| debug_utils::Instance::new(context, &handle));

    Ok(VkInstance {
      handle,
      surface_loader,
      debug_utils,
      _creation_sink: creation_sink,
    })
  }

  fn create_messenger(
    &mut self,
    _context: &Entry,
    instance: &VkInstance,
    sink: DiagnosticsSink,
  ) -> Result<VkMessenger, BootstrapError> {
    let loader = instance.debug_utils.as_ref().ok_or_else(|| {
      BootstrapError::DiagnosticsSetup("instance was created without VK_EXT_debug_utils".into())
    })?;
    let sink = Box::new(sink);
    let info = debug::messenger_create_info(&sink);
    // SAFETY: info points at the boxed sink, which the messenger keeps alive.
    let handle = unsafe { loader.create_debug_utils_messenger(&info, None) }
      .map_err(|e| BootstrapError::DiagnosticsSetup(e.to_string()))?;
    Ok(VkMessenger { handle, _sink: sink })
  }

  fn physical_devices(
    &self,
    instance: &VkInstance,
  ) -> Result<Vec<PhysicalDeviceCandidate<vk::PhysicalDevice>>, BootstrapError> {
    query::physical_devices(&instance.handle)
  }

  fn create_device(
    &mut self,
    instance: &VkInstance,
    desc: DeviceDesc<'_, vk::PhysicalDevice>,
  ) -> Result<ash::Device, BootstrapError> {
    let priorities = [desc.queue_priority];
    let queue_info = vk::DeviceQueueCreateInfo::default()
      .queue_family_index(desc.queue_family)
      .queue_priorities(&priorities);

    let extensions = to_cstrings(desc.extensions, BootstrapError::DeviceCreation)?;
    let ext_ptrs = pointers(&extensions);

    let mut chain = FeatureChain::enabling(desc.features);
    let mut features2 = chain.head();
    let dinfo = vk::DeviceCreateInfo::default()
      .queue_create_infos(std::slice::from_ref(&queue_info))
      .enabled_extension_names(&ext_ptrs)
      .push_next(&mut features2);

    // SAFETY: physical_device came from this instance; dinfo's pointers
    // outlive the call.
    unsafe { instance.handle.create_device(desc.physical_device, &dinfo, None) }
      .map_err(|e| BootstrapError::DeviceCreation(e.to_string()))
  }

  fn device_queue(&self, device: &ash::Device, family: u32, index: u32) -> vk::Queue {
    // SAFETY: the device was created with one queue in `family`.
    unsafe { device.get_device_queue(family, index) }
  }

  fn destroy_device(&mut self, device: ash::Device) {
    // SAFETY: the queue handed out by device_queue is dropped first, and the
    // wait leaves no work in flight.
    unsafe {
      device.device_wait_idle().ok();
      device.destroy_device(None);
    }
  }

  fn destroy_surface(&mut self, instance: &VkInstance, surface: vk::SurfaceKHR) {
    // SAFETY: the device is gone, so no swapchain can reference the surface;
    // the instance that made it is still alive.
    unsafe { instance.surface_loader.destroy_surface(surface, None) };
  }

  fn destroy_messenger(&mut self, instance: &VkInstance, messenger: VkMessenger) {
    if let Some(loader) = &instance.debug_utils {
      // SAFETY: the handle came from this loader and is destroyed once; the
      // boxed sink it points at drops after the call.
      unsafe { loader.destroy_debug_utils_messenger(messenger.handle, None) };
    }
  }

  fn destroy_instance(&mut self, instance: VkInstance) {
    // SAFETY: every child (device, surface, messenger) is already destroyed.
    unsafe { instance.handle.destroy_instance(None) };
  }

  fn destroy_context(&mut self, context: Entry) {
    drop(context);
  }
}

/// Instance extensions needed to make surfaces on `display`.
pub fn required_surface_extensions(
  display: RawDisplayHandle,
) -> Result<Vec<String>, BootstrapError> {
  let names = ash_window::enumerate_required_extensions(display)
    .map_err(|e| BootstrapError::PlatformInit(format!("unsupported display: {e}")))?;
  Ok(
    names
      .iter()
      // SAFETY: ash_window hands out static NUL-terminated names.
      .map(|&p| unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
      .collect(),
  )
}

pub fn create_surface(
  entry: &Entry,
  instance: &VkInstance,
  display: RawDisplayHandle,
  window: RawWindowHandle,
) -> Result<vk::SurfaceKHR, BootstrapError> {
  // SAFETY: both raw handles come from a live window that outlives the
  // surface; teardown destroys the surface first.
  unsafe { ash_window::create_surface(entry, &instance.handle, display, window, None) }
    .map_err(|e| BootstrapError::SurfaceCreation(e.to_string()))
}
