// SPDX-License-Identifier: CEPL-1.0
//! The two collaborators the bootstrap drives: a graphics [`Driver`] and a
//! windowing [`Platform`].
//!
//! Handles are associated types and are moved back into the owner to be
//! released, so the bootstrap decides the order and nothing else can keep a
//! handle past its window.

use crate::caps::{DeviceFeature, PhysicalDeviceCandidate};
use crate::diagnostics::DiagnosticsSink;
use crate::error::BootstrapError;
use crate::requirements::AppInfo;
use crate::version::ApiVersion;

pub struct InstanceDesc<'a> {
    pub app: &'a AppInfo,
    pub api_version: ApiVersion,
    pub layers: &'a [String],
    pub extensions: &'a [String],
    /// Present when diagnostics are on; messages raised while the instance
    /// itself is created or destroyed go here.
    pub diagnostics: Option<DiagnosticsSink>,
}

pub struct DeviceDesc<'a, H> {
    pub physical_device: H,
    pub queue_family: u32,
    pub queue_priority: f32,
    pub extensions: &'a [String],
    pub features: &'a [DeviceFeature],
}

pub trait Driver {
    /// Loaded entry points / dispatch table.
    type Context;
    type Instance;
    type Messenger;
    type Surface;
    type PhysicalDevice: Copy + std::fmt::Debug;
    type Device;
    type Queue: Copy + std::fmt::Debug;

    /// Fails with [`BootstrapError::HostEnvironment`] when no loader exists.
    fn create_context(&mut self) -> Result<Self::Context, BootstrapError>;

    fn instance_layers(&self, context: &Self::Context) -> Result<Vec<String>, BootstrapError>;

    fn instance_extensions(&self, context: &Self::Context)
        -> Result<Vec<String>, BootstrapError>;

    fn create_instance(
        &mut self,
        context: &Self::Context,
        desc: InstanceDesc<'_>,
    ) -> Result<Self::Instance, BootstrapError>;

    fn create_messenger(
        &mut self,
        context: &Self::Context,
        instance: &Self::Instance,
        sink: DiagnosticsSink,
    ) -> Result<Self::Messenger, BootstrapError>;

    fn physical_devices(
        &self,
        instance: &Self::Instance,
    ) -> Result<Vec<PhysicalDeviceCandidate<Self::PhysicalDevice>>, BootstrapError>;

    fn create_device(
        &mut self,
        instance: &Self::Instance,
        desc: DeviceDesc<'_, Self::PhysicalDevice>,
    ) -> Result<Self::Device, BootstrapError>;

    /// Queues are owned by their device and are never released on their own.
    fn device_queue(&self, device: &Self::Device, family: u32, index: u32) -> Self::Queue;

    fn destroy_device(&mut self, device: Self::Device);
    fn destroy_surface(&mut self, instance: &Self::Instance, surface: Self::Surface);
    fn destroy_messenger(&mut self, instance: &Self::Instance, messenger: Self::Messenger);
    fn destroy_instance(&mut self, instance: Self::Instance);
    fn destroy_context(&mut self, context: Self::Context);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowDesc {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowDesc {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Vulkan Triangle".to_owned(),
        }
    }
}

/// The narrow windowing contract.
pub trait Platform {
    type Window;

    fn create_window(&mut self, desc: &WindowDesc) -> Result<Self::Window, BootstrapError>;

    /// Instance extensions the platform needs to create surfaces.
    fn required_instance_extensions(&self) -> Result<Vec<String>, BootstrapError>;

    fn poll_events(&mut self);

    /// Latched: once a close was requested this keeps returning `true`.
    fn should_close(&self, window: &Self::Window) -> bool;

    fn destroy_window(&mut self, window: Self::Window);
}

/// Surface creation, which needs both sides.
pub trait SurfaceProvider<D: Driver>: Platform {
    fn create_surface(
        &self,
        driver: &D,
        context: &D::Context,
        instance: &D::Instance,
        window: &Self::Window,
    ) -> Result<D::Surface, BootstrapError>;
}
