// SPDX-License-Identifier: CEPL-1.0
//! An instrumented in-memory driver and platform. Every acquisition and
//! release is appended to a shared log so tests can check ordering.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tri_render::requirements::{
    DEBUG_UTILS_EXTENSION, EXTENDED_DYNAMIC_STATE_EXTENSION, SWAPCHAIN_EXTENSION, VALIDATION_LAYER,
};
use tri_render::{
    ApiVersion, BootstrapError, DeviceDesc, DeviceFeature, DiagnosticsSink, Driver, InstanceDesc,
    PhysicalDeviceCandidate, Platform, QueueCapabilities, QueueFamily, SurfaceProvider,
    WindowDesc,
};

pub const SURFACE_EXTENSION: &str = "VK_KHR_surface";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Window,
    Context,
    Instance,
    Messenger,
    Surface,
    Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Acquired(Handle),
    Released(Handle),
}

/// Which step the fake should refuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Window,
    Context,
    Instance,
    Messenger,
    Surface,
    Devices,
    Device,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRequest {
    pub app_name: String,
    pub api_version: ApiVersion,
    pub layers: Vec<String>,
    pub extensions: Vec<String>,
    pub with_diagnostics: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRequest {
    pub physical_device: u32,
    pub queue_family: u32,
    pub queue_priority: f32,
    pub extensions: Vec<String>,
    pub features: Vec<DeviceFeature>,
}

pub struct FakeState {
    pub events: Vec<Event>,
    pub fail: Option<Fail>,
    pub layers: Vec<String>,
    pub extensions: Vec<String>,
    pub devices: Vec<PhysicalDeviceCandidate<u32>>,
    pub messenger_sink: Option<DiagnosticsSink>,
    pub instance_request: Option<InstanceRequest>,
    pub device_request: Option<DeviceRequest>,
    pub polls: usize,
    pub close_after: Option<usize>,
    pub close_requested: bool,
}

#[derive(Clone)]
pub struct Harness {
    pub state: Rc<RefCell<FakeState>>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(FakeState {
                events: Vec::new(),
                fail: None,
                layers: vec![VALIDATION_LAYER.to_owned(), "VK_LAYER_MESA_overlay".to_owned()],
                extensions: vec![SURFACE_EXTENSION.to_owned(), DEBUG_UTILS_EXTENSION.to_owned()],
                devices: vec![good_device(1, "first")],
                messenger_sink: None,
                instance_request: None,
                device_request: None,
                polls: 0,
                close_after: None,
                close_requested: false,
            })),
        }
    }

    pub fn failing_at(fail: Fail) -> Self {
        let harness = Self::new();
        harness.state.borrow_mut().fail = Some(fail);
        harness
    }

    pub fn driver(&self) -> FakeDriver {
        FakeDriver {
            state: Rc::clone(&self.state),
        }
    }

    pub fn platform(&self) -> FakePlatform {
        FakePlatform {
            state: Rc::clone(&self.state),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn acquired(&self) -> Vec<Handle> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Acquired(h) => Some(h),
                Event::Released(_) => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<Handle> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Released(h) => Some(h),
                Event::Acquired(_) => None,
            })
            .collect()
    }
}

pub fn good_device(id: u32, name: &str) -> PhysicalDeviceCandidate<u32> {
    PhysicalDeviceCandidate {
        handle: id,
        name: name.to_owned(),
        api_version: ApiVersion::new(0, 1, 3, 280),
        queue_families: vec![
            QueueFamily {
                index: 0,
                capabilities: QueueCapabilities::TRANSFER,
                queue_count: 2,
            },
            QueueFamily {
                index: 1,
                capabilities: QueueCapabilities::GRAPHICS | QueueCapabilities::COMPUTE,
                queue_count: 16,
            },
        ],
        extensions: BTreeSet::from([
            SWAPCHAIN_EXTENSION.to_owned(),
            EXTENDED_DYNAMIC_STATE_EXTENSION.to_owned(),
        ]),
        features: BTreeSet::from([
            DeviceFeature::DynamicRendering,
            DeviceFeature::ExtendedDynamicState,
        ]),
    }
}

pub struct FakeDriver {
    state: Rc<RefCell<FakeState>>,
}

impl FakeDriver {
    fn fails(&self, step: Fail) -> bool {
        self.state.borrow().fail == Some(step)
    }

    fn log(&self, event: Event) {
        self.state.borrow_mut().events.push(event);
    }
}

#[derive(Debug)]
pub struct FakeContext;
#[derive(Debug)]
pub struct FakeInstance;
#[derive(Debug)]
pub struct FakeMessenger;
#[derive(Debug)]
pub struct FakeSurface;
#[derive(Debug)]
pub struct FakeDevice(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeQueue {
    pub device: u32,
    pub family: u32,
    pub index: u32,
}

impl Driver for FakeDriver {
    type Context = FakeContext;
    type Instance = FakeInstance;
    type Messenger = FakeMessenger;
    type Surface = FakeSurface;
    type PhysicalDevice = u32;
    type Device = FakeDevice;
    type Queue = FakeQueue;

    fn create_context(&mut self) -> Result<FakeContext, BootstrapError> {
        if self.fails(Fail::Context) {
            return Err(BootstrapError::HostEnvironment("no loader".into()));
        }
        self.log(Event::Acquired(Handle::Context));
        Ok(FakeContext)
    }

    fn instance_layers(&self, _context: &FakeContext) -> Result<Vec<String>, BootstrapError> {
        Ok(self.state.borrow().layers.clone())
    }

    fn instance_extensions(&self, _context: &FakeContext) -> Result<Vec<String>, BootstrapError> {
        Ok(self.state.borrow().extensions.clone())
    }

    fn create_instance(
        &mut self,
        _context: &FakeContext,
        desc: InstanceDesc<'_>,
    ) -> Result<FakeInstance, BootstrapError> {
        self.state.borrow_mut().instance_request = Some(InstanceRequest {
            app_name: desc.app.name.clone(),
            api_version: desc.api_version,
            layers: desc.layers.to_vec(),
            extensions: desc.extensions.to_vec(),
            with_diagnostics: desc.diagnostics.is_some(),
        });
        if self.fails(Fail::Instance) {
            return Err(BootstrapError::InstanceCreation("driver said no".into()));
        }
        self.log(Event::Acquired(Handle::Instance));
        Ok(FakeInstance)
    }

    fn create_messenger(
        &mut self,
        _context: &FakeContext,
        _instance: &FakeInstance,
        sink: DiagnosticsSink,
    ) -> Result<FakeMessenger, BootstrapError> {
        if self.fails(Fail::Messenger) {
            return Err(BootstrapError::DiagnosticsSetup("driver said no".into()));
        }
        self.state.borrow_mut().messenger_sink = Some(sink);
        self.log(Event::Acquired(Handle::Messenger));
        Ok(FakeMessenger)
    }

    fn physical_devices(
        &self,
        _instance: &FakeInstance,
    ) -> Result<Vec<PhysicalDeviceCandidate<u32>>, BootstrapError> {
        if self.fails(Fail::Devices) {
            return Err(BootstrapError::CapabilityQuery {
                what: "physical devices",
                reason: "out of host memory".into(),
            });
        }
        Ok(self.state.borrow().devices.clone())
    }

    fn create_device(
        &mut self,
        _instance: &FakeInstance,
        desc: DeviceDesc<'_, u32>,
    ) -> Result<FakeDevice, BootstrapError> {
        self.state.borrow_mut().device_request = Some(DeviceRequest {
            physical_device: desc.physical_device,
            queue_family: desc.queue_family,
            queue_priority: desc.queue_priority,
            extensions: desc.extensions.to_vec(),
            features: desc.features.to_vec(),
        });
        if self.fails(Fail::Device) {
            return Err(BootstrapError::DeviceCreation("driver said no".into()));
        }
        self.log(Event::Acquired(Handle::Device));
        Ok(FakeDevice(desc.physical_device))
    }

    fn device_queue(&self, device: &FakeDevice, family: u32, index: u32) -> FakeQueue {
        FakeQueue {
            device: device.0,
            family,
            index,
        }
    }

    fn destroy_device(&mut self, _device: FakeDevice) {
        self.log(Event::Released(Handle::Device));
    }

    fn destroy_surface(&mut self, _instance: &FakeInstance, _surface: FakeSurface) {
        self.log(Event::Released(Handle::Surface));
    }

    fn destroy_messenger(&mut self, _instance: &FakeInstance, _messenger: FakeMessenger) {
        self.state.borrow_mut().messenger_sink = None;
        self.log(Event::Released(Handle::Messenger));
    }

    fn destroy_instance(&mut self, _instance: FakeInstance) {
        self.log(Event::Released(Handle::Instance));
    }

    fn destroy_context(&mut self, _context: FakeContext) {
        self.log(Event::Released(Handle::Context));
    }
}

pub struct FakePlatform {
    state: Rc<RefCell<FakeState>>,
}

#[derive(Debug)]
pub struct FakeWindow;

impl Platform for FakePlatform {
    type Window = FakeWindow;

    fn create_window(&mut self, _desc: &WindowDesc) -> Result<FakeWindow, BootstrapError> {
        let mut state = self.state.borrow_mut();
        if state.fail == Some(Fail::Window) {
            return Err(BootstrapError::PlatformInit("no display".into()));
        }
        state.events.push(Event::Acquired(Handle::Window));
        Ok(FakeWindow)
    }

    fn required_instance_extensions(&self) -> Result<Vec<String>, BootstrapError> {
        Ok(vec![SURFACE_EXTENSION.to_owned()])
    }

    fn poll_events(&mut self) {
        let mut state = self.state.borrow_mut();
        state.polls += 1;
        if state.close_after.is_some_and(|n| state.polls >= n) {
            state.close_requested = true;
        }
    }

    fn should_close(&self, _window: &FakeWindow) -> bool {
        self.state.borrow().close_requested
    }

    fn destroy_window(&mut self, _window: FakeWindow) {
        self.state
            .borrow_mut()
            .events
            .push(Event::Released(Handle::Window));
    }
}

impl SurfaceProvider<FakeDriver> for FakePlatform {
    fn create_surface(
        &self,
        _driver: &FakeDriver,
        _context: &FakeContext,
        _instance: &FakeInstance,
        _window: &FakeWindow,
    ) -> Result<FakeSurface, BootstrapError> {
        let mut state = self.state.borrow_mut();
        if state.fail == Some(Fail::Surface) {
            return Err(BootstrapError::SurfaceCreation("window went away".into()));
        }
        state.events.push(Event::Acquired(Handle::Surface));
        Ok(FakeSurface)
    }
}
