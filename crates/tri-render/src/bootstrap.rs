// SPDX-License-Identifier: CEPL-1.0
//! The execution-context builder and its teardown sequencer.
//!
//! [`Bootstrap`] walks [`Stage`] strictly forward, parking each handle in
//! [`ExecutionContext`] as soon as it exists. Teardown walks the same slots
//! backwards and only releases what is there, so it is safe to run after a
//! failure at any stage, and running it twice is a no-op. `Drop` runs it as
//! well, so an early return or panic cannot leak the chain.

use tracing::{debug, error, info};

use crate::caps::PhysicalDeviceCandidate;
use crate::diagnostics::{self, DiagnosticMessage, DiagnosticsReceiver, DiagnosticsSink};
use crate::driver::{DeviceDesc, Driver, InstanceDesc, SurfaceProvider, WindowDesc};
use crate::error::BootstrapError;
use crate::negotiate;
use crate::requirements::{AppInfo, RequirementSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Uninitialized,
    PlatformReady,
    ContextCreated,
    InstanceCreated,
    DiagnosticsAttached,
    SurfaceCreated,
    DeviceSelected,
    LogicalDeviceCreated,
    Running,
    TearingDown,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsQueue<Q> {
    pub handle: Q,
    pub family: u32,
    pub index: u32,
}

/// The owned handle chain, in construction order.
pub struct ExecutionContext<W, D: Driver> {
    window: Option<W>,
    context: Option<D::Context>,
    instance: Option<D::Instance>,
    messenger: Option<D::Messenger>,
    surface: Option<D::Surface>,
    physical_device: Option<PhysicalDeviceCandidate<D::PhysicalDevice>>,
    device: Option<D::Device>,
    queue: Option<GraphicsQueue<D::Queue>>,
}

impl<W, D: Driver> ExecutionContext<W, D> {
    fn empty() -> Self {
        Self {
            window: None,
            context: None,
            instance: None,
            messenger: None,
            surface: None,
            physical_device: None,
            device: None,
            queue: None,
        }
    }

    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    pub fn context(&self) -> Option<&D::Context> {
        self.context.as_ref()
    }

    pub fn instance(&self) -> Option<&D::Instance> {
        self.instance.as_ref()
    }

    pub fn has_messenger(&self) -> bool {
        self.messenger.is_some()
    }

    pub fn surface(&self) -> Option<&D::Surface> {
        self.surface.as_ref()
    }

    pub fn physical_device(&self) -> Option<&PhysicalDeviceCandidate<D::PhysicalDevice>> {
        self.physical_device.as_ref()
    }

    pub fn device(&self) -> Option<&D::Device> {
        self.device.as_ref()
    }

    pub fn queue(&self) -> Option<GraphicsQueue<D::Queue>> {
        self.queue
    }
}

#[derive(Clone, Debug, Default)]
pub struct BootstrapSettings {
    pub app: AppInfo,
    pub window: WindowDesc,
}

struct Diagnostics {
    sink: DiagnosticsSink,
    receiver: DiagnosticsReceiver,
}

pub struct Bootstrap<P, D>
where
    P: SurfaceProvider<D>,
    D: Driver,
{
    platform: P,
    driver: D,
    settings: BootstrapSettings,
    requirements: RequirementSet,
    stage: Stage,
    chain: ExecutionContext<P::Window, D>,
    diagnostics: Option<Diagnostics>,
}

fn missing(stage: Stage, detail: &'static str) -> BootstrapError {
    BootstrapError::OutOfOrder { stage, detail }
}

impl<P, D> Bootstrap<P, D>
where
    P: SurfaceProvider<D>,
    D: Driver,
{
    pub fn new(
        platform: P,
        driver: D,
        settings: BootstrapSettings,
        requirements: RequirementSet,
    ) -> Self {
        Self {
            platform,
            driver,
            settings,
            requirements,
            stage: Stage::Uninitialized,
            chain: ExecutionContext::empty(),
            diagnostics: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }

    pub fn execution_context(&self) -> &ExecutionContext<P::Window, D> {
        &self.chain
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Runs every stage up to [`Stage::Running`]. On error the stage stays at
    /// the last one that completed; call [`teardown`](Self::teardown) (or
    /// drop) to release what was built.
    pub fn initialize(&mut self) -> Result<(), BootstrapError> {
        if self.stage != Stage::Uninitialized {
            return Err(missing(self.stage, "initialize may only run once"));
        }

        let result = self.build_chain();
        self.drain_diagnostics();
        match &result {
            Ok(()) => self.advance(Stage::Running),
            Err(e) => error!("Bootstrap aborted after {:?}: {e}", self.stage),
        }
        result
    }

    fn build_chain(&mut self) -> Result<(), BootstrapError> {
        self.acquire_platform()?;
        self.create_context()?;
        self.create_instance()?;
        if self.requirements.diagnostics_enabled() {
            self.attach_diagnostics()?;
        }
        self.create_surface()?;
        self.select_device()?;
        self.create_logical_device()
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "{:?} -> {:?}", self.stage, next);
        info!("{:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn acquire_platform(&mut self) -> Result<(), BootstrapError> {
        let window = self.platform.create_window(&self.settings.window)?;
        self.chain.window = Some(window);
        self.advance(Stage::PlatformReady);
        Ok(())
    }

    fn create_context(&mut self) -> Result<(), BootstrapError> {
        let context = self.driver.create_context()?;
        self.chain.context = Some(context);
        self.advance(Stage::ContextCreated);
        Ok(())
    }

    fn create_instance(&mut self) -> Result<(), BootstrapError> {
        let stage = self.stage;
        let context = self
            .chain
            .context
            .as_ref()
            .ok_or_else(|| missing(stage, "instance needs a context"))?;

        let layers = self.driver.instance_layers(context)?;
        debug!("Available instance layers: {layers:?}");
        negotiate::match_layers(self.requirements.layers(), &layers)?;

        let extensions = self.driver.instance_extensions(context)?;
        debug!("Available instance extensions: {extensions:?}");
        negotiate::match_instance_extensions(self.requirements.instance_extensions(), &extensions)?;

        let sink = if self.requirements.diagnostics_enabled() {
            let (sink, receiver) = diagnostics::channel();
            self.diagnostics = Some(Diagnostics {
                sink: sink.clone(),
                receiver,
            });
            Some(sink)
        } else {
            None
        };

        let desc = InstanceDesc {
            app: &self.settings.app,
            api_version: self.requirements.min_api_version(),
            layers: self.requirements.layers(),
            extensions: self.requirements.instance_extensions(),
            diagnostics: sink,
        };
        let instance = self.driver.create_instance(context, desc)?;
        self.chain.instance = Some(instance);
        self.advance(Stage::InstanceCreated);
        Ok(())
    }

    fn attach_diagnostics(&mut self) -> Result<(), BootstrapError> {
        let stage = self.stage;
        let sink = match &self.diagnostics {
            Some(diag) => diag.sink.clone(),
            None => return Err(missing(stage, "diagnostics channel was never opened")),
        };
        let (Some(context), Some(instance)) = (&self.chain.context, &self.chain.instance) else {
            return Err(missing(stage, "messenger needs an instance"));
        };
        let messenger = self.driver.create_messenger(context, instance, sink)?;
        self.chain.messenger = Some(messenger);
        self.advance(Stage::DiagnosticsAttached);
        Ok(())
    }

    fn create_surface(&mut self) -> Result<(), BootstrapError> {
        let stage = self.stage;
        let (Some(window), Some(context), Some(instance)) =
            (&self.chain.window, &self.chain.context, &self.chain.instance)
        else {
            return Err(missing(stage, "surface needs a window and an instance"));
        };
        let surface = self
            .platform
            .create_surface(&self.driver, context, instance, window)?;
        self.chain.surface = Some(surface);
        self.advance(Stage::SurfaceCreated);
        Ok(())
    }

    fn select_device(&mut self) -> Result<(), BootstrapError> {
        let stage = self.stage;
        let instance = self
            .chain
            .instance
            .as_ref()
            .ok_or_else(|| missing(stage, "device selection needs an instance"))?;

        let candidates = self.driver.physical_devices(instance)?;
        for candidate in &candidates {
            debug!(
                "Found {:?}: api {}, {} queue families, {} extensions",
                candidate.name,
                candidate.api_version,
                candidate.queue_families.len(),
                candidate.extensions.len()
            );
        }
        let chosen = negotiate::select_physical_device(candidates, &self.requirements)?;
        info!(
            "Selected physical device {:?} (api {})",
            chosen.name, chosen.api_version
        );
        self.chain.physical_device = Some(chosen);
        self.advance(Stage::DeviceSelected);
        Ok(())
    }

    fn create_logical_device(&mut self) -> Result<(), BootstrapError> {
        let stage = self.stage;
        let (Some(instance), Some(physical)) = (&self.chain.instance, &self.chain.physical_device)
        else {
            return Err(missing(stage, "logical device needs a selected physical device"));
        };

        // Selection already checked this; only a broken driver gets here.
        let family = physical.graphics_queue_family().ok_or_else(|| {
            BootstrapError::DeviceCreation(format!(
                "{:?} lost its graphics queue family",
                physical.name
            ))
        })?;

        let desc = DeviceDesc {
            physical_device: physical.handle,
            queue_family: family,
            queue_priority: 1.0,
            extensions: self.requirements.device_extensions(),
            features: self.requirements.device_features(),
        };
        let device = self.driver.create_device(instance, desc)?;
        let queue = self.driver.device_queue(&device, family, 0);
        debug!("Graphics queue {queue:?} from family {family}");

        self.chain.device = Some(device);
        self.chain.queue = Some(GraphicsQueue {
            handle: queue,
            family,
            index: 0,
        });
        self.advance(Stage::LogicalDeviceCreated);
        Ok(())
    }

    pub fn poll_events(&mut self) {
        self.platform.poll_events();
        self.drain_diagnostics();
    }

    /// `true` once the platform reported a close, or when there is no window
    /// to keep running for.
    pub fn should_terminate(&self) -> bool {
        match &self.chain.window {
            Some(window) => self.platform.should_close(window),
            None => true,
        }
    }

    /// Polls until the window asks to close. No per-frame work happens here.
    pub fn run(&mut self) -> Result<(), BootstrapError> {
        if self.stage != Stage::Running {
            return Err(missing(self.stage, "run needs a completed bootstrap"));
        }
        while !self.should_terminate() {
            self.poll_events();
        }
        info!("Close requested");
        Ok(())
    }

    /// Hands back everything the driver reported since the last drain;
    /// warnings and errors are logged on the way.
    pub fn drain_diagnostics(&self) -> Vec<DiagnosticMessage> {
        match &self.diagnostics {
            Some(diag) => diag.receiver.drain(),
            None => Vec::new(),
        }
    }

    /// Releases the chain in reverse construction order. Slots that were
    /// never filled are skipped.
    pub fn teardown(&mut self) {
        if self.stage == Stage::Terminated {
            return;
        }
        info!("{:?} -> {:?}", self.stage, Stage::TearingDown);
        self.stage = Stage::TearingDown;

        // Owned by the device.
        self.chain.queue = None;

        if let Some(device) = self.chain.device.take() {
            debug!("Destroying logical device");
            self.driver.destroy_device(device);
        }

        // Non-owning.
        self.chain.physical_device = None;

        if let Some(surface) = self.chain.surface.take() {
            match &self.chain.instance {
                Some(instance) => {
                    debug!("Destroying surface");
                    self.driver.destroy_surface(instance, surface);
                }
                None => error!("Surface outlived its instance; leaking it"),
            }
        }

        if let Some(messenger) = self.chain.messenger.take() {
            match &self.chain.instance {
                Some(instance) => {
                    debug!("Destroying debug messenger");
                    self.driver.destroy_messenger(instance, messenger);
                }
                None => error!("Debug messenger outlived its instance; leaking it"),
            }
        }

        self.drain_diagnostics();

        if let Some(instance) = self.chain.instance.take() {
            debug!("Destroying instance");
            self.driver.destroy_instance(instance);
        }

        // Instance destruction may still report through the chained messenger.
        self.drain_diagnostics();
        self.diagnostics = None;

        if let Some(context) = self.chain.context.take() {
            debug!("Unloading graphics context");
            self.driver.destroy_context(context);
        }

        if let Some(window) = self.chain.window.take() {
            debug!("Destroying window");
            self.platform.destroy_window(window);
        }

        info!("{:?} -> {:?}", self.stage, Stage::Terminated);
        self.stage = Stage::Terminated;
    }
}

impl<P, D> Drop for Bootstrap<P, D>
where
    P: SurfaceProvider<D>,
    D: Driver,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
