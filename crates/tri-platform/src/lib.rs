// SPDX-License-Identifier: CEPL-1.0
//! The windowing collaborator, backed by winit.
//!
//! winit wants to own the loop; the bootstrap wants to poll. The pump-events
//! extension bridges the two: each [`Platform::poll_events`] call drains
//! whatever is pending and returns. Windows are opened from inside the
//! handler on the [`ActiveEventLoop`], so [`Platform::create_window`] queues
//! a request and pumps until the handler has served it.

#![deny(unsafe_op_in_unsafe_fn)]
use std::time::Duration;

use tracing::{debug, info};
use tri_render::{BootstrapError, Platform, SurfaceProvider, WindowDesc};
use tri_render_vk::{ash::vk, ash::Entry, VkDriver, VkInstance};

pub use winit;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    raw_window_handle::{HasDisplayHandle, HasWindowHandle},
    window::{Window, WindowAttributes, WindowId},
};

/// Pumps allowed for the handler to open a requested window.
const WINDOW_PUMP_LIMIT: usize = 64;

/// A window request handed from [`Platform::create_window`] to the handler.
struct WindowRequest<W> {
    pending: Option<WindowAttributes>,
    done: Option<Result<W, String>>,
}

impl<W> Default for WindowRequest<W> {
    fn default() -> Self {
        Self {
            pending: None,
            done: None,
        }
    }
}

impl<W> WindowRequest<W> {
    fn submit(&mut self, attrs: WindowAttributes) {
        self.pending = Some(attrs);
        self.done = None;
    }

    /// Runs `open` for a pending request; a no-op otherwise.
    fn serve(&mut self, open: impl FnOnce(WindowAttributes) -> Result<W, String>) {
        if let Some(attrs) = self.pending.take() {
            self.done = Some(open(attrs));
        }
    }

    fn take(&mut self) -> Option<Result<W, String>> {
        self.done.take()
    }

    fn cancel(&mut self) {
        self.pending = None;
        self.done = None;
    }
}

#[derive(Default)]
struct PumpState {
    window_id: Option<WindowId>,
    close_requested: bool,
    request: WindowRequest<Window>,
}

impl PumpState {
    fn open_requested(&mut self, event_loop: &ActiveEventLoop) {
        let window_id = &mut self.window_id;
        let close_requested = &mut self.close_requested;
        self.request.serve(|attrs| {
            let window = event_loop.create_window(attrs).map_err(|e| e.to_string())?;
            *window_id = Some(window.id());
            *close_requested = false;
            Ok(window)
        });
    }

    fn handle(&mut self, window_id: WindowId, event: WindowEvent) {
        if self.window_id != Some(window_id) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => debug!("Resized → {}x{}", size.width, size.height),
            _ => {}
        }
    }
}

impl ApplicationHandler for PumpState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.open_requested(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        self.handle(window_id, event);
    }

    // Resumed only fires once per loop; later requests are served here.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.open_requested(event_loop);
    }
}

pub struct PlatformWindow {
    window: Window,
}

impl PlatformWindow {
    pub fn winit_window(&self) -> &Window {
        &self.window
    }
}

pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    state: PumpState,
    poll_timeout: Option<Duration>,
}

impl WinitPlatform {
    /// `poll_timeout` bounds how long one poll may wait for events; `None`
    /// returns immediately.
    pub fn new(poll_timeout: Option<Duration>) -> Result<Self, BootstrapError> {
        let event_loop =
            EventLoop::new().map_err(|e| BootstrapError::PlatformInit(e.to_string()))?;
        Ok(Self {
            event_loop,
            state: PumpState::default(),
            poll_timeout,
        })
    }
}

impl Platform for WinitPlatform {
    type Window = PlatformWindow;

    fn create_window(&mut self, desc: &WindowDesc) -> Result<PlatformWindow, BootstrapError> {
        let attrs = Window::default_attributes()
            .with_title(desc.title.clone())
            .with_inner_size(LogicalSize::new(desc.width, desc.height));
        self.state.request.submit(attrs);

        for _ in 0..WINDOW_PUMP_LIMIT {
            let status = self
                .event_loop
                .pump_app_events(Some(Duration::ZERO), &mut self.state);
            if let Some(result) = self.state.request.take() {
                let window = result.map_err(BootstrapError::PlatformInit)?;
                info!("Window {:?} ({}x{})", desc.title, desc.width, desc.height);
                return Ok(PlatformWindow { window });
            }
            if let PumpStatus::Exit(code) = status {
                self.state.request.cancel();
                return Err(BootstrapError::PlatformInit(format!(
                    "event loop exited with {code} before the window opened"
                )));
            }
        }
        self.state.request.cancel();
        Err(BootstrapError::PlatformInit(
            "event loop never got to open the window".into(),
        ))
    }

    fn required_instance_extensions(&self) -> Result<Vec<String>, BootstrapError> {
        let display = self
            .event_loop
            .display_handle()
            .map_err(|e| BootstrapError::PlatformInit(e.to_string()))?;
        tri_render_vk::required_surface_extensions(display.as_raw())
    }

    fn poll_events(&mut self) {
        if let PumpStatus::Exit(code) =
            self.event_loop.pump_app_events(self.poll_timeout, &mut self.state)
        {
            debug!("Event loop exited with {code}");
            self.state.close_requested = true;
        }
    }

    fn should_close(&self, _window: &PlatformWindow) -> bool {
        self.state.close_requested
    }

    fn destroy_window(&mut self, window: PlatformWindow) {
        self.state.window_id = None;
        drop(window);
    }
}

impl SurfaceProvider<VkDriver> for WinitPlatform {
    fn create_surface(
        &self,
        _driver: &VkDriver,
        context: &Entry,
        instance: &VkInstance,
        window: &PlatformWindow,
    ) -> Result<vk::SurfaceKHR, BootstrapError> {
        let display = window
            .window
            .display_handle()
            .map_err(|e| BootstrapError::SurfaceCreation(e.to_string()))?;
        let handle = window
            .window
            .window_handle()
            .map_err(|e| BootstrapError::SurfaceCreation(e.to_string()))?;
        tri_render_vk::create_surface(context, instance, display.as_raw(), handle.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(unused_unsafe)]
    fn dummy_id() -> WindowId {
        // SAFETY: only compared, never handed to the windowing system.
        unsafe {
            WindowId::dummy()
        }
    }

    #[test]
    fn close_request_latches() {
        let mut state = PumpState {
            window_id: Some(dummy_id()),
            ..PumpState::default()
        };
        state.handle(dummy_id(), WindowEvent::Focused(true));
        assert!(!state.close_requested);

        state.handle(dummy_id(), WindowEvent::CloseRequested);
        assert!(state.close_requested);
        state.handle(dummy_id(), WindowEvent::Focused(false));
        assert!(state.close_requested);
    }

    #[test]
    fn window_request_is_served_once() {
        let mut request = WindowRequest::<u32>::default();
        let mut opened = 0;
        request.serve(|_| {
            opened += 1;
            Ok(1)
        });
        assert_eq!(opened, 0);
        assert!(request.take().is_none());

        request.submit(Window::default_attributes().with_title("tri"));
        for _ in 0..3 {
            request.serve(|attrs| {
                opened += 1;
                assert_eq!(attrs.title, "tri");
                Ok(7)
            });
        }
        assert_eq!(opened, 1);
        assert_eq!(request.take(), Some(Ok(7)));
        assert!(request.take().is_none());
    }

    #[test]
    fn window_request_failure_and_cancel() {
        let mut request = WindowRequest::<u32>::default();
        request.submit(Window::default_attributes());
        request.serve(|_| Err("no display".to_owned()));
        assert_eq!(request.take(), Some(Err("no display".to_owned())));

        request.submit(Window::default_attributes());
        request.cancel();
        request.serve(|_| panic!("cancelled request was served"));
        assert!(request.take().is_none());
    }

    #[test]
    fn events_without_a_window_are_ignored() {
        let mut state = PumpState::default();
        state.handle(dummy_id(), WindowEvent::CloseRequested);
        assert!(!state.close_requested);
    }
}
