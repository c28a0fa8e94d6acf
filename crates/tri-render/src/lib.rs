// SPDX-License-Identifier: CEPL-1.0
//! API-neutral bootstrap of a graphics execution context.
//!
//! ```text
//! Platform ─┐
//!           ├─ Bootstrap ── ExecutionContext
//! Driver  ──┘     │            window → context → instance → [messenger]
//!                 │            → surface → physical device → device → queue
//!             negotiate (RequirementSet × capability snapshots)
//! ```
//!
//! Backends implement [`Driver`]; windowing layers implement [`Platform`]
//! and [`SurfaceProvider`].

pub mod bootstrap;
pub mod caps;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod negotiate;
pub mod requirements;
pub mod version;

pub use bootstrap::{Bootstrap, BootstrapSettings, ExecutionContext, GraphicsQueue, Stage};
pub use caps::{DeviceFeature, PhysicalDeviceCandidate, QueueCapabilities, QueueFamily};
pub use diagnostics::{DiagnosticMessage, DiagnosticsSink, MessageCategory, Severity};
pub use driver::{DeviceDesc, Driver, InstanceDesc, Platform, SurfaceProvider, WindowDesc};
pub use error::BootstrapError;
pub use requirements::{AppInfo, RequirementSet};
pub use version::{ApiVersion, VersionOutOfRange};
