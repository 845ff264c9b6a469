//! TerraBot View
//!
//! Interactive 3D viewport core for the TerraBot field robot: an exploded
//! CAD-style component viewer and a field simulator with a simulated sensor
//! feed. Drag to orbit, scroll to zoom, click a component to inspect it.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use terrabot_view::{launch_viewer, ViewerConfig};
//!
//! // Component viewer with the sensor panel
//! launch_viewer(ViewerConfig::for_cad_viewer()).unwrap();
//! ```
//!
//! The viewport also runs without a window:
//!
//! ```rust
//! use terrabot_view::viewport::{HeadlessProvider, SurfaceSize, Viewport, ViewportOptions};
//!
//! let mut provider = HeadlessProvider::new();
//! let mut viewport =
//!     Viewport::initialize(&mut provider, SurfaceSize::new(800, 600), &ViewportOptions::default())
//!         .unwrap();
//! viewport.render_frame();
//! assert_eq!(provider.log.borrow().frames.len(), 1);
//! ```

pub mod app;
pub mod camera;
pub mod config;
pub mod contact;
pub mod input;
pub mod pick;
pub mod renderer;
pub mod scene;
pub mod telemetry;
pub mod ui;
pub mod viewport;

use anyhow::Result;
use winit::event_loop::{ControlFlow, EventLoop};

pub use app::App;
pub use config::{ConfigError, ViewerConfig};
pub use scene::{Layout, PartId, Scene};
pub use telemetry::{Telemetry, TelemetryPreset};
pub use viewport::{Viewport, ViewportError, ViewportEvent, ViewportOptions};

/// Open a window showing one viewport. Blocks until the window is closed.
///
/// A viewport that cannot get a rendering surface is reported as an error;
/// it is not retried.
pub fn launch_viewer(config: ViewerConfig) -> Result<()> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run(|event, target| {
        app.handle_event(event, target);
    })?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
