//! Platform layer: window, event loop, UI panel and file imports.
//!
//! Texture loads run on worker threads and come back to the loop as
//! [`UserEvent`]s, so every scene mutation happens on the loop thread.

mod app;
mod import;
mod ui;

use anyhow::{Context, Result, anyhow};
use corelib::RoomConfig;
use winit::event_loop::EventLoop;

pub use app::{RoomApp, UserEvent};
pub use import::IMAGE_EXTENSIONS;

/// Open the room window and render until it is closed.
pub fn run_with_renderer(
    backends: wgpu::Backends,
    show_fps: bool,
    width: u32,
    height: u32,
    config: RoomConfig,
) -> Result<()> {
    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("Failed to create event loop")?;

    log::info!(
        "Images directory: {} (backend {:?})",
        config.images_dir.display(),
        backends
    );
    let mut app = RoomApp::new(
        event_loop.create_proxy(),
        backends,
        show_fps,
        (width.max(1), height.max(1)),
        config,
    );

    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    match app.take_startup_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
