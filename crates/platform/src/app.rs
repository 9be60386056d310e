//! The winit application: owns the window, GPU state, UI overlay and the
//! swap controller, and turns events into swaps and redraws.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use asset::{AssetResult, LoadRequest, Texture, TextureLoader, TextureSource, catalog};
use corelib::{RoomConfig, SceneState, SurfaceKind, SwapController, SwapOutcome, SwapTicket};
use renderer::GpuState;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::import::pick_image_file;
use crate::ui::{Overlay, PanelState, UiAction};

/// Events posted to the loop from loader threads.
#[derive(Debug)]
pub enum UserEvent {
    TextureLoaded {
        ticket: SwapTicket,
        result: AssetResult<Texture>,
    },
}

/// Continuation for loader threads: post the result back to the loop.
fn deliver_to(
    proxy: EventLoopProxy<UserEvent>,
) -> impl Fn(SwapTicket, AssetResult<Texture>) + Clone + Send + 'static {
    move |ticket, result| {
        if proxy
            .send_event(UserEvent::TextureLoaded { ticket, result })
            .is_err()
        {
            log::debug!("Event loop closed; dropping texture for {}", ticket.surface);
        }
    }
}

/// Frames per second over roughly one-second windows.
struct FpsCounter {
    window_start: Instant,
    frames: u32,
    last: Option<f32>,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            last: None,
        }
    }

    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.window_start.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.last = Some(self.frames as f32 / elapsed);
            self.frames = 0;
            self.window_start = Instant::now();
        }
        self.last
    }
}

pub struct RoomApp {
    backends: wgpu::Backends,
    show_fps: bool,
    initial_size: (u32, u32),
    config: RoomConfig,
    loader: TextureLoader,
    catalog: Vec<String>,
    controller: SwapController,
    proxy: EventLoopProxy<UserEvent>,
    import_target: SurfaceKind,
    fps: FpsCounter,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    overlay: Option<Overlay>,
    startup_error: Option<anyhow::Error>,
}

impl RoomApp {
    pub fn new(
        proxy: EventLoopProxy<UserEvent>,
        backends: wgpu::Backends,
        show_fps: bool,
        initial_size: (u32, u32),
        config: RoomConfig,
    ) -> Self {
        let loader = TextureLoader::from_dir(&config.images_dir);
        let catalog = catalog::scan_or_empty(&config.images_dir);
        let controller = SwapController::new(SceneState::new(initial_size.0, initial_size.1));
        let import_target = config.import_target;
        Self {
            backends,
            show_fps,
            initial_size,
            config,
            loader,
            catalog,
            controller,
            proxy,
            import_target,
            fps: FpsCounter::new(),
            window: None,
            gpu: None,
            overlay: None,
            startup_error: None,
        }
    }

    /// Error that stopped the app during startup, if any.
    pub fn take_startup_error(&mut self) -> Option<anyhow::Error> {
        self.startup_error.take()
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (width, height) = self.initial_size;
        let attrs = Window::default_attributes()
            .with_title("Room Visualizer")
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.backends,
            self.controller.scene_mut(),
        ))?;
        let overlay = Overlay::new(&window, &gpu);

        let size = window.inner_size();
        self.controller.resize(size.width, size.height);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.overlay = Some(overlay);

        let deliver = deliver_to(self.proxy.clone());
        self.controller
            .load_defaults(&self.loader, &self.config, deliver);
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn swap_from_catalog(&mut self, surface: SurfaceKind, name: String) {
        let request = LoadRequest::retrying(TextureSource::asset(name));
        let deliver = deliver_to(self.proxy.clone());
        if let Err(e) = self
            .controller
            .dispatch(&self.loader, surface, request, deliver)
        {
            log::error!("Cannot swap {surface}: {e}");
        }
    }

    fn import(&mut self, surface: SurfaceKind, path: &Path) {
        let deliver = deliver_to(self.proxy.clone());
        match self
            .controller
            .import_file(&self.loader, surface, path, deliver)
        {
            Ok(ticket) => log::info!(
                "Importing {} into {} (swap #{})",
                path.display(),
                surface,
                ticket.seq()
            ),
            Err(e) => log::error!("Cannot import {}: {e}", path.display()),
        }
    }

    fn handle_action(&mut self, action: UiAction) {
        match action {
            UiAction::Swap { surface, name } => self.swap_from_catalog(surface, name),
            UiAction::Import(surface) => {
                self.import_target = surface;
                let title = format!("Choose an image for the {}", surface.label().to_lowercase());
                match pick_image_file(&title) {
                    Some(path) => self.import(surface, &path),
                    None => log::error!("No file selected for {surface}; nothing imported"),
                }
            }
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(gpu), Some(overlay)) =
            (&self.window, &mut self.gpu, &mut self.overlay)
        else {
            return;
        };

        gpu.sync_scene(self.controller.scene_mut());

        let fps = self.fps.tick().filter(|_| self.show_fps);
        let scene = self.controller.scene();
        let surfaces = SurfaceKind::ALL.map(|kind| {
            (
                scene.surface(kind).texture().source().label(),
                self.controller.is_pending(kind),
            )
        });
        let panel = PanelState {
            catalog: &self.catalog,
            surfaces,
            import_target: self.import_target,
            fps,
        };
        let (prepared, actions) = overlay.run(window, &panel);

        match gpu.render(scene, |target| overlay.paint(target, prepared)) {
            Ok(()) => {}
            Err(e) if GpuState::is_surface_lost(&e) => {
                log::warn!("Surface lost/outdated: {e}; reconfiguring");
                gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::Timeout) => log::debug!("Surface timeout; skipping frame"),
            Err(e) => log::error!("Render error: {e}"),
        }

        for action in actions {
            self.handle_action(action);
        }
    }
}

impl ApplicationHandler<UserEvent> for RoomApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_graphics(event_loop) {
            log::error!("Startup failed: {e:#}");
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let (Some(window), Some(overlay)) = (&self.window, &mut self.overlay) {
            if overlay.on_window_event(window, &event) {
                window.request_redraw();
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::info!("Resized: {}x{}", new_size.width, new_size.height);
                self.controller.resize(new_size.width, new_size.height);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {scale_factor:.3}");
            }
            WindowEvent::DroppedFile(path) => {
                let target = self.import_target;
                self.import(target, &path);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }

        if self.controller.take_redraw_request() {
            self.request_redraw();
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::TextureLoaded { ticket, result } => {
                if let SwapOutcome::Applied(id) = self.controller.complete(ticket, result) {
                    log::debug!("Bound texture {:?} to {}", id, ticket.surface);
                }
            }
        }
        if self.controller.take_redraw_request() {
            self.request_redraw();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Continuous render loop; presentation is vsync-paced.
        self.request_redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_counter_reports_after_a_second() {
        let mut fps = FpsCounter::new();
        assert_eq!(fps.tick(), None);
        fps.window_start -= std::time::Duration::from_secs(2);
        let rate = fps.tick().expect("rate after window");
        assert!(rate > 0.0 && rate <= 1.0);
        assert_eq!(fps.frames, 0);
    }
}
