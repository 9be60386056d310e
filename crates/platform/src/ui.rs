//! egui side panel: texture buttons per surface and the import trigger.

use corelib::SurfaceKind;
use egui::{ClippedPrimitive, TexturesDelta, ViewportId};
use egui_wgpu::ScreenDescriptor;
use renderer::{FrameTarget, GpuState};
use wgpu::{
    CommandBuffer, LoadOp, Operations, RenderPassColorAttachment, RenderPassDescriptor, StoreOp,
};
use winit::{event::WindowEvent, window::Window};

/// A click in the panel, handled by the app after the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiAction {
    /// Apply a catalog image to a surface.
    Swap { surface: SurfaceKind, name: String },
    /// Open the file picker for a surface.
    Import(SurfaceKind),
}

/// Read-only snapshot the panel is drawn from.
pub struct PanelState<'a> {
    pub catalog: &'a [String],
    /// Label of the bound texture and whether a swap is in flight, per surface.
    pub surfaces: [(String, bool); 3],
    pub import_target: SurfaceKind,
    pub fps: Option<f32>,
}

pub fn draw_panel(ctx: &egui::Context, panel: &PanelState<'_>, actions: &mut Vec<UiAction>) {
    egui::SidePanel::left("room-textures")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Room textures");
            if let Some(fps) = panel.fps {
                ui.label(format!("{fps:.0} FPS"));
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for kind in SurfaceKind::ALL {
                    let (current, pending) = &panel.surfaces[kind.index()];
                    ui.separator();
                    ui.strong(kind.label());
                    if *pending {
                        ui.label(format!("{current} (loading…)"));
                    } else {
                        ui.label(current.as_str());
                    }

                    ui.horizontal_wrapped(|ui| {
                        for name in panel.catalog {
                            if ui.small_button(name.as_str()).clicked() {
                                actions.push(UiAction::Swap {
                                    surface: kind,
                                    name: name.clone(),
                                });
                            }
                        }
                    });
                    if ui.button("Import image…").clicked() {
                        actions.push(UiAction::Import(kind));
                    }
                }
            });

            ui.separator();
            ui.small(format!(
                "Dropped files go to: {}",
                panel.import_target.label()
            ));
        });
}

/// Tessellated UI for one frame, waiting to be painted.
pub struct PreparedUi {
    primitives: Vec<ClippedPrimitive>,
    textures_delta: TexturesDelta,
    pixels_per_point: f32,
}

/// egui context + winit input translation + wgpu painter.
pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Overlay {
    pub fn new(window: &Window, gpu: &GpuState) -> Self {
        let ctx = egui::Context::default();
        let max_texture_side = gpu.device().limits().max_texture_dimension_2d as usize;
        let state = egui_winit::State::new(
            ctx.clone(),
            ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(max_texture_side),
        );
        let renderer = egui_wgpu::Renderer::new(gpu.device(), gpu.surface_format(), None, 1, false);
        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Feed a window event to egui. Returns `true` if the UI wants a repaint.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).repaint
    }

    /// Run the panel for this frame and collect the clicks it produced.
    pub fn run(&mut self, window: &Window, panel: &PanelState<'_>) -> (PreparedUi, Vec<UiAction>) {
        let raw = self.state.take_egui_input(window);
        let mut actions = Vec::new();
        let output = self.ctx.run(raw, |ctx| draw_panel(ctx, panel, &mut actions));
        self.state
            .handle_platform_output(window, output.platform_output);

        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        let prepared = PreparedUi {
            primitives,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        };
        (prepared, actions)
    }

    /// Paint prepared UI on top of the frame, without clearing it.
    pub fn paint(&mut self, target: FrameTarget<'_>, ui: PreparedUi) -> Vec<CommandBuffer> {
        let FrameTarget {
            device,
            queue,
            encoder,
            view,
            size,
        } = target;

        for (id, delta) in &ui.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        let screen = ScreenDescriptor {
            size_in_pixels: [size.0, size.1],
            pixels_per_point: ui.pixels_per_point,
        };
        let commands = self
            .renderer
            .update_buffers(device, queue, encoder, &ui.primitives, &screen);

        {
            let rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("UiPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            // egui-wgpu wants a 'static pass; it is dropped before the encoder finishes.
            let mut rpass = rpass.forget_lifetime();
            self.renderer.render(&mut rpass, &ui.primitives, &screen);
        }

        for id in &ui.textures_delta.free {
            self.renderer.free_texture(id);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel<'a>(catalog: &'a [String]) -> PanelState<'a> {
        PanelState {
            catalog,
            surfaces: [
                ("oak.png".into(), false),
                ("marble.png".into(), true),
                ("<placeholder>".into(), false),
            ],
            import_target: SurfaceKind::Floor,
            fps: Some(60.0),
        }
    }

    #[test]
    fn panel_draws_headless_without_actions() {
        let ctx = egui::Context::default();
        let catalog = vec!["oak.png".to_string(), "slate.jpg".to_string()];
        let state = panel(&catalog);
        let mut actions = Vec::new();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            draw_panel(ctx, &state, &mut actions)
        });
        assert!(actions.is_empty());
        assert!(!output.shapes.is_empty());
    }
}
