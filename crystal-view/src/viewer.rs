//! Interactive snowflake growth viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`CrystalGrowthEngine`]
//! and implements [`eframe::App`] to drive it a fixed number of ticks per
//! frame and paint a flat projection of the current point cloud.

use crystal_core::{
    config::{CollisionSearch, GrowthParameters},
    engine::CrystalGrowthEngine,
    types::Color,
};
use eframe::App;
use glam::{Vec2, Vec3};

/// Default number of engine ticks per rendered frame.
pub const DEFAULT_TICKS_PER_FRAME: usize = 10;

const DEFAULT_PRESET_PATH: &str = "snowflake_preset.json";

/// Plane the 3-D point cloud is projected onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewPlane {
    /// Looking down the Y axis (X right, Z up on screen).
    Top,
    /// Looking down the Z axis (X right, Y up).
    Front,
    /// Looking down the X axis (Z right, Y up).
    Side,
}

impl ViewPlane {
    fn label(self) -> &'static str {
        match self {
            ViewPlane::Top => "Top (X/Z)",
            ViewPlane::Front => "Front (X/Y)",
            ViewPlane::Side => "Side (Z/Y)",
        }
    }

    /// Drops the axis perpendicular to the plane.
    fn project(self, p: Vec3) -> Vec2 {
        match self {
            ViewPlane::Top => Vec2::new(p.x, p.z),
            ViewPlane::Front => Vec2::new(p.x, p.y),
            ViewPlane::Side => Vec2::new(p.z, p.y),
        }
    }
}

/// Main application state for the interactive viewer.
///
/// Per frame:
/// 1. Handle UI interactions and parameter edits.
/// 2. If `running`, call [`CrystalGrowthEngine::run`] with `ticks_per_frame`.
/// 3. Paint the structure (colored by the engine) and the walkers.
pub struct Viewer {
    engine: CrystalGrowthEngine,

    running: bool,
    ticks_per_frame: usize,

    plane: ViewPlane,
    zoom: f32,
    pan: egui::Vec2,
    show_walkers: bool,

    preset_path: String,
    status: Option<String>,
}

impl Viewer {
    /// Creates a viewer around a freshly seeded engine with default parameters.
    pub fn new() -> Self {
        Self::with_engine(CrystalGrowthEngine::new(GrowthParameters::default()))
    }

    pub fn with_engine(engine: CrystalGrowthEngine) -> Self {
        Self {
            engine,
            running: false,
            ticks_per_frame: DEFAULT_TICKS_PER_FRAME,
            plane: ViewPlane::Top,
            zoom: 25.0,
            pan: egui::vec2(0.0, 0.0),
            show_walkers: true,
            preset_path: DEFAULT_PRESET_PATH.to_owned(),
            status: None,
        }
    }

    /// Resets the crystal to its seed and stops auto-running.
    ///
    /// Parameters and camera settings are kept.
    fn reset(&mut self) {
        self.engine.reset();
        self.running = false;
        self.status = None;
    }

    /// Advances the simulation by one frame worth of ticks.
    fn step_frame(&mut self) {
        self.engine.run(self.ticks_per_frame);
    }

    /// Hands edited parameters to the engine and refreshes the derived
    /// attributes that depend on what changed.
    ///
    /// 1. Return early if nothing changed.
    /// 2. Pass `new` to [`CrystalGrowthEngine::set_params`].
    /// 3. Recompute sizes if a size endpoint changed, colors if a color
    ///    endpoint changed. A `max_particles` change triggers both, since the
    ///    radial parameter is `index / max_particles`.
    ///
    /// Growth-only fields (walk, spawn, collision) only affect future ticks.
    ///
    /// ### Parameters
    /// - `new` - The parameters as edited in the config panel.
    fn apply_params(&mut self, new: GrowthParameters) {
        let old = *self.engine.params();
        if new == old {
            return;
        }

        // The radial parameter depends on capacity, so it counts for both.
        let sizes_changed = new.inner_size_multiplier != old.inner_size_multiplier
            || new.outer_size_multiplier != old.outer_size_multiplier
            || new.max_particles != old.max_particles;
        let colors_changed = new.inner_color != old.inner_color
            || new.outer_color != old.outer_color
            || new.max_particles != old.max_particles;

        self.engine.set_params(new);
        if sizes_changed {
            self.engine.recompute_sizes();
        }
        if colors_changed {
            self.engine.recompute_colors();
        }
    }

    fn save_preset(&mut self) {
        match self.engine.params().save(&self.preset_path) {
            Ok(()) => self.status = Some(format!("saved {}", self.preset_path)),
            Err(e) => {
                log::warn!("could not save preset {}: {e}", self.preset_path);
                self.status = Some(format!("save failed: {e}"));
            }
        }
    }

    fn load_preset(&mut self) {
        match GrowthParameters::load(&self.preset_path) {
            Ok(params) => {
                self.apply_params(params);
                self.status = Some(format!("loaded {}", self.preset_path));
            }
            Err(e) => {
                log::warn!("could not load preset {}: {e}", self.preset_path);
                self.status = Some(format!("load failed: {e}"));
            }
        }
    }

    /// Converts a projected world position to screen-space.
    ///
    /// The y-axis is flipped so that positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`] (up to floating point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    fn to_color32(c: Color) -> egui::Color32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        egui::Color32::from_rgb(channel(c.x), channel(c.y), channel(c.z))
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    fn labeled_color(ui: &mut egui::Ui, label: &str, color: &mut Color) {
        ui.horizontal(|ui| {
            ui.label(label);
            let mut rgb = color.to_array();
            if ui.color_edit_button_rgb(&mut rgb).changed() {
                *color = Vec3::from_array(rgb);
            }
        });
    }

    /// Builds the top panel UI (run controls, stepping, view).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.ticks_per_frame)
                        .prefix("ticks/frame = ")
                        .range(1..=200)
                        .speed(1.0),
                );

                if ui.button("Step").clicked() {
                    self.step_frame();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                egui::ComboBox::from_id_salt("view_plane")
                    .selected_text(self.plane.label())
                    .show_ui(ui, |ui| {
                        for plane in [ViewPlane::Top, ViewPlane::Front, ViewPlane::Side] {
                            ui.selectable_value(&mut self.plane, plane, plane.label());
                        }
                    });
                ui.checkbox(&mut self.show_walkers, "Walkers");
                ui.add(egui::Slider::new(&mut self.zoom, 1.0..=200.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (counts, saturation, last preset action).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.engine.is_saturated() {
                    ui.label("saturated");
                }
                ui.label(format!("walkers = {}", self.engine.active_len()));
                ui.label(format!(
                    "points = {} / {}",
                    self.engine.structure_len(),
                    self.engine.params().max_particles
                ));
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
    }

    /// Builds the right-hand configuration panel for growth parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        let mut p = *self.engine.params();

        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Growth");

                ui.separator();
                ui.label("Walk");
                Self::labeled_drag_f32(ui, "spawn_radius:", &mut p.spawn_radius, 0.0..=100.0, 0.1);
                Self::labeled_drag_f32(ui, "step_size:", &mut p.step_size, 0.0..=5.0, 0.01);
                Self::labeled_drag_f32(ui, "randomness:", &mut p.randomness, 0.0..=5.0, 0.01);
                Self::labeled_drag_f32(
                    ui,
                    "vertical_factor:",
                    &mut p.vertical_factor,
                    0.0..=2.0,
                    0.01,
                );

                ui.separator();
                ui.label("Capacity");
                Self::labeled_drag_usize(ui, "max_active:", &mut p.max_active, 1..=500, 1.0);
                Self::labeled_drag_usize(
                    ui,
                    "max_particles:",
                    &mut p.max_particles,
                    24..=50_000,
                    10.0,
                );

                ui.separator();
                ui.label("Collision");
                Self::labeled_drag_f32(
                    ui,
                    "particle_radius:",
                    &mut p.particle_radius,
                    0.01..=2.0,
                    0.005,
                );
                let mut use_grid = p.collision_search == CollisionSearch::Grid;
                if ui.checkbox(&mut use_grid, "hash grid").changed() {
                    p.collision_search = if use_grid {
                        CollisionSearch::Grid
                    } else {
                        CollisionSearch::Linear
                    };
                }

                ui.separator();
                ui.label("Appearance");
                Self::labeled_drag_f32(
                    ui,
                    "inner size:",
                    &mut p.inner_size_multiplier,
                    0.0..=5.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "outer size:",
                    &mut p.outer_size_multiplier,
                    0.0..=5.0,
                    0.01,
                );
                Self::labeled_color(ui, "inner color:", &mut p.inner_color);
                Self::labeled_color(ui, "outer color:", &mut p.outer_color);

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    p = GrowthParameters::default();
                }

                ui.separator();
                ui.label("Preset");
                ui.text_edit_singleline(&mut self.preset_path);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        self.save_preset();
                    }
                    if ui.button("Load").clicked() {
                        self.load_preset();
                        p = *self.engine.params();
                    }
                });
            });

        self.apply_params(p);
    }

    /// Builds the central panel where the crystal is drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 && response.hovered() {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(1.0, 200.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            if self.running {
                self.step_frame();
                ctx.request_repaint();
            }

            let radius = self.engine.params().particle_radius;
            let positions = self.engine.positions();
            let scales = self.engine.scales();
            let colors = self.engine.colors();
            for ((pos, scale), color) in positions.iter().zip(scales).zip(colors) {
                let p = self.world_to_screen(self.plane.project(*pos), rect);
                let r = (radius * scale * self.zoom).max(1.0);
                painter.circle_filled(p, r, Self::to_color32(*color));
            }

            if self.show_walkers {
                for w in self.engine.walkers() {
                    let p = self.world_to_screen(self.plane.project(*w), rect);
                    let r = (radius * self.zoom * 0.5).max(1.0);
                    painter.circle_filled(p, r, egui::Color32::from_gray(110));
                }
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
