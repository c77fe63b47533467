//! Interactive AVL insertion viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Visualizer`] and
//! implements [`eframe::App`]. egui plays both outside roles: keyboard
//! events become a [`Buttons`] snapshot, and the visualizer's draw list is
//! painted as labelled squares joined by edges.

use avl_core::{
    config::Config,
    error::AvlError,
    input::{ButtonState, Buttons, Signals},
    types::KEY_LIMIT,
    visualizer::{DrawItem, Visualizer},
};
use eframe::App;
use glam::{Vec2, Vec3};

const DIGIT_KEYS: [egui::Key; 10] = [
    egui::Key::Num0,
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Num4,
    egui::Key::Num5,
    egui::Key::Num6,
    egui::Key::Num7,
    egui::Key::Num8,
    egui::Key::Num9,
];

/// Upper bound on simulation frames run per repaint, so a long stall does
/// not turn into a burst of catch-up frames.
const MAX_FRAMES_PER_REPAINT: u32 = 8;

/// Pixels panned per repaint while an arrow key is held.
const PAN_STEP: f32 = 6.0;

/// Main application state for the interactive viewer.
///
/// The per-repaint update is:
/// 1. Collect keyboard and button input into [`Signals`].
/// 2. Run as many fixed-rate simulation frames as the elapsed time calls
///    for; the signals go to the first of them.
/// 3. Draw the tree from [`Visualizer::draw_items`].
///
/// ### Fields
/// - `vis` - The animated tree.
/// - `cfg` - Configuration used for resets.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space pan offset in pixels.
/// - `queued` - Signals from UI buttons, merged into the next frame.
/// - `manual_key` - Key typed into the "Insert key" field.
/// - `last_time` - egui time of the previous repaint.
/// - `lag` - Simulation time not yet consumed by a frame (seconds).
pub struct Viewer {
    vis: Visualizer,
    cfg: Config,

    zoom: f32,
    pan: egui::Vec2,

    queued: Signals,
    manual_key: u32,

    last_time: Option<f64>,
    lag: f64,
}

/// Reads a frame's key events into a button snapshot.
///
/// Auto-repeated key events count as held, not as new presses. Digits use
/// their held state since selecting the same speed twice is harmless.
///
/// ### Parameters
/// - `events` - egui events of this frame.
/// - `digits_down` - Whether each of the keys 0..9 is currently held.
fn buttons_from_events(events: &[egui::Event], digits_down: [bool; 10]) -> Buttons {
    let mut buttons = Buttons::default();
    for event in events {
        if let egui::Event::Key {
            key,
            pressed: true,
            repeat,
            ..
        } = event
        {
            let state = ButtonState {
                pressed: true,
                repeat_count: u32::from(*repeat),
            };
            match key {
                egui::Key::P => buttons.pause = state,
                egui::Key::S => buttons.insert = state,
                _ => {}
            }
        }
    }
    for (slot, down) in buttons.digits.iter_mut().zip(digits_down) {
        slot.pressed = down;
    }
    buttons
}

/// Combines keyboard signals with those queued by UI buttons.
///
/// A toggle requested from both sources in the same frame counts once.
fn merge_signals(keys: Signals, queued: Signals) -> Signals {
    Signals {
        pause_toggle: keys.pause_toggle || queued.pause_toggle,
        trigger_insert: keys.trigger_insert || queued.trigger_insert,
        speed_select: keys.speed_select.or(queued.speed_select),
    }
}

fn to_color32(c: Vec3) -> egui::Color32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgb(channel(c.x), channel(c.y), channel(c.z))
}

impl Viewer {
    /// Creates a viewer with a freshly seeded tree.
    ///
    /// ### Errors
    /// Whatever [`Visualizer::new`] reports for an unusable config.
    pub fn new(cfg: Config) -> Result<Self, AvlError> {
        Ok(Self {
            vis: Visualizer::new(cfg)?,
            cfg,
            zoom: 40.0,
            pan: egui::vec2(0.0, -120.0),
            queued: Signals::default(),
            manual_key: 0,
            last_time: None,
            lag: 0.0,
        })
    }

    /// Re-seeds the tree with new random keys, keeping the camera.
    fn reset(&mut self) {
        match Visualizer::new(self.cfg) {
            Ok(vis) => {
                self.vis = vis;
                self.queued = Signals::default();
                self.lag = 0.0;
            }
            Err(e) => log::error!("reset failed: {e}"),
        }
    }

    /// Runs the simulation frames due at egui time `now`.
    ///
    /// `signals` are delivered to the first frame only.
    fn advance(&mut self, now: f64, mut signals: Signals) {
        let frame_len = 1.0 / f64::from(self.cfg.motion.frames_per_second);
        let elapsed = self.last_time.map_or(frame_len, |t| now - t);
        self.last_time = Some(now);
        self.lag = (self.lag + elapsed).min(frame_len * f64::from(MAX_FRAMES_PER_REPAINT));

        // Button clicks must not be lost on a repaint that runs no frame.
        let mut ran = false;
        while self.lag >= frame_len {
            self.vis.step(&signals);
            signals = Signals::default();
            self.lag -= frame_len;
            ran = true;
        }
        if !ran {
            self.queued = signals;
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Builds the top panel (pause, insert, speed, reset, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let paused = self.vis.animator().is_paused();
                if ui
                    .button(if paused { "▶ Resume" } else { "⏸ Pause" })
                    .clicked()
                {
                    self.queued.pause_toggle = true;
                }

                if ui.button("Insert random").clicked() {
                    self.queued.trigger_insert = true;
                }

                ui.add(
                    egui::DragValue::new(&mut self.manual_key)
                        .range(0..=KEY_LIMIT - 1)
                        .prefix("key = "),
                );
                if ui.button("Insert key").clicked()
                    && let Err(e) = self.vis.request_insert(self.manual_key)
                {
                    log::warn!("insert of {} ignored: {e}", self.manual_key);
                }

                ui.separator();
                ui.label("Speed:");
                let presets = self.cfg.motion.speed_presets;
                let current = self.vis.units_per_second();
                for (i, ups) in presets.iter().enumerate() {
                    if ui
                        .selectable_label(*ups == current, format!("{i}"))
                        .on_hover_text(format!("{ups} units/s"))
                        .clicked()
                    {
                        self.queued.speed_select = Some(i as u8);
                    }
                }

                ui.separator();
                if ui.button("Reset").clicked() {
                    self.reset();
                }
                ui.add(egui::Slider::new(&mut self.zoom, 5.0..=120.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (phase, node count, height, speed).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("speed = {} units/s", self.vis.units_per_second()));
                ui.separator();
                ui.label(format!("height = {}", self.vis.tree().tree_height()));
                ui.label(format!("nodes = {}", self.vis.tree().len()));
                ui.separator();
                ui.label(format!("phase = {:?}", self.vis.phase()));
                ui.label("P pause · S insert · 0-9 speed");
            });
        });
    }

    /// Draws one node: the edge to its parent, then the box and its key.
    fn draw_item(&self, painter: &egui::Painter, rect: egui::Rect, item: &DrawItem) {
        let center = self.world_to_screen(item.pos, rect);

        if let Some(parent) = item.parent_pos {
            let p = self.world_to_screen(parent, rect);
            painter.line_segment([p, center], egui::Stroke::new(1.5, egui::Color32::LIGHT_GRAY));
        }

        // The core reports centers; boxes are drawn from their corner.
        let half = 0.5 * self.cfg.layout.node_width * self.zoom;
        let corner = center - egui::vec2(half, half);
        let node_rect = egui::Rect::from_min_size(corner, egui::vec2(2.0 * half, 2.0 * half));
        let color = to_color32(item.color);
        painter.rect_filled(node_rect, 2.0, egui::Color32::from_black_alpha(160));
        painter.rect_stroke(
            node_rect,
            2.0,
            egui::Stroke::new(2.0, color),
            egui::StrokeKind::Inside,
        );
        painter.text(
            center,
            egui::Align2::CENTER_CENTER,
            item.key.to_string(),
            egui::FontId::monospace((half * 0.9).max(8.0)),
            egui::Color32::GREEN,
        );
    }

    /// Builds the central panel: input, simulation frames and drawing.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::drag());
            let rect = response.rect;

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Pan with the arrow keys.
            let arrows = ctx.input(|i| {
                let held = |k| f32::from(u8::from(i.key_down(k)));
                let axis = |neg, pos| held(pos) - held(neg);
                egui::vec2(
                    axis(egui::Key::ArrowRight, egui::Key::ArrowLeft),
                    axis(egui::Key::ArrowDown, egui::Key::ArrowUp),
                )
            });
            self.pan += arrows * PAN_STEP;

            // Zoom around the mouse cursor.
            let scroll = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(5.0, 120.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            let (buttons, now) = ctx.input(|i| {
                let digits = DIGIT_KEYS.map(|k| i.key_down(k));
                (buttons_from_events(&i.events, digits), i.time)
            });
            let queued = std::mem::take(&mut self.queued);
            let signals = merge_signals(Signals::from_buttons(&buttons), queued);

            self.advance(now, signals);

            let painter = ui.painter_at(rect);
            for item in self.vis.draw_items() {
                self.draw_item(&painter, rect, &item);
            }

            ctx.request_repaint();
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_central_panel(ctx);
    }
}
