// src/gui.rs
use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rounding, Stroke, Vec2};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::drivers::projector::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::drivers::{HoverHit, PlotProjector};
use crate::engine;
use crate::serial;
use crate::types::*;

// Interactive palette, indexed by experiment id mod length:
// blue, red, green, purple, orange, brown, pink, gray.
const PALETTE: [Color32; 8] = [
    Color32::from_rgb(50, 100, 255),
    Color32::from_rgb(230, 60, 60),
    Color32::from_rgb(60, 180, 75),
    Color32::from_rgb(145, 70, 255),
    Color32::from_rgb(255, 165, 0),
    Color32::from_rgb(160, 110, 60),
    Color32::from_rgb(255, 130, 180),
    Color32::from_rgb(150, 150, 150),
];

const MAX_LOG_LINES: usize = 14;

pub struct LabTraceApp {
    // Recording state
    is_recording: bool,
    connection_mode: ConnectionMode,
    port_name: String,
    ports: Vec<String>,
    active_id: ExperimentId,
    point_count: usize,
    last_value: Option<f64>,

    // Persistence & analysis
    csv_path: String,
    png_path: String,
    // (id, point count, selected for analysis)
    experiment_list: Vec<(ExperimentId, usize, bool)>,
    projector: Option<PlotProjector>,

    // Interface log
    log_messages: Vec<String>,
    status_line: String,
    status_is_error: bool,

    // Channels to the engine
    rx: Receiver<EngineMessage>,
    tx_cmd: Sender<GuiCommand>,
    recording: Arc<AtomicBool>,
}

impl Default for LabTraceApp {
    fn default() -> Self {
        let config = AppConfig::load_or_default(Path::new("labtrace.json"));
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let recording = Arc::new(AtomicBool::new(false));

        // Start the background engine
        engine::spawn_thread(tx, rx_cmd, recording.clone(), config);

        let ports = serial::list_ports();
        let port_name = ports.first().cloned().unwrap_or_default();

        Self {
            is_recording: false,
            connection_mode: ConnectionMode::Simulator,
            port_name,
            ports,
            active_id: 1,
            point_count: 0,
            last_value: None,
            csv_path: "experiments.csv".to_owned(),
            png_path: "comparison.png".to_owned(),
            experiment_list: Vec::new(),
            projector: None,
            log_messages: vec!["labtrace ready".to_owned()],
            status_line: "ready, simulator mode".to_owned(),
            status_is_error: false,
            rx,
            tx_cmd,
            recording,
        }
    }
}

impl LabTraceApp {
    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {msg}"));
        if self.log_messages.len() > MAX_LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn set_status(&mut self, msg: String, is_error: bool) {
        self.status_line = msg;
        self.status_is_error = is_error;
    }

    fn selected_ids(&self) -> Vec<ExperimentId> {
        self.experiment_list
            .iter()
            .filter(|(_, _, selected)| *selected)
            .map(|(id, _, _)| *id)
            .collect()
    }

    fn merge_experiment_list(&mut self, list: Vec<(ExperimentId, usize)>) {
        // New experiments start selected; known ones keep their checkbox.
        let previous: HashMap<ExperimentId, bool> = self
            .experiment_list
            .iter()
            .map(|(id, _, selected)| (*id, *selected))
            .collect();
        self.experiment_list = list
            .into_iter()
            .map(|(id, count)| (id, count, previous.get(&id).copied().unwrap_or(true)))
            .collect();
    }

    fn handle_message(&mut self, msg: EngineMessage) {
        match msg {
            EngineMessage::Log(s) => self.log(&s),
            EngineMessage::Warn(s) => {
                self.log(&s);
                self.set_status(s, false);
            }
            EngineMessage::Error(s) => {
                self.log(&s);
                self.set_status(s, true);
            }
            EngineMessage::RecordingStatus(active) => {
                self.is_recording = active;
                if active {
                    self.point_count = 0;
                    self.last_value = None;
                    self.set_status("recording".to_owned(), false);
                } else {
                    self.set_status("stopped".to_owned(), false);
                }
            }
            EngineMessage::Point(sample) => {
                self.last_value = Some(sample.value);
                self.point_count += 1;
            }
            EngineMessage::ActiveExperiment(id) => self.active_id = id,
            EngineMessage::ExperimentList(list) => self.merge_experiment_list(list),
            EngineMessage::Analysis(series) => {
                self.projector = PlotProjector::new(&series);
            }
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.heading("labtrace");
        ui.label("serial data logger");
        ui.separator();

        // Mode
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.connection_mode, ConnectionMode::Simulator, "SIM");
            ui.selectable_value(&mut self.connection_mode, ConnectionMode::Serial, "SERIAL");
        });

        // Port picker, only meaningful in serial mode
        ui.add_enabled_ui(self.connection_mode == ConnectionMode::Serial, |ui| {
            ui.horizontal(|ui| {
                ui.label("port:");
                let ports = self.ports.clone();
                egui::ComboBox::from_id_source("port")
                    .selected_text(self.port_name.clone())
                    .show_ui(ui, |ui| {
                        for port in &ports {
                            ui.selectable_value(&mut self.port_name, port.clone(), port);
                        }
                    });
                if ui.button("\u{21BB}").clicked() {
                    self.ports = serial::list_ports();
                    if !self.ports.contains(&self.port_name) {
                        self.port_name = self.ports.first().cloned().unwrap_or_default();
                    }
                }
            });
        });

        ui.add_space(6.0);

        // Start/stop. Starting goes through the engine (it may fail to
        // connect); stopping is just the flag flip, observed by the engine
        // on its next iteration.
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.is_recording, egui::Button::new("START"))
                .clicked()
            {
                let port = (self.connection_mode == ConnectionMode::Serial)
                    .then(|| self.port_name.clone());
                self.tx_cmd
                    .send(GuiCommand::StartRecording {
                        mode: self.connection_mode,
                        port,
                    })
                    .ok();
            }
            if ui
                .add_enabled(self.is_recording, egui::Button::new("STOP"))
                .clicked()
            {
                self.recording.store(false, Ordering::SeqCst);
            }
        });

        ui.add_space(6.0);
        ui.label(format!("experiment E{}", self.active_id));
        ui.label(format!("points: {}", self.point_count));
        match self.last_value {
            Some(v) => ui.label(format!("value: {v:.2}")),
            None => ui.label("value: --.--"),
        };

        ui.add_space(10.0);
        ui.separator();
        ui.label("FILE");
        ui.text_edit_singleline(&mut self.csv_path);
        ui.horizontal(|ui| {
            if ui.button("SAVE").clicked() {
                self.tx_cmd
                    .send(GuiCommand::SaveAll(PathBuf::from(&self.csv_path)))
                    .ok();
            }
            if ui
                .add_enabled(!self.is_recording, egui::Button::new("OPEN"))
                .clicked()
            {
                self.tx_cmd
                    .send(GuiCommand::Load(PathBuf::from(&self.csv_path)))
                    .ok();
            }
        });

        ui.add_space(10.0);
        ui.separator();
        egui::ScrollArea::vertical()
            .max_height(180.0)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });

        ui.add_space(6.0);
        let status_color = if self.status_is_error {
            Color32::from_rgb(230, 80, 80)
        } else {
            Color32::GRAY
        };
        ui.label(egui::RichText::new(&self.status_line).color(status_color));
    }

    fn analysis_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label("experiments:");
            for (id, count, selected) in &mut self.experiment_list {
                ui.checkbox(selected, format!("E{id} ({count} points)"));
            }
        });
        ui.horizontal(|ui| {
            if ui.button("ANALYZE").clicked() {
                self.tx_cmd
                    .send(GuiCommand::Analyze(self.selected_ids()))
                    .ok();
            }
            ui.text_edit_singleline(&mut self.png_path);
            if ui.button("EXPORT PNG").clicked() {
                self.tx_cmd
                    .send(GuiCommand::ExportPlot {
                        path: PathBuf::from(&self.png_path),
                        ids: self.selected_ids(),
                    })
                    .ok();
            }
        });
    }

    /// Draws the comparison plot and returns the hover hit, if any.
    fn draw_plot(&self, ui: &mut egui::Ui) -> Option<HoverHit> {
        let projector = self.projector.as_ref()?;

        let (response, painter) = ui.allocate_painter(
            Vec2::new(CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32),
            egui::Sense::hover(),
        );
        let origin = response.rect.min;
        let at = |x: f64, y: f64| Pos2::new(origin.x + x as f32, origin.y + y as f32);

        painter.rect_filled(response.rect, Rounding::same(2.0), Color32::WHITE);

        // Axes
        for ((x0, y0), (x1, y1)) in PlotProjector::axes() {
            painter.line_segment([at(x0, y0), at(x1, y1)], Stroke::new(2.0, Color32::BLACK));
        }

        // Ticks
        for (x, seconds) in projector.time_ticks() {
            painter.line_segment([at(x, 500.0), at(x, 505.0)], Stroke::new(1.0, Color32::BLACK));
            painter.text(
                at(x, 520.0),
                Align2::CENTER_CENTER,
                format!("{seconds:.1}s"),
                FontId::proportional(11.0),
                Color32::BLACK,
            );
        }
        for (y, value) in projector.value_ticks() {
            painter.line_segment([at(45.0, y), at(50.0, y)], Stroke::new(1.0, Color32::BLACK));
            painter.text(
                at(30.0, y),
                Align2::CENTER_CENTER,
                format!("{value:.1}"),
                FontId::proportional(11.0),
                Color32::BLACK,
            );
        }

        // Raw (thin) and smoothed (thick) polylines plus the legend
        let mut legend_y = 30.0;
        for series in projector.series() {
            let color = PALETTE[series.color_index()];

            let raw = projector.raw_polyline(series);
            for pair in raw.windows(2) {
                painter.line_segment(
                    [at(pair[0].0, pair[0].1), at(pair[1].0, pair[1].1)],
                    Stroke::new(1.0, color),
                );
            }
            if series.times.len() > 1 {
                let smooth = projector.smooth_polyline(series);
                for pair in smooth.windows(2) {
                    painter.line_segment(
                        [at(pair[0].0, pair[0].1), at(pair[1].0, pair[1].1)],
                        Stroke::new(3.0, color),
                    );
                }
            }

            painter.text(
                at(800.0, legend_y),
                Align2::LEFT_CENTER,
                format!("E{}", series.id),
                FontId::proportional(12.0),
                color,
            );
            legend_y += 20.0;
        }

        painter.text(
            at(475.0, 540.0),
            Align2::CENTER_CENTER,
            "time from experiment start (s)",
            FontId::proportional(11.0),
            Color32::BLACK,
        );
        painter.text(
            at(30.0, 35.0),
            Align2::CENTER_CENTER,
            "value",
            FontId::proportional(11.0),
            Color32::BLACK,
        );

        // Hover: highlight the nearest raw point within the pixel radius
        let pos = response.hover_pos()?;
        let hit = projector.nearest((pos.x - origin.x) as f64, (pos.y - origin.y) as f64)?;
        painter.circle_filled(at(hit.x, hit.y), 4.0, Color32::YELLOW);
        painter.circle_stroke(at(hit.x, hit.y), 4.0, Stroke::new(1.0, Color32::BLACK));
        Some(hit)
    }
}

impl eframe::App for LabTraceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. Drain engine messages
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
        }

        // 2. Panels
        egui::SidePanel::left("controls")
            .min_width(300.0)
            .show(ctx, |ui| self.side_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.analysis_controls(ui);
            ui.separator();

            if self.projector.is_some() {
                let hit = self.draw_plot(ui);
                match hit {
                    Some(h) => ui.label(format!(
                        "E{}: time={:.2}s, value={:.2}",
                        h.id, h.time_offset, h.value
                    )),
                    None => ui.label("hover over a point to inspect it"),
                };
            } else {
                ui.label("select experiments and press ANALYZE to compare them");
            }
        });

        // 3. Keep the frame loop ticking while data is flowing
        if self.is_recording {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(200));
        }
    }
}
