// src/gui.rs
use eframe::egui;
use egui::{Color32, RichText};
use log::{error, info, warn};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::config::SpecanConfig;
use crate::drivers::{render_sweep_png, DisplayRange, FrameHistory, FrameSource, PlotStyle};
use crate::engine::AcquisitionThread;
use crate::recorder::SweepRecorder;
use crate::types::*;
use crate::visualizer::{ReticleCache, SpectrumView};

const MAX_LOG_LINES: usize = 6;
// Frames handled per update before yielding back to paint.
const MAX_MESSAGES_PER_UPDATE: usize = 64;

pub struct SpecanApp {
    config: SpecanConfig,
    range: DisplayRange,

    // display state, UI thread only
    frame: Option<Frame>,
    history: FrameHistory,
    reticle: ReticleCache,
    paused: bool,
    show_trail: bool,

    // stats
    frame_count: u64,
    sweep_rate: f32,
    last_frame_at: Option<Instant>,
    source_running: bool,

    recorder: SweepRecorder,
    record_label: String,
    log_messages: Vec<String>,

    rx: Receiver<SpecanMessage>,
    acquisition: Option<AcquisitionThread>,
}

impl SpecanApp {
    pub fn new(
        ctx: &egui::Context,
        config: SpecanConfig,
        source: Box<dyn FrameSource + Send>,
    ) -> Self {
        let (tx, rx) = channel();
        let repaint = ctx.clone();
        let acquisition = AcquisitionThread::spawn(source, move |msg| {
            // UI gone: nothing left to deliver to
            if tx.send(msg).is_ok() {
                repaint.request_repaint();
            }
        });
        let mut log_messages = Vec::new();
        let (acquisition, source_running) = match acquisition {
            Ok(thread) => (Some(thread), true),
            Err(e) => {
                error!("failed to spawn acquisition thread: {e}");
                log_messages.push(format!("> Acquisition thread failed: {e}"));
                (None, false)
            }
        };
        let history = FrameHistory::with_depth(config.history_depth).unwrap_or_else(|e| {
            warn!("{e}, using default history depth");
            FrameHistory::default()
        });
        Self {
            range: config.range,
            config,
            frame: None,
            history,
            reticle: ReticleCache::default(),
            paused: false,
            show_trail: true,
            frame_count: 0,
            sweep_rate: 0.0,
            last_frame_at: None,
            source_running,
            recorder: SweepRecorder::new(),
            record_label: "capture".to_owned(),
            log_messages,
            rx,
            acquisition,
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > MAX_LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn on_frame(&mut self, frame: Frame) {
        self.frame_count += 1;
        let now = Instant::now();
        if let Some(prev) = self.last_frame_at {
            let dt = now.duration_since(prev).as_secs_f32();
            if dt > 0.0 {
                // exponential moving average of sweeps per second
                self.sweep_rate = self.sweep_rate * 0.9 + (1.0 / dt) * 0.1;
            }
        }
        self.last_frame_at = Some(now);

        if let Err(e) = self.recorder.write_frame(&frame) {
            error!("recording failed: {e}");
            self.log(&format!("Recording stopped: {e}"));
        }
        if self.paused {
            return;
        }
        self.history.push(frame.clone());
        self.frame = Some(frame);
    }

    /// Returns `true` if messages were left in the queue.
    fn drain_messages(&mut self) -> bool {
        for _ in 0..MAX_MESSAGES_PER_UPDATE {
            let Ok(msg) = self.rx.try_recv() else {
                return false;
            };
            match msg {
                SpecanMessage::Frame(frame) => self.on_frame(frame),
                SpecanMessage::Log(s) => self.log(&s),
                SpecanMessage::Stopped => {
                    self.source_running = false;
                    self.log("Acquisition stopped");
                }
            }
        }
        true
    }

    /// Restarts max hold from the sweep currently on screen.
    fn clear_max_hold(&mut self) {
        self.history.clear();
        if let Some(frame) = &self.frame {
            self.history.push(frame.clone());
        }
    }

    fn save_snapshot(&mut self) {
        let Some(frame) = &self.frame else {
            self.log("No sweep to save yet");
            return;
        };
        let max_hold = self.history.max_hold_trace(frame);
        let result = render_sweep_png(frame, &max_hold, &self.range, PlotStyle::default())
            .and_then(|png| {
                let name = format!("specan_{}.png", unix_seconds());
                std::fs::write(&name, png)?;
                Ok(name)
            });
        match result {
            Ok(name) => {
                info!("snapshot saved to {name}");
                self.log(&format!("Saved {name}"));
            }
            Err(e) => {
                error!("snapshot failed: {e}");
                self.log(&format!("Snapshot failed: {e}"));
            }
        }
    }

    fn toggle_recording(&mut self) {
        if self.recorder.is_recording() {
            let rows = self.recorder.rows();
            match self.recorder.stop() {
                Ok(()) => self.log(&format!("Recorded {rows} sweeps")),
                Err(e) => self.log(&format!("Recording flush failed: {e}")),
            }
            return;
        }
        match self.recorder.start(Path::new("."), &self.record_label) {
            Ok(path) => self.log(&format!("Recording to {}", path.display())),
            Err(e) => {
                error!("failed to start recording: {e}");
                self.log(&format!("Recording failed: {e}"));
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let pause_txt = if self.paused { "RESUME" } else { "PAUSE" };
            if ui.button(pause_txt).clicked() {
                self.paused = !self.paused;
            }
            if ui.button("CLEAR MAX HOLD").clicked() {
                self.clear_max_hold();
            }
            ui.checkbox(&mut self.show_trail, "Trail");
            ui.separator();
            if ui.button("SAVE PNG").clicked() {
                self.save_snapshot();
            }
            ui.add(egui::TextEdit::singleline(&mut self.record_label).desired_width(80.0));
            let rec_txt = if self.recorder.is_recording() { "STOP REC" } else { "RECORD" };
            let rec_col = if self.recorder.is_recording() { Color32::RED } else { Color32::DARK_GRAY };
            if ui
                .add(egui::Button::new(RichText::new(rec_txt).color(Color32::WHITE)).fill(rec_col))
                .clicked()
            {
                self.toggle_recording();
            }
        });
    }

    fn status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (dot, txt) = if self.source_running {
                (Color32::GREEN, "LIVE")
            } else {
                (Color32::RED, "STOPPED")
            };
            ui.label(RichText::new(txt).color(dot).strong());
            ui.label(format!("{:?}", self.config.mode));
            ui.label(format!("sweeps: {}", self.frame_count));
            ui.label(format!("{:.1} /s", self.sweep_rate));
            if !self.history.is_empty() {
                ui.label(format!("hold {}/{}", self.history.len(), self.history.depth()));
            }
            if let Some((hz, dbm)) = self.frame.as_ref().and_then(Frame::peak) {
                ui.label(format!("peak {:.0} MHz {:+.0} dBm", hz as f64 / 1e6, dbm));
            }
            if self.paused {
                ui.label(RichText::new("PAUSED").color(Color32::YELLOW));
            }
            if let Some(path) = self.recorder.path() {
                ui.label(RichText::new(format!("REC {}", path.display())).color(Color32::RED));
            }
        });
        for m in &self.log_messages {
            ui.monospace(m);
        }
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl eframe::App for SpecanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.drain_messages() {
            ctx.request_repaint();
        }

        ctx.set_visuals(egui::Visuals::dark());

        egui::TopBottomPanel::top("controls").show(ctx, |ui| self.controls(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::hover());
                let rect = response.rect;
                let persistence = if self.show_trail { self.config.persistence_depth } else { 0 };
                let reticle = self.reticle.get(&self.range, rect);
                SpectrumView {
                    range: &self.range,
                    frame: self.frame.as_ref(),
                    history: &self.history,
                    persistence,
                }
                .paint(&painter, rect, reticle);

                if let Some(pos) = response.hover_pos() {
                    let hz = self.range.x_to_hz(pos.x - rect.left(), rect.width());
                    let dbm = self.range.y_to_dbm(pos.y - rect.top(), rect.height());
                    painter.text(
                        pos + egui::vec2(8.0, -8.0),
                        egui::Align2::LEFT_BOTTOM,
                        format!("{:.1} MHz {:+.0} dBm", hz / 1e6, dbm),
                        egui::FontId::monospace(11.0),
                        Color32::YELLOW,
                    );
                }
            });
    }
}

impl Drop for SpecanApp {
    fn drop(&mut self) {
        if let Some(mut thread) = self.acquisition.take() {
            thread.stop(self.config.stop_timeout());
        }
        if let Err(e) = self.recorder.stop() {
            warn!("failed to flush recording: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ManualSource;
    use std::time::Duration;

    fn app_with(frames: Vec<Frame>, config: SpecanConfig) -> SpecanApp {
        let ctx = egui::Context::default();
        SpecanApp::new(&ctx, config, Box::new(ManualSource::new(frames)))
    }

    fn pump_until_stopped(app: &mut SpecanApp) {
        for _ in 0..500 {
            app.drain_messages();
            if !app.source_running {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("acquisition never stopped");
    }

    #[test]
    fn frames_land_in_history_and_feed_max_hold() {
        let config = SpecanConfig {
            history_depth: 2,
            ..SpecanConfig::default()
        };
        let frames = [-30.0, -90.0, -80.0]
            .into_iter()
            .map(|dbm| Frame::from_pairs([(2_400_000_000, dbm)]))
            .collect();
        let mut app = app_with(frames, config);
        pump_until_stopped(&mut app);
        assert_eq!(app.frame_count, 3);
        assert_eq!(app.history.len(), 2);
        assert_eq!(app.history.max_hold(2_400_000_000), Some(-80.0));
        assert_eq!(app.frame.as_ref().and_then(|f| f.get(2_400_000_000)), Some(-80.0));
    }

    #[test]
    fn paused_display_keeps_last_frame() {
        let frames = vec![Frame::from_pairs([(2_400_000_000, -50.0)])];
        let mut app = app_with(frames, SpecanConfig::default());
        app.paused = true;
        pump_until_stopped(&mut app);
        assert_eq!(app.frame_count, 1);
        assert!(app.frame.is_none());
        assert!(app.history.is_empty());
    }

    #[test]
    fn clearing_max_hold_restarts_from_current_sweep() {
        let frames = [-20.0, -70.0]
            .into_iter()
            .map(|dbm| Frame::from_pairs([(2_400_000_000, dbm), (2_401_000_000, dbm - 5.0)]))
            .collect();
        let mut app = app_with(frames, SpecanConfig::default());
        pump_until_stopped(&mut app);
        assert_eq!(app.history.max_hold(2_400_000_000), Some(-20.0));
        app.clear_max_hold();
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history.max_hold(2_400_000_000), Some(-70.0));
        assert_eq!(app.history.max_hold(2_401_000_000), Some(-75.0));
    }

    #[test]
    fn clearing_max_hold_before_any_sweep_leaves_history_empty() {
        let mut app = app_with(Vec::new(), SpecanConfig::default());
        pump_until_stopped(&mut app);
        app.clear_max_hold();
        assert!(app.history.is_empty());
    }

    #[test]
    fn log_keeps_only_recent_lines() {
        let mut app = app_with(Vec::new(), SpecanConfig::default());
        for i in 0..10 {
            app.log(&format!("line {i}"));
        }
        assert_eq!(app.log_messages.len(), MAX_LOG_LINES);
        assert_eq!(app.log_messages.last().map(String::as_str), Some("> line 9"));
    }
}
