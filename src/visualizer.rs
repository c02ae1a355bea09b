// src/visualizer.rs
use crate::drivers::{DisplayRange, FrameHistory};
use crate::types::Frame;
use eframe::egui;
use egui::{Color32, Pos2, Rect, Shape, Stroke};

const RETICLE_LINE: Color32 = Color32::BLUE;
const RETICLE_TEXT: Color32 = Color32::WHITE;
const RETICLE_OPACITY: f32 = 0.5;
const TRACE_NOW: Color32 = Color32::WHITE;
const TRACE_MAX: Color32 = Color32::GREEN;
// Each repaint dims what was drawn before by 10/255.
const PERSISTENCE_FADE: f32 = 245.0 / 255.0;

/// Sorted (hz, dBm) pairs to screen positions inside `rect`.
pub fn trace_points(
    range: &DisplayRange,
    rect: Rect,
    points: impl IntoIterator<Item = (u64, f32)>,
) -> Vec<Pos2> {
    points
        .into_iter()
        .map(|(hz, dbm)| {
            Pos2::new(
                rect.left() + range.hz_to_x(hz as f64, rect.width()),
                rect.top() + range.dbm_to_y(dbm as f64, rect.height()),
            )
        })
        .collect()
}

/// Gridlines and labels for one plot size.
#[derive(Clone, Debug)]
pub struct Reticle {
    rect: Rect,
    pub lines: Vec<[Pos2; 2]>,
    pub labels: Vec<(Pos2, String)>,
}

impl Reticle {
    pub fn build(range: &DisplayRange, rect: Rect) -> Self {
        let x = |hz: f64| rect.left() + range.hz_to_x(hz, rect.width());
        let y = |dbm: f64| rect.top() + range.dbm_to_y(dbm, rect.height());
        let mut lines = Vec::new();
        let mut labels = Vec::new();
        for dbm in range.dbm_gridlines() {
            lines.push([
                Pos2::new(x(range.low_hz), y(dbm)),
                Pos2::new(x(range.high_hz), y(dbm)),
            ]);
            labels.push((Pos2::new(x(range.low_hz) + 2.0, y(dbm) - 2.0), format!("{dbm:+.0}")));
        }
        for hz in range.frequency_gridlines() {
            lines.push([
                Pos2::new(x(hz), y(range.high_dbm)),
                Pos2::new(x(hz), y(range.low_dbm)),
            ]);
            labels.push((
                Pos2::new(x(hz) + 2.0, y(range.high_dbm) + 10.0),
                format!("{:.0}", hz / 1e6),
            ));
        }
        Self { rect, lines, labels }
    }

    pub fn paint(&self, painter: &egui::Painter) {
        let stroke = Stroke::new(1.0, RETICLE_LINE.gamma_multiply(RETICLE_OPACITY));
        for line in &self.lines {
            painter.line_segment(*line, stroke);
        }
        let text_color = RETICLE_TEXT.gamma_multiply(RETICLE_OPACITY);
        for (pos, text) in &self.labels {
            painter.text(
                *pos,
                egui::Align2::LEFT_BOTTOM,
                text,
                egui::FontId::proportional(10.0),
                text_color,
            );
        }
    }
}

/// Keeps the reticle until the plot rect changes.
#[derive(Default)]
pub struct ReticleCache {
    current: Option<Reticle>,
    rebuilds: usize,
}

impl ReticleCache {
    pub fn get(&mut self, range: &DisplayRange, rect: Rect) -> &Reticle {
        let stale = self.current.as_ref().map_or(true, |r| r.rect != rect);
        if stale {
            self.rebuilds += 1;
            self.current = Some(Reticle::build(range, rect));
        }
        self.current.get_or_insert_with(|| Reticle::build(range, rect))
    }

    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}

pub struct SpectrumView<'a> {
    pub range: &'a DisplayRange,
    pub frame: Option<&'a Frame>,
    pub history: &'a FrameHistory,
    pub persistence: usize,
}

impl SpectrumView<'_> {
    /// Background, fading trail, live trace, max hold. The reticle goes on top.
    pub fn paint(&self, painter: &egui::Painter, rect: Rect, reticle: &Reticle) {
        painter.rect_filled(rect, 0.0, Color32::BLACK);
        let Some(frame) = self.frame else {
            reticle.paint(painter);
            return;
        };
        // skip(1): the newest retained frame is the live trace
        let mut fade = 1.0;
        let mut trail = Vec::new();
        for old in self.history.recent(self.persistence + 1).skip(1) {
            fade *= PERSISTENCE_FADE;
            let gray = (255.0 * fade * 0.6) as u8;
            trail.push(Shape::line(
                trace_points(self.range, rect, old.iter()),
                Stroke::new(1.0, Color32::from_gray(gray)),
            ));
        }
        // oldest underneath
        trail.reverse();
        painter.extend(trail);
        painter.add(Shape::line(
            trace_points(self.range, rect, frame.iter()),
            Stroke::new(1.0, TRACE_NOW),
        ));
        painter.add(Shape::line(
            trace_points(self.range, rect, self.history.max_hold_trace(frame)),
            Stroke::new(1.0, TRACE_MAX),
        ));
        reticle.paint(painter);
    }
}
