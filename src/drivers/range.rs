use serde::Deserialize;

use crate::drivers::SpecanError;

/// Fixed frequency/power window mapped onto the plot area.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayRange {
    pub low_hz: f64,
    pub high_hz: f64,
    pub step_hz: f64,
    pub low_dbm: f64,
    pub high_dbm: f64,
}

impl Default for DisplayRange {
    fn default() -> Self {
        // 2.4 GHz ISM band, the whole Ubertooth tuning range.
        Self {
            low_hz: 2.400e9,
            high_hz: 2.483e9,
            step_hz: 1e6,
            low_dbm: -100.0,
            high_dbm: 0.0,
        }
    }
}

impl DisplayRange {
    #[cfg(test)]
    pub fn new(
        low_hz: f64,
        high_hz: f64,
        step_hz: f64,
        low_dbm: f64,
        high_dbm: f64,
    ) -> Result<Self, SpecanError> {
        let range = Self {
            low_hz,
            high_hz,
            step_hz,
            low_dbm,
            high_dbm,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), SpecanError> {
        if !(self.low_hz < self.high_hz) {
            return Err(SpecanError::InvalidRange(format!(
                "low frequency {} must be below high frequency {}",
                self.low_hz, self.high_hz
            )));
        }
        if !(self.step_hz > 0.0) {
            return Err(SpecanError::InvalidRange(format!(
                "frequency step {} must be positive",
                self.step_hz
            )));
        }
        if !(self.low_dbm < self.high_dbm) {
            return Err(SpecanError::InvalidRange(format!(
                "low power {} must be below high power {}",
                self.low_dbm, self.high_dbm
            )));
        }
        Ok(())
    }

    pub fn hz_to_x(&self, hz: f64, width: f32) -> f32 {
        let normalized = (hz - self.low_hz) / (self.high_hz - self.low_hz);
        (normalized * width as f64) as f32
    }

    pub fn dbm_to_y(&self, dbm: f64, height: f32) -> f32 {
        let normalized = (self.high_dbm - dbm) / (self.high_dbm - self.low_dbm);
        (normalized * height as f64) as f32
    }

    pub fn x_to_hz(&self, x: f32, width: f32) -> f64 {
        self.low_hz + (x / width) as f64 * (self.high_hz - self.low_hz)
    }

    pub fn y_to_dbm(&self, y: f32, height: f32) -> f64 {
        self.high_dbm - (y / height) as f64 * (self.high_dbm - self.low_dbm)
    }

    /// Four pixels per frequency step, one per dB.
    pub fn min_size_hint(&self) -> (f32, f32) {
        let x_points = ((self.high_hz - self.low_hz) / self.step_hz).round();
        let y_points = (self.high_dbm - self.low_dbm).round();
        ((x_points * 4.0) as f32, y_points as f32)
    }

    /// Number of step-spaced bins from low to high, both ends included.
    pub fn bin_count(&self) -> usize {
        ((self.high_hz - self.low_hz) / self.step_hz).round() as usize + 1
    }

    pub fn bin_frequencies(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.bin_count()).map(move |i| (self.low_hz + i as f64 * self.step_hz).round() as u64)
    }

    pub fn low_mhz(&self) -> u16 {
        (self.low_hz / 1e6).round() as u16
    }

    pub fn high_mhz(&self) -> u16 {
        (self.high_hz / 1e6).round() as u16
    }

    #[cfg(test)]
    pub fn contains_hz(&self, hz: u64) -> bool {
        let hz = hz as f64;
        hz >= self.low_hz && hz <= self.high_hz
    }

    /// Power gridline positions, 20 dB apart, top edge excluded.
    pub fn dbm_gridlines(&self) -> Vec<f64> {
        stepped(self.low_dbm, self.high_dbm, 20.0)
    }

    /// Frequency gridline positions, ten steps apart, right edge excluded.
    pub fn frequency_gridlines(&self) -> Vec<f64> {
        stepped(self.low_hz, self.high_hz, self.step_hz * 10.0)
    }
}

fn stepped(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}
