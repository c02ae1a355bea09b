#[cfg(test)]
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::drivers::{DisplayRange, SpecanError};
use crate::types::Frame;

/// Anything that can yield sweeps on demand.
///
/// `Ok(None)` ends the stream; `SpecanError::Timeout` only means "nothing yet".
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SpecanError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Frame>, SpecanError> {
        (**self).next_frame()
    }
}

/// In-memory source for tests.
#[cfg(test)]
pub struct ManualSource {
    queue: VecDeque<Frame>,
}

#[cfg(test)]
impl ManualSource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            queue: frames.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl FrameSource for ManualSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SpecanError> {
        Ok(self.queue.pop_front())
    }
}

const NOISE_FLOOR_DBM: f32 = -96.0;

/// Synthetic 2.4 GHz band: noise floor, a slowly drifting 20 MHz wide
/// carrier and occasional narrow hops.
pub struct SimulatedSource {
    range: DisplayRange,
    interval: Duration,
    rng: StdRng,
    phase: f64,
}

impl SimulatedSource {
    pub fn new(range: DisplayRange, interval: Duration) -> Self {
        Self {
            range,
            interval,
            rng: StdRng::from_entropy(),
            phase: 0.0,
        }
    }

    #[cfg(test)]
    pub fn seeded(range: DisplayRange, interval: Duration, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(range, interval)
        }
    }

    fn sweep(&mut self) -> Frame {
        self.phase += 0.01;
        let span = self.range.high_hz - self.range.low_hz;
        let carrier_hz = self.range.low_hz + span * (0.5 + 0.3 * self.phase.sin());
        let hop_hz = if self.rng.gen_bool(0.3) {
            Some(self.range.low_hz + span * self.rng.gen::<f64>())
        } else {
            None
        };
        let floor = self.range.low_dbm as f32;
        let ceiling = self.range.high_dbm as f32;
        let bins: Vec<u64> = self.range.bin_frequencies().collect();
        let levels = bins.into_iter().map(|hz| {
            let mut dbm = NOISE_FLOOR_DBM + self.rng.gen_range(-3.0..3.0);
            let offset_mhz = ((hz as f64 - carrier_hz) / 1e6) as f32;
            if offset_mhz.abs() < 10.0 {
                dbm = dbm.max(-45.0 - offset_mhz * offset_mhz * 0.3 + self.rng.gen_range(-4.0..4.0));
            }
            if let Some(hop) = hop_hz {
                if ((hz as f64 - hop) / self.range.step_hz).abs() < 0.5 {
                    dbm = dbm.max(self.rng.gen_range(-70.0..-30.0));
                }
            }
            (hz, dbm.clamp(floor, ceiling))
        });
        Frame::from_pairs(levels.collect::<Vec<_>>())
    }
}

impl FrameSource for SimulatedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SpecanError> {
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        Ok(Some(self.sweep()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_source_drains_in_order() {
        let mut source = ManualSource::new(vec![
            Frame::from_pairs([(1, -1.0)]),
            Frame::from_pairs([(2, -2.0)]),
        ]);
        assert_eq!(source.next_frame().unwrap().unwrap().get(1), Some(-1.0));
        assert_eq!(source.next_frame().unwrap().unwrap().get(2), Some(-2.0));
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn simulated_sweeps_cover_range_within_bounds() {
        let range = DisplayRange::default();
        let mut source = SimulatedSource::seeded(range, Duration::ZERO, 7);
        for _ in 0..20 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.len(), range.bin_count());
            for (hz, dbm) in frame.iter() {
                assert!(range.contains_hz(hz));
                assert!(dbm >= range.low_dbm as f32 && dbm <= range.high_dbm as f32);
            }
        }
    }

    #[test]
    fn seeded_sources_are_deterministic() {
        let range = DisplayRange::default();
        let mut a = SimulatedSource::seeded(range, Duration::ZERO, 42);
        let mut b = SimulatedSource::seeded(range, Duration::ZERO, 42);
        let fa = a.next_frame().unwrap().unwrap();
        let fb = b.next_frame().unwrap().unwrap();
        assert!(fa.iter().eq(fb.iter()));
    }
}
