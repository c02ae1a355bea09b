use std::collections::VecDeque;

use crate::drivers::SpecanError;
use crate::types::Frame;

pub const DEFAULT_HISTORY_DEPTH: usize = 350;

/// Most recent frames, oldest first. Feeds the max-hold trace and the
/// persistence trail.
pub struct FrameHistory {
    frames: VecDeque<Frame>,
    depth: usize,
}

impl Default for FrameHistory {
    fn default() -> Self {
        Self {
            frames: VecDeque::with_capacity(DEFAULT_HISTORY_DEPTH),
            depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl FrameHistory {
    pub fn with_depth(depth: usize) -> Result<Self, SpecanError> {
        if depth == 0 {
            return Err(SpecanError::InvalidDepth);
        }
        Ok(Self {
            frames: VecDeque::with_capacity(depth),
            depth,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, frame: Frame) {
        if self.frames.len() == self.depth {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Newest first, at most `n` frames.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev().take(n)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn max_hold(&self, hz: u64) -> Option<f32> {
        self.frames
            .iter()
            .filter_map(|frame| frame.get(hz))
            .reduce(f32::max)
    }

    /// Max hold for every bin of `frame`, ascending frequency.
    pub fn max_hold_trace(&self, frame: &Frame) -> Vec<(u64, f32)> {
        frame
            .iter()
            .map(|(hz, now)| {
                let held = self.max_hold(hz).map_or(now, |max| max.max(now));
                (hz, held)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(dbm: f32) -> Frame {
        Frame::from_pairs([(2_400_000_000, dbm), (2_401_000_000, dbm - 10.0)])
    }

    #[test]
    fn never_exceeds_depth_and_evicts_oldest() {
        let mut history = FrameHistory::with_depth(3).unwrap();
        for dbm in [-90.0, -80.0, -70.0, -60.0, -50.0] {
            history.push(flat(dbm));
            assert!(history.len() <= 3);
        }
        let kept: Vec<f32> = history
            .recent(10)
            .map(|f| f.get(2_400_000_000).unwrap())
            .collect();
        assert_eq!(kept, vec![-50.0, -60.0, -70.0]);
    }

    #[test]
    fn max_hold_is_maximum_over_retained_frames() {
        let mut history = FrameHistory::with_depth(2).unwrap();
        history.push(flat(-20.0));
        history.push(flat(-70.0));
        assert_eq!(history.max_hold(2_400_000_000), Some(-20.0));
        // -20 falls out of the window.
        history.push(flat(-60.0));
        assert_eq!(history.max_hold(2_400_000_000), Some(-60.0));
        assert_eq!(history.max_hold(2_401_000_000), Some(-70.0));
        assert_eq!(history.max_hold(2_450_000_000), None);
    }

    #[test]
    fn max_hold_skips_frames_missing_a_bin() {
        let mut history = FrameHistory::default();
        history.push(Frame::from_pairs([(2_400_000_000, -30.0)]));
        history.push(Frame::from_pairs([(2_401_000_000, -90.0)]));
        let current = Frame::from_pairs([(2_400_000_000, -95.0), (2_401_000_000, -85.0)]);
        let trace = history.max_hold_trace(&current);
        assert_eq!(trace, vec![(2_400_000_000, -30.0), (2_401_000_000, -85.0)]);
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert!(FrameHistory::with_depth(0).is_err());
        let mut history = FrameHistory::default();
        history.push(flat(-40.0));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.depth(), DEFAULT_HISTORY_DEPTH);
    }
}
