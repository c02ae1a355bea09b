// src/types.rs
use std::collections::BTreeMap;
use std::time::SystemTime;

use serde::Deserialize;

// Where sweeps come from
#[derive(PartialEq, Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    #[default]
    Hardware,
    Simulation,
}

/// One spectrum sweep: signal strength per frequency bin.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub captured_at: SystemTime,
    levels: BTreeMap<u64, f32>, // hz -> dBm
}

impl Frame {
    pub fn new(levels: BTreeMap<u64, f32>) -> Self {
        Self {
            captured_at: SystemTime::now(),
            levels,
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, f32)>) -> Self {
        Self::new(pairs.into_iter().collect())
    }

    pub fn get(&self, hz: u64) -> Option<f32> {
        self.levels.get(&hz).copied()
    }

    /// Bins in ascending frequency order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, f32)> + '_ {
        self.levels.iter().map(|(&hz, &dbm)| (hz, dbm))
    }

    pub fn frequencies(&self) -> impl Iterator<Item = u64> + '_ {
        self.levels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Strongest bin of the sweep.
    pub fn peak(&self) -> Option<(u64, f32)> {
        self.iter()
            .fold(None, |best: Option<(u64, f32)>, (hz, dbm)| match best {
                Some((_, b)) if b >= dbm => best,
                _ => Some((hz, dbm)),
            })
    }
}

// Acquisition thread -> GUI
#[derive(Clone, Debug)]
pub enum SpecanMessage {
    Frame(Frame),
    Log(String),
    Stopped,
}
