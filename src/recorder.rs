use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::types::Frame;

/// Appends one CSV row of dBm values per sweep.
pub struct SweepRecorder {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
    header_written: bool,
    rows: u64,
}

impl Default for SweepRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepRecorder {
    pub fn new() -> Self {
        Self {
            writer: None,
            path: None,
            header_written: false,
            rows: 0,
        }
    }

    pub fn start(&mut self, dir: &Path, label: &str) -> std::io::Result<PathBuf> {
        self.stop()?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let path = dir.join(format!("sweeps_{}_{}.csv", sanitize(label), timestamp));
        let file = File::create(&path)?;
        self.writer = Some(BufWriter::new(file));
        self.path = Some(path.clone());
        self.header_written = false;
        self.rows = 0;
        info!("recording sweeps to {}", path.display());
        Ok(path)
    }

    pub fn stop(&mut self) -> std::io::Result<()> {
        if let Some(mut w) = self.writer.take() {
            w.flush()?;
            info!("recording saved ({} sweeps)", self.rows);
        }
        self.path = None;
        Ok(())
    }

    /// Write failures end the recording before being returned.
    pub fn write_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        let Some(w) = &mut self.writer else {
            return Ok(());
        };
        let result = write_row(w, frame, !self.header_written);
        match result {
            Ok(()) => {
                self.header_written = true;
                self.rows += 1;
                Ok(())
            }
            Err(e) => {
                self.writer = None;
                self.path = None;
                Err(e)
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.writer.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }
}

fn write_row(w: &mut impl Write, frame: &Frame, header: bool) -> std::io::Result<()> {
    if header {
        write!(w, "timestamp")?;
        for hz in frame.frequencies() {
            write!(w, ",{hz}")?;
        }
        writeln!(w)?;
    }
    let t = frame
        .captured_at
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    write!(w, "{t:.3}")?;
    for (_, dbm) in frame.iter() {
        write!(w, ",{dbm:.1}")?;
    }
    writeln!(w)
}

fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "capture".to_owned()
    } else {
        cleaned
    }
}
