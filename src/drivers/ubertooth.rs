use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info, warn};
use rusb::{Direction, GlobalContext, Recipient, RequestType};

use crate::drivers::{DisplayRange, FrameSource, SpecanError};
use crate::types::Frame;

pub const UBERTOOTH_VID: u16 = 0xFFFF;
pub const UBERTOOTH_PID: u16 = 0x0004;

const REQUEST_STOP: u8 = 21;
const REQUEST_SPECAN: u8 = 27;
const BULK_ENDPOINT_IN: u8 = 0x82;
const PACKET_LEN: usize = 64;
const PACKET_HEADER_LEN: usize = 14;
const READ_TIMEOUT: Duration = Duration::from_millis(1000);
const CONTROL_TIMEOUT: Duration = Duration::from_millis(1000);
// CC2400 RSSI register to dBm.
const RSSI_OFFSET_DBM: f32 = -54.0;
const DEFAULT_RAW_RSSI: i8 = -128;

/// Turns raw specan packets into complete sweeps.
///
/// A packet carries a 14-byte header and then `(freq_hi, freq_lo, rssi)`
/// triplets, frequency in MHz. The dongle reports whole-MHz bins whatever
/// the display step is. A sweep is complete when the lowest bin comes round
/// again.
pub struct SweepAssembler {
    low_mhz: u16,
    high_mhz: u16,
    raw: Vec<i8>, // one per MHz, low..=high
    filled: bool,
}

impl SweepAssembler {
    pub fn new(range: &DisplayRange) -> Self {
        let (low_mhz, high_mhz) = (range.low_mhz(), range.high_mhz());
        let raw = vec![DEFAULT_RAW_RSSI; usize::from(high_mhz.saturating_sub(low_mhz)) + 1];
        Self {
            low_mhz,
            high_mhz,
            raw,
            filled: false,
        }
    }

    pub fn mhz_bounds(&self) -> (u16, u16) {
        (self.low_mhz, self.high_mhz)
    }

    /// Feeds one bulk transfer (any multiple of 64 bytes) and returns every
    /// sweep it completed.
    pub fn feed(&mut self, buffer: &[u8]) -> Vec<Frame> {
        let mut completed = Vec::new();
        for packet in buffer.chunks(PACKET_LEN) {
            if packet.len() < PACKET_HEADER_LEN {
                debug!("dropping short specan packet ({} bytes)", packet.len());
                continue;
            }
            for triplet in packet[PACKET_HEADER_LEN..].chunks_exact(3) {
                let mhz = u16::from_be_bytes([triplet[0], triplet[1]]);
                let rssi = triplet[2] as i8;
                if mhz < self.low_mhz || mhz > self.high_mhz {
                    continue;
                }
                let index = usize::from(mhz - self.low_mhz);
                if index == 0 && self.filled {
                    completed.push(self.take_frame());
                }
                self.raw[index] = rssi;
                self.filled = true;
            }
        }
        completed
    }

    fn take_frame(&mut self) -> Frame {
        let low_hz = u64::from(self.low_mhz) * 1_000_000;
        let levels: BTreeMap<u64, f32> = self
            .raw
            .iter()
            .enumerate()
            .map(|(i, &rssi)| (low_hz + i as u64 * 1_000_000, f32::from(rssi) + RSSI_OFFSET_DBM))
            .collect();
        self.raw.fill(DEFAULT_RAW_RSSI);
        self.filled = false;
        Frame::new(levels)
    }
}

/// Ubertooth One running in spectrum-analyzer mode.
pub struct Ubertooth {
    handle: rusb::DeviceHandle<GlobalContext>,
    assembler: SweepAssembler,
    pending: std::collections::VecDeque<Frame>,
    streaming: bool,
}

impl Ubertooth {
    pub fn open(vid: u16, pid: u16, range: DisplayRange) -> Result<Self, SpecanError> {
        let handle = rusb::open_device_with_vid_pid(vid, pid)
            .ok_or(SpecanError::DeviceNotFound { vid, pid })?;
        if let Ok(true) = handle.kernel_driver_active(0) {
            handle.detach_kernel_driver(0)?;
        }
        handle.claim_interface(0)?;
        info!("opened Ubertooth {vid:04x}:{pid:04x}");
        Ok(Self {
            handle,
            assembler: SweepAssembler::new(&range),
            pending: std::collections::VecDeque::new(),
            streaming: false,
        })
    }

    pub fn start_specan(&mut self, low_mhz: u16, high_mhz: u16) -> Result<(), SpecanError> {
        self.control(REQUEST_SPECAN, low_mhz, high_mhz)?;
        self.streaming = true;
        info!("specan started {low_mhz}-{high_mhz} MHz");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), SpecanError> {
        self.streaming = false;
        self.control(REQUEST_STOP, 0, 0)
    }

    fn control(&self, request: u8, value: u16, index: u16) -> Result<(), SpecanError> {
        let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        self.handle
            .write_control(request_type, request, value, index, &[], CONTROL_TIMEOUT)?;
        Ok(())
    }
}

impl FrameSource for Ubertooth {
    fn next_frame(&mut self) -> Result<Option<Frame>, SpecanError> {
        if !self.streaming {
            let (low, high) = self.assembler.mhz_bounds();
            self.start_specan(low, high)?;
        }
        let mut buffer = [0u8; PACKET_LEN];
        while self.pending.is_empty() {
            let read = match self.handle.read_bulk(BULK_ENDPOINT_IN, &mut buffer, READ_TIMEOUT) {
                Ok(read) => read,
                Err(rusb::Error::Timeout) => return Err(SpecanError::Timeout),
                Err(e) => return Err(e.into()),
            };
            self.pending.extend(self.assembler.feed(&buffer[..read]));
        }
        Ok(self.pending.pop_front())
    }
}

impl Drop for Ubertooth {
    fn drop(&mut self) {
        if self.streaming {
            if let Err(e) = self.stop() {
                warn!("failed to stop specan: {e}");
            }
        }
        self.handle.release_interface(0).ok();
    }
}
