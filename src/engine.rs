// src/engine.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::drivers::FrameSource;
use crate::types::SpecanMessage;

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// Background reader: pulls sweeps from a source and hands each one to a
/// callback. The callback is the only link back to the UI.
pub struct AcquisitionThread {
    stop: Arc<AtomicBool>,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl AcquisitionThread {
    pub fn spawn<S, F>(mut source: S, mut on_event: F) -> std::io::Result<Self>
    where
        S: FrameSource + Send + 'static,
        F: FnMut(SpecanMessage) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = channel();
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("specan-acquisition".into())
            .spawn(move || {
                info!("acquisition thread started");
                let mut frames: u64 = 0;
                while !flag.load(Ordering::Relaxed) {
                    match source.next_frame() {
                        Ok(Some(frame)) => {
                            frames += 1;
                            debug!("sweep {frames}: {} bins", frame.len());
                            on_event(SpecanMessage::Frame(frame));
                        }
                        Ok(None) => {
                            info!("frame source ended after {frames} sweeps");
                            on_event(SpecanMessage::Log("Source ended".to_owned()));
                            break;
                        }
                        Err(e) if e.is_timeout() => continue,
                        Err(e) => {
                            error!("acquisition failed: {e}");
                            on_event(SpecanMessage::Log(format!("Acquisition failed: {e}")));
                            break;
                        }
                    }
                }
                on_event(SpecanMessage::Stopped);
                done_tx.send(()).ok();
                info!("acquisition thread stopped");
            })?;
        Ok(Self {
            stop,
            done,
            handle: Some(handle),
        })
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Raises the stop flag and waits up to `timeout` for the thread.
    /// Returns `false` if it did not finish in time; it is then left detached.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return true;
        };
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("acquisition thread panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("acquisition thread still blocked after {timeout:?}, detaching");
                false
            }
        }
    }
}

impl Drop for AcquisitionThread {
    fn drop(&mut self) {
        self.stop(DEFAULT_STOP_TIMEOUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{DisplayRange, ManualSource, SimulatedSource, SpecanError};
    use crate::types::Frame;
    use std::sync::mpsc::Sender;

    fn forward(tx: Sender<SpecanMessage>) -> impl FnMut(SpecanMessage) + Send + 'static {
        move |msg| {
            tx.send(msg).ok();
        }
    }

    #[test]
    fn delivers_frames_then_stopped() {
        let frames = (0..5).map(|i| Frame::from_pairs([(2_400_000_000, -(i as f32))]));
        let (tx, rx) = channel();
        let mut thread = AcquisitionThread::spawn(ManualSource::new(frames), forward(tx)).unwrap();
        let mut seen = Vec::new();
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                SpecanMessage::Frame(f) => seen.push(f.get(2_400_000_000).unwrap()),
                SpecanMessage::Log(_) => {}
                SpecanMessage::Stopped => break,
            }
        }
        assert_eq!(seen, vec![0.0, -1.0, -2.0, -3.0, -4.0]);
        assert!(thread.stop(Duration::from_secs(1)));
    }

    #[test]
    fn stop_flag_ends_endless_source() {
        let source = SimulatedSource::seeded(DisplayRange::default(), Duration::from_millis(1), 1);
        let (tx, rx) = channel();
        let mut thread = AcquisitionThread::spawn(source, forward(tx)).unwrap();
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            SpecanMessage::Frame(_)
        ));
        assert!(thread.stop(Duration::from_secs(3)));
        assert!(!thread.is_running());
        assert!(rx.iter().any(|m| matches!(m, SpecanMessage::Stopped)));
    }

    struct Failing;
    impl FrameSource for Failing {
        fn next_frame(&mut self) -> Result<Option<Frame>, SpecanError> {
            Err(SpecanError::Usb(rusb::Error::NoDevice))
        }
    }

    #[test]
    fn hard_error_is_reported_and_ends_thread() {
        let (tx, rx) = channel();
        let _thread = AcquisitionThread::spawn(Failing, forward(tx)).unwrap();
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, SpecanMessage::Log(ref s) if s.contains("Acquisition failed")));
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            SpecanMessage::Stopped
        ));
    }

    struct Timeouts(u32);
    impl FrameSource for Timeouts {
        fn next_frame(&mut self) -> Result<Option<Frame>, SpecanError> {
            if self.0 == 0 {
                return Ok(None);
            }
            self.0 -= 1;
            Err(SpecanError::Timeout)
        }
    }

    /// Blocks far longer than any stop timeout used here.
    struct Stuck;
    impl FrameSource for Stuck {
        fn next_frame(&mut self) -> Result<Option<Frame>, SpecanError> {
            std::thread::sleep(Duration::from_secs(2));
            Ok(None)
        }
    }

    #[test]
    fn blocked_source_is_detached_after_timeout() {
        let (tx, _rx) = channel();
        let mut thread = AcquisitionThread::spawn(Stuck, forward(tx)).unwrap();
        assert!(thread.is_running());
        let started = std::time::Instant::now();
        assert!(!thread.stop(Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(1));
        // handle already given up: a second stop has nothing to wait for
        assert!(thread.stop(Duration::from_millis(10)));
    }

    #[test]
    fn timeouts_keep_polling() {
        let (tx, rx) = channel();
        let _thread = AcquisitionThread::spawn(Timeouts(3), forward(tx)).unwrap();
        let msgs: Vec<SpecanMessage> = rx.iter().collect();
        assert!(matches!(msgs.last(), Some(SpecanMessage::Stopped)));
        assert!(matches!(&msgs[0], SpecanMessage::Log(s) if s == "Source ended"));
    }
}
