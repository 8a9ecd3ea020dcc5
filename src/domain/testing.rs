//! In-memory sink used by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{Frame, FrameSink};
use crate::error::SinkError;

/// Records every frame; can be switched to fail on the next writes.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<Frame>>>,
    failure: Arc<Mutex<Option<SinkError>>>,
    attempts: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl RecordingSink {
    /// Makes every following write fail with `err`.
    pub fn fail_with(&self, err: SinkError) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    /// Frames written so far.
    pub fn frames(&self) -> Vec<Frame> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Frames that carry an application event (no handshake, no heartbeat).
    pub fn events(&self) -> Vec<Frame> {
        self.frames()
            .into_iter()
            .filter(|f| matches!(f, Frame::Event { .. }))
            .collect()
    }

    /// Number of write attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of `close` calls.
    pub fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl FrameSink for RecordingSink {
    fn send(&mut self, frame: Frame) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = *self.failure.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(err);
        }
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame);
        Ok(())
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
