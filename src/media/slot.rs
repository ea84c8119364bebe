// SPDX-License-Identifier: GPL-3.0-only

//! Single-slot, overwrite-on-arrival frame buffer
//!
//! Holds at most one [`Frame`]. A deposit while the previous frame is still
//! unclaimed replaces it, so memory stays bounded at one frame no matter how far
//! the consumer lags. The lock only covers moving a value in or out; dropping
//! the replaced frame and any upload work happen outside it.

use super::frame::Frame;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Most-recent-wins frame slot shared between producer and render thread
#[derive(Debug, Default)]
pub struct FrameSlot {
    current: Mutex<Option<Frame>>,
    deposited: AtomicU64,
    replaced: AtomicU64,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a frame, discarding any unclaimed one
    ///
    /// Returns `true` when an unclaimed frame was replaced.
    pub fn deposit(&self, frame: Frame) -> bool {
        let stale = self.lock().replace(frame);
        self.deposited.fetch_add(1, Ordering::Relaxed);

        match stale {
            Some(_) => {
                self.replaced.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Move the latest frame out, leaving the slot empty
    pub fn take_snapshot(&self) -> Option<Frame> {
        self.lock().take()
    }

    /// Whether a frame is waiting to be claimed
    pub fn has_frame(&self) -> bool {
        self.lock().is_some()
    }

    /// Drop any unclaimed frame
    pub fn clear(&self) {
        let stale = self.lock().take();
        drop(stale);
    }

    /// Total frames ever deposited
    pub fn deposited_count(&self) -> u64 {
        self.deposited.load(Ordering::Relaxed)
    }

    /// Frames that were overwritten before anyone claimed them
    pub fn replaced_count(&self) -> u64 {
        self.replaced.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Frame>> {
        // A panic while holding the guard cannot leave a half-written Option
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
