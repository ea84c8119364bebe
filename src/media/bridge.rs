// SPDX-License-Identifier: GPL-3.0-only

//! Producer-side frame delivery
//!
//! The [`FrameBridge`] hands the engine a callback for the decoded-frame sink.
//! On every invocation (engine worker thread) it validates the buffer, copies it
//! into an owned [`Frame`], deposits that into the shared [`FrameSlot`] and pokes
//! the render thread through a [`RepaintSignal`]. Nothing on this path blocks on
//! the consumer: a slow consumer only causes older frames to be replaced.

use super::frame::{Frame, PixelLayout};
use super::slot::FrameSlot;
use crate::backends::engine::{FrameCallback, RawFrame};
use crate::constants::timing;
use crate::errors::{SessionError, SessionResult};
use futures::channel::mpsc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Non-blocking "new frame available" notification for the render thread
///
/// Backed by a zero-buffer channel with a single shared sender, so at most one
/// wakeup is ever pending; further notifications are dropped until the render
/// thread drains, and the producer never waits.
#[derive(Clone, Debug)]
pub struct RepaintSignal {
    sender: Arc<Mutex<mpsc::Sender<()>>>,
}

/// Render-thread end of a [`RepaintSignal`]
#[derive(Debug)]
pub struct RepaintReceiver {
    receiver: mpsc::Receiver<()>,
}

impl RepaintSignal {
    /// Create a connected signal/receiver pair
    pub fn channel() -> (RepaintSignal, RepaintReceiver) {
        let (sender, receiver) = mpsc::channel(0);
        let signal = RepaintSignal {
            sender: Arc::new(Mutex::new(sender)),
        };
        (signal, RepaintReceiver { receiver })
    }

    /// Request a repaint; never blocks
    pub fn notify(&self) {
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        // Full means a repaint is already pending; closed means nobody renders
        let _ = sender.try_send(());
    }
}

impl RepaintReceiver {
    /// Consume all pending wakeups, returning whether there were any
    pub fn drain(&mut self) -> bool {
        let mut pending = false;
        while self.receiver.try_recv().is_ok() {
            pending = true;
        }
        pending
    }
}

/// Data-path counters, updated from engine threads
#[derive(Debug, Default)]
pub struct BridgeStats {
    delivered: AtomicU64,
    short_buffers: AtomicU64,
    unsupported_layouts: AtomicU64,
    replaced: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeCounters {
    /// Frames deposited into the slot
    pub delivered: u64,
    /// Frames dropped because the buffer was smaller than its dimensions
    pub short_buffers: u64,
    /// Frames dropped because the pixel layout was not RGB
    pub unsupported_layouts: u64,
    /// Deposits that overwrote a frame the consumer never claimed
    pub replaced: u64,
}

impl BridgeStats {
    pub fn snapshot(&self) -> BridgeCounters {
        BridgeCounters {
            delivered: self.delivered.load(Ordering::Relaxed),
            short_buffers: self.short_buffers.load(Ordering::Relaxed),
            unsupported_layouts: self.unsupported_layouts.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
        }
    }
}

/// Moves frames from the engine's sink callback into the [`FrameSlot`]
///
/// Cloning is cheap; all clones share the slot, counters and sequence numbers.
#[derive(Clone, Debug)]
pub struct FrameBridge {
    slot: Arc<FrameSlot>,
    stats: Arc<BridgeStats>,
    sequence: Arc<AtomicU64>,
    repaint: Option<RepaintSignal>,
}

impl FrameBridge {
    pub fn new(slot: Arc<FrameSlot>) -> Self {
        Self {
            slot,
            stats: Arc::new(BridgeStats::default()),
            sequence: Arc::new(AtomicU64::new(0)),
            repaint: None,
        }
    }

    /// Notify the given signal after every successful deposit
    pub fn with_repaint(mut self, repaint: RepaintSignal) -> Self {
        self.repaint = Some(repaint);
        self
    }

    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    pub fn stats(&self) -> BridgeCounters {
        self.stats.snapshot()
    }

    /// Build the callback to register on a freshly built graph's frame sink
    pub fn frame_callback(&self) -> FrameCallback {
        let bridge = self.clone();
        Box::new(move |raw| {
            // Failures are counted and logged inside deliver; the graph keeps running
            let _ = bridge.deliver(raw);
        })
    }

    /// Validate, copy and deposit one engine frame
    ///
    /// # Returns
    /// * `Ok(sequence)` - Frame deposited under this sequence number
    /// * `Err(SessionError::ShortBuffer)` - Buffer smaller than its dimensions; dropped
    /// * `Err(SessionError::UnsupportedLayout)` - Sink negotiated a non-RGB layout; dropped
    pub fn deliver(&self, raw: RawFrame<'_>) -> SessionResult<u64> {
        let Some(layout) = PixelLayout::from_gst_format(raw.format) else {
            let count = self.stats.unsupported_layouts.fetch_add(1, Ordering::Relaxed);
            if count % timing::FRAME_LOG_INTERVAL == 0 {
                warn!(format = %raw.format, dropped = count + 1, "Unsupported frame layout, dropping frame");
            }
            return Err(SessionError::UnsupportedLayout(raw.format.to_string()));
        };

        let data = match pack_rows(&raw, layout) {
            Ok(data) => data,
            Err(err) => {
                let count = self.stats.short_buffers.fetch_add(1, Ordering::Relaxed);
                warn!(
                    error = %err,
                    width = raw.width,
                    height = raw.height,
                    dropped = count + 1,
                    "Dropping short frame buffer"
                );
                return Err(err);
            }
        };

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let frame = Frame::new(raw.width, raw.height, layout, sequence, data)?;

        if self.slot.deposit(frame) {
            self.stats.replaced.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.delivered.fetch_add(1, Ordering::Relaxed);

        if sequence % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(
                frame = sequence,
                width = raw.width,
                height = raw.height,
                "Frame delivered"
            );
        }

        if let Some(repaint) = &self.repaint {
            repaint.notify();
        }
        Ok(sequence)
    }
}

/// Copy a mapped buffer into tightly packed rows
///
/// The buffer must hold at least `width * height * bytes_per_pixel` bytes. When
/// the engine pads rows (`stride` wider than a row) the padding is stripped,
/// which additionally requires the last padded row to be complete.
/// Dimensions too large to address are reported as a short buffer.
fn pack_rows(raw: &RawFrame<'_>, layout: PixelLayout) -> SessionResult<Vec<u8>> {
    let overflow = || SessionError::ShortBuffer {
        actual: raw.data.len(),
        expected: usize::MAX,
    };
    let height = raw.height as usize;
    let row_len = (raw.width as usize)
        .checked_mul(layout.bytes_per_pixel())
        .ok_or_else(overflow)?;
    let expected = row_len.checked_mul(height).ok_or_else(overflow)?;

    if raw.data.len() < expected {
        return Err(SessionError::ShortBuffer {
            actual: raw.data.len(),
            expected,
        });
    }

    if raw.stride <= row_len || height == 0 {
        return Ok(raw.data[..expected].to_vec());
    }

    let padded = raw
        .stride
        .checked_mul(height - 1)
        .and_then(|rows| rows.checked_add(row_len))
        .ok_or_else(overflow)?;
    if raw.data.len() < padded {
        return Err(SessionError::ShortBuffer {
            actual: raw.data.len(),
            expected: padded,
        });
    }

    let mut packed = Vec::with_capacity(expected);
    for row in raw.data.chunks(raw.stride).take(height) {
        packed.extend_from_slice(&row[..row_len]);
    }
    Ok(packed)
}
