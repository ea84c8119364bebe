// SPDX-License-Identifier: GPL-3.0-only

//! Render-thread consumer of the frame slot
//!
//! A [`DisplaySurface`] is driven once per repaint. It claims the latest frame
//! from the [`FrameSlot`], keeps its own copy, and hands it to a
//! [`TextureSink`] for upload. Nothing is uploaded when the slot is empty, so
//! the previous texture stays on screen (or nothing is drawn if no frame ever
//! arrived).
//!
//! - [`texture`]: [`ImageTexture`], an in-memory RGB texture with PNG snapshots
//! - [`terminal`]: half-block ratatui widget that draws an [`ImageTexture`]

pub mod terminal;
pub mod texture;

pub use terminal::{FrameWidget, StatusBar};
pub use texture::ImageTexture;

use crate::media::{Frame, FrameSlot};
use std::sync::Arc;
use tracing::debug;

/// Presentation options applied at upload time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Flip the image left to right (selfie view)
    pub mirror_horizontally: bool,
    /// Filter when scaling instead of picking the nearest pixel
    pub smooth_scaling: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            mirror_horizontally: true,
            smooth_scaling: true,
        }
    }
}

/// What a repaint did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaintOutcome {
    /// No frame has ever been shown
    Idle,
    /// No new frame; the previous texture stays
    Kept,
    /// A frame was uploaded
    Updated,
}

/// Destination for decoded frames on the render side
pub trait TextureSink {
    /// Replace the texture contents with `frame`
    fn upload(&mut self, frame: &Frame, options: &DisplayOptions);

    /// Flag the render node as needing a redraw
    fn mark_dirty(&mut self);
}

/// Pulls frames from the slot and feeds a texture sink
pub struct DisplaySurface<S: TextureSink> {
    slot: Arc<FrameSlot>,
    sink: S,
    options: DisplayOptions,
    last_frame: Option<Frame>,
    options_changed: bool,
}

impl<S: TextureSink> DisplaySurface<S> {
    pub fn new(slot: Arc<FrameSlot>, sink: S) -> Self {
        Self {
            slot,
            sink,
            options: DisplayOptions::default(),
            last_frame: None,
            options_changed: false,
        }
    }

    pub fn with_options(mut self, options: DisplayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> DisplayOptions {
        self.options
    }

    /// Returns `true` if the value changed
    pub fn set_mirror_horizontally(&mut self, mirror: bool) -> bool {
        if self.options.mirror_horizontally == mirror {
            return false;
        }
        self.options.mirror_horizontally = mirror;
        self.options_changed = true;
        true
    }

    /// Returns `true` if the value changed
    pub fn set_smooth_scaling(&mut self, smooth: bool) -> bool {
        if self.options.smooth_scaling == smooth {
            return false;
        }
        self.options.smooth_scaling = smooth;
        self.options_changed = true;
        true
    }

    /// Claim the latest frame, if any, and upload it
    ///
    /// Safe to call when no frame has ever been deposited. When options
    /// changed since the last upload, the retained frame is uploaded again.
    pub fn repaint(&mut self) -> RepaintOutcome {
        let frame = match self.slot.take_snapshot() {
            Some(frame) => frame,
            None => {
                let Some(frame) = self.last_frame.clone() else {
                    return RepaintOutcome::Idle;
                };
                if !self.options_changed {
                    return RepaintOutcome::Kept;
                }
                frame
            }
        };

        self.sink.upload(&frame, &self.options);
        self.sink.mark_dirty();
        self.options_changed = false;
        debug!(
            sequence = frame.sequence(),
            latency_ms = frame.captured_at().elapsed().as_millis() as u64,
            "Frame uploaded"
        );
        self.last_frame = Some(frame);
        RepaintOutcome::Updated
    }

    /// Most recently uploaded frame
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Forget the retained frame (e.g. after the session went idle)
    pub fn reset(&mut self) {
        self.last_frame = None;
        self.options_changed = false;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
