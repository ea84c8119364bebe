// SPDX-License-Identifier: GPL-3.0-only

//! Owned decoded video frame

use crate::constants::pixels;
use crate::errors::{SessionError, SessionResult};
use std::sync::Arc;
use std::time::Instant;

/// Pixel layout of a decoded frame
///
/// The display path is fixed to interleaved 8-bit RGB triplets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelLayout {
    /// Interleaved R, G, B bytes (GStreamer "RGB")
    #[default]
    Rgb24,
}

impl PixelLayout {
    /// Bytes used by a single pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelLayout::Rgb24 => pixels::RGB_BYTES_PER_PIXEL,
        }
    }

    /// Map an engine format tag to a supported layout
    pub fn from_gst_format(format: &str) -> Option<Self> {
        match format {
            "RGB" => Some(PixelLayout::Rgb24),
            _ => None,
        }
    }
}

/// One decoded image with its dimensions
///
/// The pixel buffer is tightly packed (no row padding) and never mutated after
/// construction, so width, height and data always agree.
#[derive(Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    layout: PixelLayout,
    sequence: u64,
    data: Arc<[u8]>,
    captured_at: Instant,
}

impl Frame {
    /// Build a frame from tightly packed pixel data
    ///
    /// Extra trailing bytes are cut off; a buffer shorter than
    /// `width * height * bytes_per_pixel` is rejected with `ShortBuffer`, as are
    /// dimensions whose byte length does not fit in memory.
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        sequence: u64,
        data: Vec<u8>,
    ) -> SessionResult<Self> {
        let expected =
            Self::packed_len(width, height, layout).ok_or(SessionError::ShortBuffer {
                actual: data.len(),
                expected: usize::MAX,
            })?;
        if data.len() < expected {
            return Err(SessionError::ShortBuffer {
                actual: data.len(),
                expected,
            });
        }

        let mut data = data;
        data.truncate(expected);

        Ok(Self {
            width,
            height,
            layout,
            sequence,
            data: Arc::from(data),
            captured_at: Instant::now(),
        })
    }

    /// Byte length of a tightly packed frame of these dimensions
    ///
    /// `None` when the length overflows `usize`.
    pub fn packed_len(width: u32, height: u32, layout: PixelLayout) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(layout.bytes_per_pixel())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Position of this frame in delivery order
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// When the frame was copied out of the engine buffer
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Bytes per row
    pub fn row_len(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .field("sequence", &self.sequence)
            .field("bytes", &self.data.len())
            .finish()
    }
}
