// SPDX-License-Identifier: GPL-3.0-only

//! In-memory RGB texture

use super::{DisplayOptions, TextureSink};
use crate::errors::{SessionError, SessionResult};
use crate::media::Frame;
use image::{RgbImage, imageops};
use std::path::Path;
use tracing::info;

/// Texture sink backed by an [`RgbImage`]
///
/// Mirroring is baked into the pixels at upload time; the scaling filter is
/// remembered for whoever draws the image.
#[derive(Debug, Default)]
pub struct ImageTexture {
    image: Option<RgbImage>,
    smooth_scaling: bool,
    dirty: bool,
    uploads: u64,
}

impl ImageTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    /// Filter to use when scaling this texture for display
    pub fn filter(&self) -> imageops::FilterType {
        if self.smooth_scaling {
            imageops::FilterType::Triangle
        } else {
            imageops::FilterType::Nearest
        }
    }

    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    /// Clear and return the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Write the current texture as a PNG
    pub fn save_snapshot(&self, path: &Path) -> SessionResult<()> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| SessionError::Snapshot("no frame has been displayed".to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Snapshot(e.to_string()))?;
        }

        image.save_with_format(path, image::ImageFormat::Png)?;
        info!(path = %path.display(), "Snapshot saved");
        Ok(())
    }
}

impl TextureSink for ImageTexture {
    fn upload(&mut self, frame: &Frame, options: &DisplayOptions) {
        // Frame data is always tightly packed RGB of exactly width * height * 3
        let Some(mut image) =
            RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        else {
            return;
        };

        if options.mirror_horizontally {
            imageops::flip_horizontal_in_place(&mut image);
        }

        self.image = Some(image);
        self.smooth_scaling = options.smooth_scaling;
        self.uploads += 1;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
