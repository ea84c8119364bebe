// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Graph construction constants
pub mod pipeline {
    /// Width every live source is normalized to
    pub const VIDEO_WIDTH: u32 = 640;

    /// Height every live source is normalized to
    pub const VIDEO_HEIGHT: u32 = 480;

    /// Capture framerate (frames per second)
    pub const VIDEO_FRAMERATE: u32 = 30;

    /// Name of the decoded-frame sink in every graph
    pub const FRAME_SINK_NAME: &str = "appsink";

    /// Name of the tee splitting the recording and display branches
    pub const TEE_NAME: &str = "t";

    /// Name of the container muxer joining audio and video
    pub const MUXER_NAME: &str = "mux";

    /// Name of the demuxer in playback graphs
    pub const DEMUXER_NAME: &str = "demux";

    /// H.264 keyframe interval for recordings
    pub const KEY_INT_MAX: u32 = 30;

    /// AAC bitrate for the recorded audio track (bits per second)
    pub const AUDIO_BITRATE: u32 = 128_000;

    /// Appsink queue depth (keep at one so stale frames are dropped upstream too)
    pub const MAX_BUFFERS: u32 = 1;

    /// Default container file written by recordings
    pub const DEFAULT_RECORDING_FILE: &str = "recording.mkv";
}

/// Pixel layout constants
pub mod pixels {
    /// Bytes per pixel of the interleaved RGB layout delivered to the display
    pub const RGB_BYTES_PER_PIXEL: usize = 3;

    /// GStreamer format name of the display layout
    pub const RGB_FORMAT: &str = "RGB";
}

/// Record volume bounds
pub mod volume {
    /// Lowest accepted gain
    pub const MIN: f64 = 0.0;

    /// Highest accepted gain (prevents excessive amplification)
    pub const MAX: f64 = 4.0;

    /// Unity gain
    pub const DEFAULT: f64 = 1.0;
}

/// Timing constants
pub mod timing {
    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// How long to wait on the bus for an immediate start error
    pub const START_ERROR_CHECK_MS: u64 = 100;

    /// Terminal redraw poll interval
    pub const UI_POLL_MS: u64 = 16;

    /// Ticks between device list refreshes in the terminal viewer
    pub const DEVICE_REFRESH_TICKS: u32 = 120;
}

/// Application information utilities
pub mod app_info {
    /// Directory name used under the config and video directories
    pub const APP_DIR: &str = "mediacentre";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
