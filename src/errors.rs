// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture/record/playback session

use std::fmt;

/// Result type alias using SessionError
pub type SessionResult<T> = Result<T, SessionError>;

/// Session and data-path error type
///
/// Control-surface failures (`InvalidDevice`, `InvalidPath`, `GraphBuildFailure`,
/// `GraphStartFailure`, `MissingSink`) are returned synchronously to the caller and
/// always leave the controller idle. `ShortBuffer` and `UnsupportedLayout` are only
/// ever reported from the frame path; the frame is dropped and the graph keeps running.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// No usable capture device is selected
    InvalidDevice,
    /// An empty or unusable file path was given
    InvalidPath,
    /// The engine could not build the graph description
    GraphBuildFailure(String),
    /// The engine refused to bring the graph to the running state
    GraphStartFailure(String),
    /// A frame buffer was smaller than its declared dimensions require
    ShortBuffer {
        /// Bytes actually present in the buffer
        actual: usize,
        /// Bytes required by width * height * bytes per pixel
        expected: usize,
    },
    /// The frame sink delivered a pixel layout other than packed RGB
    UnsupportedLayout(String),
    /// The named frame sink is missing from the built graph
    MissingSink(String),
    /// Configuration could not be read or written
    Config(String),
    /// A snapshot image could not be written
    Snapshot(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidDevice => write!(f, "No valid capture device selected"),
            SessionError::InvalidPath => write!(f, "Invalid file path"),
            SessionError::GraphBuildFailure(msg) => write!(f, "Failed to build graph: {}", msg),
            SessionError::GraphStartFailure(msg) => write!(f, "Failed to start graph: {}", msg),
            SessionError::ShortBuffer { actual, expected } => write!(
                f,
                "Buffer too small: {} bytes, expected {}",
                actual, expected
            ),
            SessionError::UnsupportedLayout(format) => {
                write!(f, "Unsupported frame layout: {}", format)
            }
            SessionError::MissingSink(name) => write!(f, "Frame sink '{}' not found", name),
            SessionError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SessionError::Snapshot(msg) => write!(f, "Failed to save snapshot: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<image::ImageError> for SessionError {
    fn from(err: image::ImageError) -> Self {
        SessionError::Snapshot(err.to_string())
    }
}
