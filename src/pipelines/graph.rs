// SPDX-License-Identifier: GPL-3.0-only

//! Mode-specific graph descriptions
//!
//! [`build`] turns a mode plus its inputs into an engine-independent list of
//! branches, each an ordered list of [`Stage`]s. It is a pure function: the
//! same inputs always give the same description. Turning the description into
//! engine syntax is the job of [`super::launch`].
//!
//! ```text
//! Streaming   source ─ caps ─ convert ─ RGB ─ queue ─ frame sink
//!
//! Recording   source ─ caps ─ convert ─ I420 ─ tee ─ queue ─ h264 ─ mux ─ file
//!                                              └── queue ─ convert ─ RGB ─ queue ─ frame sink
//!             audio ─ convert ─ volume ─ aac ─ queue ──┘ (into mux)
//!
//! Playback    file ─ demux ┬─ queue ─ decode ─ convert ─ RGB ─ frame sink
//!                          └─ queue ─ decode ─ audio convert ─ audio out
//! ```

use crate::constants::{pipeline, pixels};
use crate::errors::{SessionError, SessionResult};
use crate::session::state::{DeviceSelection, Mode, RecordVolume};
use std::path::{Path, PathBuf};

/// Raw video caps constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawVideoFormat {
    /// Whatever the capture device natively delivers (chosen by the serializer)
    Capture,
    /// Planar YUV 4:2:0, the encoder input
    I420,
    /// Interleaved RGB, the display layout
    Rgb,
}

impl RawVideoFormat {
    /// Engine format name, if the format is fixed
    pub fn gst_name(&self) -> Option<&'static str> {
        match self {
            RawVideoFormat::Capture => None,
            RawVideoFormat::I420 => Some("I420"),
            RawVideoFormat::Rgb => Some(pixels::RGB_FORMAT),
        }
    }
}

/// One processing stage of a branch
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Live camera by enumerated index
    VideoSource { device: u32 },
    /// Default live microphone
    AudioSource,
    /// Container file input
    FileSource { path: PathBuf },
    /// Raw video caps filter
    RawVideo {
        format: RawVideoFormat,
        width: Option<u32>,
        height: Option<u32>,
        framerate: Option<u32>,
    },
    /// Pixel format normalization
    VideoConvert,
    /// Stream splitter, referenced by name from other branches
    Tee { name: &'static str },
    /// Thread boundary; a leaky queue drops old buffers instead of blocking
    Queue { leaky: bool },
    /// Low-latency H.264 encoder
    H264Encode { key_int_max: u32 },
    /// Matroska muxer, referenced by name from other branches
    MatroskaMux { name: &'static str },
    /// Matroska demuxer, referenced by name from other branches
    MatroskaDemux { name: &'static str },
    /// Container file output
    FileSink { path: PathBuf },
    /// Automatic decoder selection
    Decode,
    AudioConvert,
    /// Audio gain
    Volume { gain: f64 },
    /// AAC encoder
    AacEncode { bitrate: u32 },
    /// Default audio output device
    AudioOutput,
    /// Decoded-frame sink delivering frames to the application
    FrameSink { name: &'static str, sync: bool },
    /// Link to/from a named element declared in another branch
    Pad { element: &'static str },
}

/// An ordered chain of stages
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Branch {
    pub stages: Vec<Stage>,
}

impl Branch {
    fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }
}

/// Complete description of one graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphDescription {
    pub mode: Mode,
    pub branches: Vec<Branch>,
}

impl GraphDescription {
    /// All stages across branches, in declaration order
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.branches.iter().flat_map(|b| b.stages.iter())
    }

    /// Name of the decoded-frame sink, if the graph has one
    pub fn frame_sink_name(&self) -> Option<&'static str> {
        self.stages().find_map(|stage| match stage {
            Stage::FrameSink { name, .. } => Some(*name),
            _ => None,
        })
    }

    /// Audio gain applied by the graph, if any
    pub fn audio_gain(&self) -> Option<f64> {
        self.stages().find_map(|stage| match stage {
            Stage::Volume { gain } => Some(*gain),
            _ => None,
        })
    }

    /// File the graph writes to, if any
    pub fn output_path(&self) -> Option<&Path> {
        self.stages().find_map(|stage| match stage {
            Stage::FileSink { path } => Some(path.as_path()),
            _ => None,
        })
    }
}

/// Inputs the description depends on besides the mode
#[derive(Debug, Clone, Copy)]
pub struct GraphInputs<'a> {
    pub device: DeviceSelection,
    pub volume: RecordVolume,
    /// Container written in `Recording`
    pub recording_path: &'a Path,
    /// Container read in `Playback`
    pub playback_path: Option<&'a Path>,
}

/// Build the description for a mode
///
/// # Returns
/// * `Err(SessionError::InvalidDevice)` - Live mode without a selected device
/// * `Err(SessionError::InvalidPath)` - Empty recording or playback path
/// * `Err(SessionError::GraphBuildFailure)` - `Idle` has no graph
pub fn build(mode: Mode, inputs: &GraphInputs<'_>) -> SessionResult<GraphDescription> {
    let branches = match mode {
        Mode::Idle => {
            return Err(SessionError::GraphBuildFailure(
                "Idle mode has no graph".to_string(),
            ));
        }
        Mode::Streaming => {
            let device = inputs.device.index().ok_or(SessionError::InvalidDevice)?;
            streaming_branches(device)
        }
        Mode::Recording => {
            let device = inputs.device.index().ok_or(SessionError::InvalidDevice)?;
            let output = non_empty(Some(inputs.recording_path))?;
            recording_branches(device, inputs.volume, output)
        }
        Mode::Playback => {
            let path = non_empty(inputs.playback_path)?;
            playback_branches(path)
        }
    };

    Ok(GraphDescription { mode, branches })
}

fn non_empty(path: Option<&Path>) -> SessionResult<PathBuf> {
    match path {
        Some(p) if !p.as_os_str().is_empty() => Ok(p.to_path_buf()),
        _ => Err(SessionError::InvalidPath),
    }
}

fn capture_caps() -> Stage {
    Stage::RawVideo {
        format: RawVideoFormat::Capture,
        width: Some(pipeline::VIDEO_WIDTH),
        height: Some(pipeline::VIDEO_HEIGHT),
        framerate: Some(pipeline::VIDEO_FRAMERATE),
    }
}

fn format_caps(format: RawVideoFormat) -> Stage {
    Stage::RawVideo {
        format,
        width: None,
        height: None,
        framerate: None,
    }
}

fn frame_sink(sync: bool) -> Stage {
    Stage::FrameSink {
        name: pipeline::FRAME_SINK_NAME,
        sync,
    }
}

fn streaming_branches(device: u32) -> Vec<Branch> {
    vec![Branch::new(vec![
        Stage::VideoSource { device },
        capture_caps(),
        Stage::VideoConvert,
        format_caps(RawVideoFormat::Rgb),
        Stage::Queue { leaky: false },
        frame_sink(false),
    ])]
}

fn recording_branches(device: u32, volume: RecordVolume, output: PathBuf) -> Vec<Branch> {
    let encode = Branch::new(vec![
        Stage::VideoSource { device },
        capture_caps(),
        Stage::VideoConvert,
        format_caps(RawVideoFormat::I420),
        Stage::Tee {
            name: pipeline::TEE_NAME,
        },
        Stage::Queue { leaky: true },
        Stage::H264Encode {
            key_int_max: pipeline::KEY_INT_MAX,
        },
        Stage::MatroskaMux {
            name: pipeline::MUXER_NAME,
        },
        Stage::FileSink { path: output },
    ]);

    let display = Branch::new(vec![
        Stage::Pad {
            element: pipeline::TEE_NAME,
        },
        Stage::Queue { leaky: false },
        Stage::VideoConvert,
        format_caps(RawVideoFormat::Rgb),
        Stage::Queue { leaky: false },
        frame_sink(false),
    ]);

    let audio = Branch::new(vec![
        Stage::AudioSource,
        Stage::AudioConvert,
        Stage::Volume { gain: volume.get() },
        Stage::AacEncode {
            bitrate: pipeline::AUDIO_BITRATE,
        },
        Stage::Queue { leaky: false },
        Stage::Pad {
            element: pipeline::MUXER_NAME,
        },
    ]);

    vec![encode, display, audio]
}

fn playback_branches(path: PathBuf) -> Vec<Branch> {
    let demux = Branch::new(vec![
        Stage::FileSource { path },
        Stage::MatroskaDemux {
            name: pipeline::DEMUXER_NAME,
        },
    ]);

    let video = Branch::new(vec![
        Stage::Pad {
            element: pipeline::DEMUXER_NAME,
        },
        Stage::Queue { leaky: false },
        Stage::Decode,
        Stage::VideoConvert,
        format_caps(RawVideoFormat::Rgb),
        frame_sink(true),
    ]);

    let audio = Branch::new(vec![
        Stage::Pad {
            element: pipeline::DEMUXER_NAME,
        },
        Stage::Queue { leaky: false },
        Stage::Decode,
        Stage::AudioConvert,
        Stage::AudioOutput,
    ]);

    vec![demux, video, audio]
}
