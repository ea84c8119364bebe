// SPDX-License-Identifier: GPL-3.0-only

//! gst-launch serialization of graph descriptions
//!
//! This is the only place that knows GStreamer element names and launch
//! syntax. Stages are joined with ` ! `, branches with a space, and named
//! elements are referenced as `name.`.

use super::graph::{GraphDescription, RawVideoFormat, Stage};
use std::path::Path;

/// Converts a graph description into engine syntax
pub trait GraphSerializer {
    fn serialize(&self, graph: &GraphDescription) -> String;
}

/// Which capture elements back the live sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePlatform {
    /// Media Foundation camera (YUY2 capture) and WASAPI microphone
    Windows,
    /// V4L2 camera (`/dev/videoN`) and ALSA microphone
    Linux,
    /// Synthetic test pattern and tone, no hardware needed
    Test,
}

impl SourcePlatform {
    /// Platform matching the build target
    pub fn native() -> Self {
        if cfg!(windows) {
            SourcePlatform::Windows
        } else {
            SourcePlatform::Linux
        }
    }
}

impl Default for SourcePlatform {
    fn default() -> Self {
        Self::native()
    }
}

/// Serializer producing `gst_parse_launch` descriptions
#[derive(Debug, Clone, Copy, Default)]
pub struct GstLaunchSerializer {
    platform: SourcePlatform,
}

impl GstLaunchSerializer {
    pub fn new(platform: SourcePlatform) -> Self {
        Self { platform }
    }

    fn stage(&self, stage: &Stage) -> String {
        match stage {
            Stage::VideoSource { device } => match self.platform {
                SourcePlatform::Windows => format!("mfvideosrc device-index={}", device),
                SourcePlatform::Linux => format!("v4l2src device=/dev/video{}", device),
                SourcePlatform::Test => "videotestsrc is-live=true".to_string(),
            },
            Stage::AudioSource => match self.platform {
                SourcePlatform::Windows => "wasapisrc".to_string(),
                SourcePlatform::Linux => "alsasrc".to_string(),
                SourcePlatform::Test => "audiotestsrc is-live=true".to_string(),
            },
            Stage::FileSource { path } => format!("filesrc location={}", quote_path(path)),
            Stage::RawVideo {
                format,
                width,
                height,
                framerate,
            } => {
                let mut caps = String::from("video/x-raw");
                let format_name = match (format, self.platform) {
                    (RawVideoFormat::Capture, SourcePlatform::Windows) => Some("YUY2"),
                    _ => format.gst_name(),
                };
                if let Some(name) = format_name {
                    caps.push_str(&format!(",format={}", name));
                }
                if let Some(w) = width {
                    caps.push_str(&format!(",width={}", w));
                }
                if let Some(h) = height {
                    caps.push_str(&format!(",height={}", h));
                }
                if let Some(fps) = framerate {
                    caps.push_str(&format!(",framerate={}/1", fps));
                }
                caps
            }
            Stage::VideoConvert => "videoconvert".to_string(),
            Stage::Tee { name } => format!("tee name={}", name),
            Stage::Queue { leaky: true } => "queue leaky=downstream".to_string(),
            Stage::Queue { leaky: false } => "queue".to_string(),
            Stage::H264Encode { key_int_max } => {
                format!("x264enc tune=zerolatency key-int-max={}", key_int_max)
            }
            Stage::MatroskaMux { name } => format!("matroskamux name={}", name),
            Stage::MatroskaDemux { name } => format!("matroskademux name={}", name),
            Stage::FileSink { path } => format!("filesink location={}", quote_path(path)),
            Stage::Decode => "decodebin".to_string(),
            Stage::AudioConvert => "audioconvert".to_string(),
            Stage::Volume { gain } => format!("volume volume={}", gain),
            Stage::AacEncode { bitrate } => format!("avenc_aac bitrate={}", bitrate),
            Stage::AudioOutput => "autoaudiosink".to_string(),
            Stage::FrameSink { name, sync } => {
                format!("appsink name={} sync={}", name, sync)
            }
            Stage::Pad { element } => format!("{}.", element),
        }
    }
}

impl GraphSerializer for GstLaunchSerializer {
    fn serialize(&self, graph: &GraphDescription) -> String {
        graph
            .branches
            .iter()
            .map(|branch| {
                branch
                    .stages
                    .iter()
                    .map(|stage| self.stage(stage))
                    .collect::<Vec<_>>()
                    .join(" ! ")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quote a path for launch syntax, escaping backslashes and quotes
fn quote_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
