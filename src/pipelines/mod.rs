// SPDX-License-Identifier: GPL-3.0-only

//! Graph descriptions for streaming, recording and playback
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌────────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Mode + inputs  │ ──▶ │  graph::build     │ ──▶ │ GraphDescription │
//! │ (device, vol,  │     │  (pure, stage     │     │ (branches of     │
//! │  paths)        │     │   lists per mode) │     │  Stage values)   │
//! └────────────────┘     └───────────────────┘     └────────┬─────────┘
//!                                                           │
//!                        ┌───────────────────┐              │
//!      gst-launch text ◀─│ GstLaunchSerializer│◀────────────┘
//!                        └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`graph`]: engine-independent description of each mode's graph
//! - [`launch`]: serializer adapter producing GStreamer launch syntax

pub mod graph;
pub mod launch;

pub use graph::{Branch, GraphDescription, GraphInputs, RawVideoFormat, Stage, build};
pub use launch::{GraphSerializer, GstLaunchSerializer, SourcePlatform};
