// SPDX-License-Identifier: GPL-3.0-only

//! Session control
//!
//! ```text
//!            start_streaming            start_recording
//!   Idle ─────────────────────▶ Streaming ─────────────▶ Recording
//!    ▲  ◀──────────────────────    │ ▲    ◀─────────────     │
//!    │        stop_streaming       │ │     (device change    │
//!    │                             │ │      resumes)         │
//!    │ playback(path)              │ └───────────────────────┘
//!    ▼                             │        stop_recording → Idle
//!  Playback ◀──────────────────────┘
//! ```
//!
//! - [`controller`]: the [`SessionController`] state machine
//! - [`state`]: mode, selection and volume types plus change events

pub mod controller;
pub mod state;

pub use controller::SessionController;
pub use state::{DeviceSelection, Mode, RecordVolume, SessionEvent};
