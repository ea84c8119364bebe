// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for the media engine and capture devices
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             SessionController                │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │   MediaEngine    │  │ DeviceEnumerator│  │
//! │  │   (GStreamer)    │  │   (GStreamer)   │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Both collaborators sit behind traits so the controller can be driven by an
//! in-memory engine in tests.

pub mod devices;
pub mod engine;

pub use devices::{DeviceEnumerator, GstDeviceEnumerator, StaticDevices};
pub use engine::{EngineGraph, FrameCallback, GraphState, MediaEngine, RawFrame};
