// SPDX-License-Identifier: GPL-3.0-only

//! Decoded frame handling between the media graph and the display
//!
//! Frames travel one way:
//!
//! ```text
//! engine worker thread           render thread
//! ┌──────────────┐  deposit  ┌───────────┐  take_snapshot  ┌────────────────┐
//! │ FrameBridge  │ ────────▶ │ FrameSlot │ ──────────────▶ │ DisplaySurface │
//! └──────────────┘           └───────────┘                 └────────────────┘
//!        │                                                         ▲
//!        └──────────────── RepaintSignal (try_send) ───────────────┘
//! ```
//!
//! - [`frame`]: the owned, immutable [`Frame`] value
//! - [`slot`]: single-slot overwrite buffer ([`FrameSlot`])
//! - [`bridge`]: producer-side callback and repaint notification ([`FrameBridge`])

pub mod bridge;
pub mod frame;
pub mod slot;

pub use bridge::{BridgeCounters, BridgeStats, FrameBridge, RepaintReceiver, RepaintSignal};
pub use frame::{Frame, PixelLayout};
pub use slot::FrameSlot;
