// SPDX-License-Identifier: GPL-3.0-only

//! Media Centre - webcam streaming, recording and playback
//!
//! This library provides a session controller that builds and tears down a
//! media graph for each operating mode, and a bridge that moves decoded frames
//! from the engine's worker threads to a render thread.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: Mode state machine owning the running graph
//! - [`pipelines`]: Graph descriptions per mode and their launch syntax
//! - [`backends`]: Media engine and device enumeration behind traits
//! - [`media`]: Frames, the single-frame slot and the frame bridge
//! - [`display`]: Render-side consumer, textures and terminal drawing
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let (signal, repaint) = RepaintSignal::channel();
//! let bridge = FrameBridge::new(Arc::new(FrameSlot::new())).with_repaint(signal);
//! let mut session = SessionController::new(
//!     Box::new(GstEngine::new()?),
//!     Box::new(GstDeviceEnumerator::new()),
//!     bridge,
//! );
//! session.start_streaming()?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod display;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod session;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use display::{DisplayOptions, DisplaySurface, ImageTexture, RepaintOutcome, TextureSink};
pub use errors::{SessionError, SessionResult};
pub use media::{Frame, FrameBridge, FrameSlot, PixelLayout, RepaintSignal};
pub use session::{Mode, SessionController, SessionEvent};
