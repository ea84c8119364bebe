// SPDX-License-Identifier: GPL-3.0-only

//! Media execution engine abstraction
//!
//! The engine takes a textual graph description, builds it, and runs it. The
//! controller only ever talks to these traits; [`GstEngine`] is the
//! production implementation.

pub mod pipeline;

pub use pipeline::GstEngine;

use crate::errors::SessionResult;

/// Target state for a built graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Data is flowing
    Playing,
    /// All resources released (devices closed)
    ///
    /// Going straight to `Null` does not flush pending output; call
    /// [`EngineGraph::finalize`] first when a file is being written.
    Null,
}

/// Borrowed view of one frame as the engine hands it to the frame sink
///
/// Only valid for the duration of the callback; the engine may recycle the
/// memory as soon as the callback returns.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    /// Mapped buffer contents
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Bytes per row in `data` (0 when the engine does not report it)
    pub stride: usize,
    /// Engine pixel format tag (e.g., "RGB")
    pub format: &'a str,
}

/// Per-sink callback, invoked once per produced frame on an engine thread
///
/// Invocations for one sink are serialized by the engine.
pub type FrameCallback = Box<dyn FnMut(RawFrame<'_>) + Send + 'static>;

/// Execution engine collaborator
pub trait MediaEngine {
    /// Build a graph from its textual description
    ///
    /// # Returns
    /// * `Ok(graph)` - Graph built, in the `Null` state
    /// * `Err(SessionError::GraphBuildFailure)` - Description rejected
    fn launch(&mut self, description: &str) -> SessionResult<Box<dyn EngineGraph>>;
}

/// A built graph owned by exactly one controller
///
/// Dropping a graph must bring it to `Null` and release the frame callback.
pub trait EngineGraph: Send {
    /// Register the callback on the named decoded-frame sink
    ///
    /// Fails with `MissingSink` when the graph has no element of that name.
    fn connect_frame_sink(&mut self, name: &str, callback: FrameCallback) -> SessionResult<()>;

    /// Remove any registered frame callback
    fn disconnect_frame_sink(&mut self);

    /// Transition the graph, waiting within the engine's own timeout
    ///
    /// Fails with `GraphStartFailure` when the engine refuses the transition.
    fn set_state(&mut self, state: GraphState) -> SessionResult<()>;

    /// Send end of stream and wait for every output to flush it
    ///
    /// Muxed files are only complete (seekable, with an index) once the muxer
    /// has seen end of stream. Graphs without file outputs have nothing to do.
    fn finalize(&mut self) -> SessionResult<()> {
        Ok(())
    }

    /// Whether the graph has reached end of stream (playback finished)
    fn is_finished(&self) -> bool {
        false
    }
}
