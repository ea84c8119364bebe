// SPDX-License-Identifier: GPL-3.0-only

//! Capture/record/playback session controller
//!
//! Owns the single running graph and the mode it belongs to. Every call that
//! starts a graph first tears down whatever is running, so at most one graph
//! exists at any time regardless of the entry point. Engine failures never
//! escape as panics: they are returned to the caller, reported as
//! [`SessionEvent::Error`], and leave the controller in [`Mode::Idle`].

use super::state::{DeviceSelection, Mode, Observable, RecordVolume, SessionEvent};
use crate::backends::devices::DeviceEnumerator;
use crate::backends::engine::{EngineGraph, GraphState, MediaEngine};
use crate::constants::pipeline;
use crate::errors::{SessionError, SessionResult};
use crate::media::{BridgeCounters, FrameBridge, FrameSlot};
use crate::pipelines::graph::{self, GraphInputs};
use crate::pipelines::launch::{GraphSerializer, GstLaunchSerializer};
use futures::channel::mpsc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Session state machine driving the media engine
///
/// All methods run on one control thread. The only state shared with other
/// threads is the [`FrameSlot`] behind the [`FrameBridge`].
pub struct SessionController {
    engine: Box<dyn MediaEngine>,
    enumerator: Box<dyn DeviceEnumerator>,
    serializer: Box<dyn GraphSerializer>,
    bridge: FrameBridge,
    active: Option<Box<dyn EngineGraph>>,
    mode: Mode,
    devices: Vec<String>,
    selected: DeviceSelection,
    volume: RecordVolume,
    recording_path: PathBuf,
    playback_path: Option<PathBuf>,
    listeners: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionController {
    /// Create an idle controller and enumerate devices
    ///
    /// The first device is selected when any exist, otherwise the selection
    /// is `-1`.
    pub fn new(
        engine: Box<dyn MediaEngine>,
        enumerator: Box<dyn DeviceEnumerator>,
        bridge: FrameBridge,
    ) -> Self {
        let devices = enumerator.enumerate();
        let selected = if devices.is_empty() {
            warn!("No capture devices detected");
            DeviceSelection::NONE
        } else {
            DeviceSelection::new(0)
        };
        info!(devices = ?devices, "Session controller created");

        Self {
            engine,
            enumerator,
            serializer: Box::new(GstLaunchSerializer::default()),
            bridge,
            active: None,
            mode: Mode::Idle,
            devices,
            selected,
            volume: RecordVolume::default(),
            recording_path: PathBuf::from(pipeline::DEFAULT_RECORDING_FILE),
            playback_path: None,
            listeners: Vec::new(),
        }
    }

    /// Replace the launch-text serializer
    pub fn with_serializer(mut self, serializer: Box<dyn GraphSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Set where recordings are written
    pub fn with_recording_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.recording_path = path.into();
        self
    }

    /// Receive change notifications from now on
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (sender, receiver) = mpsc::unbounded();
        self.listeners.push(sender);
        receiver
    }

    // ===== Observable state =====

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True while any graph is live (streaming, recording or playback)
    pub fn is_streaming(&self) -> bool {
        self.observe().is_streaming()
    }

    pub fn is_recording(&self) -> bool {
        self.observe().is_recording()
    }

    pub fn device_list(&self) -> &[String] {
        &self.devices
    }

    pub fn selected_device_index(&self) -> i32 {
        self.selected.raw()
    }

    pub fn record_volume(&self) -> f64 {
        self.volume.get()
    }

    pub fn recording_path(&self) -> &Path {
        &self.recording_path
    }

    pub fn has_active_graph(&self) -> bool {
        self.active.is_some()
    }

    pub fn frame_slot(&self) -> &Arc<FrameSlot> {
        self.bridge.slot()
    }

    pub fn bridge_stats(&self) -> BridgeCounters {
        self.bridge.stats()
    }

    // ===== Control surface =====

    /// Start a live preview from the selected device
    ///
    /// Valid from `Idle` and `Playback`; a no-op while already streaming or
    /// recording.
    pub fn start_streaming(&mut self) -> SessionResult<()> {
        self.tracked(Self::start_streaming_inner)
    }

    /// Tear down whatever graph is running; safe to call when idle
    pub fn stop_streaming(&mut self) {
        let _ = self.tracked(|this| {
            this.teardown();
            Ok(())
        });
    }

    /// Switch from streaming to recording
    ///
    /// The streaming graph is torn down unconditionally before the recording
    /// graph is built. A no-op unless currently streaming.
    pub fn start_recording(&mut self) -> SessionResult<()> {
        self.tracked(Self::start_recording_inner)
    }

    /// Stop recording and return to idle; a no-op unless recording
    pub fn stop_recording(&mut self) {
        let _ = self.tracked(|this| {
            if this.mode != Mode::Recording {
                debug!(mode = %this.mode, "Not recording, ignoring stop");
                return Ok(());
            }
            this.teardown();
            info!(path = %this.recording_path.display(), "Recording finished");
            Ok(())
        });
    }

    /// Play a container file, replacing any running graph
    ///
    /// An empty path fails with `InvalidPath` before anything is torn down.
    pub fn playback(&mut self, path: impl AsRef<Path>) -> SessionResult<()> {
        let path = path.as_ref().to_path_buf();
        self.tracked(move |this| this.playback_inner(path))
    }

    /// Select a different capture device
    ///
    /// Ignored when out of range or unchanged. A live session restarts on the
    /// new device, re-entering recording if it was recording.
    pub fn set_selected_device(&mut self, index: i32) -> SessionResult<()> {
        self.tracked(move |this| this.set_selected_device_inner(index))
    }

    /// Set the recording gain, clamped to `[0.0, 4.0]`
    ///
    /// A running recording keeps its gain; the value applies to the next
    /// graph build.
    pub fn set_record_volume(&mut self, volume: f64) {
        let _ = self.tracked(move |this| {
            if volume.is_nan() {
                warn!("Ignoring NaN record volume");
                return Ok(());
            }
            this.volume = RecordVolume::new(volume);
            if this.volume.get() != volume {
                debug!(requested = volume, applied = this.volume.get(), "Record volume clamped");
            }
            Ok(())
        });
    }

    /// Change where the next recording is written
    pub fn set_recording_path(&mut self, path: impl Into<PathBuf>) {
        self.recording_path = path.into();
    }

    /// Re-enumerate capture devices
    ///
    /// A live session is stopped when the list becomes empty. When the
    /// selection falls back to another device while live, the session restarts
    /// on it the same way [`set_selected_device`](Self::set_selected_device)
    /// does.
    pub fn refresh_devices(&mut self) {
        let _ = self.tracked(|this| {
            let previous = this.selected_device_name();
            this.devices = this.enumerator.enumerate();

            if this.devices.is_empty() {
                this.selected = DeviceSelection::NONE;
                if this.mode.needs_device() {
                    warn!("Capture device list is empty, stopping live session");
                    this.teardown();
                }
                return Ok(());
            }

            if this
                .selected
                .index()
                .is_none_or(|i| i as usize >= this.devices.len())
            {
                this.selected = DeviceSelection::new(0);
            }

            let current = this.selected_device_name();
            if this.mode.needs_device() && current != previous {
                info!(
                    previous = ?previous,
                    device = ?current,
                    "Selected device changed under a live session, restarting"
                );
                return this.restart_live();
            }
            Ok(())
        });
    }

    /// Return to idle once a playback graph has reached end of stream
    ///
    /// Returns `true` when the graph finished and was torn down.
    pub fn poll_finished(&mut self) -> bool {
        let finished = self
            .active
            .as_ref()
            .is_some_and(|graph| graph.is_finished());
        if finished {
            self.stop_streaming();
        }
        finished
    }

    // ===== Transitions =====

    fn start_streaming_inner(&mut self) -> SessionResult<()> {
        if matches!(self.mode, Mode::Streaming | Mode::Recording) {
            debug!(mode = %self.mode, "Already streaming");
            return Ok(());
        }
        self.teardown();
        self.launch(Mode::Streaming)
    }

    fn start_recording_inner(&mut self) -> SessionResult<()> {
        if self.mode != Mode::Streaming {
            debug!(mode = %self.mode, "Recording requires an active stream");
            return Ok(());
        }
        self.teardown();
        self.launch(Mode::Recording)
    }

    fn playback_inner(&mut self, path: PathBuf) -> SessionResult<()> {
        if path.as_os_str().is_empty() {
            return Err(SessionError::InvalidPath);
        }
        self.teardown();
        self.playback_path = Some(path);
        self.launch(Mode::Playback)
    }

    fn set_selected_device_inner(&mut self, index: i32) -> SessionResult<()> {
        let in_range = usize::try_from(index).is_ok_and(|i| i < self.devices.len());
        if !in_range || index == self.selected.raw() {
            return Ok(());
        }

        info!(index, device = %self.devices[index as usize], "Selected capture device");
        self.selected = DeviceSelection::new(index);

        if !self.mode.needs_device() {
            return Ok(());
        }
        self.restart_live()
    }

    /// Rebuild a live session on the currently selected device
    ///
    /// Re-enters recording if it was recording.
    fn restart_live(&mut self) -> SessionResult<()> {
        let was_recording = self.mode == Mode::Recording;
        self.teardown();
        // Both steps rebuild from scratch, so the new device is validated again
        self.start_streaming_inner()?;
        if was_recording {
            self.start_recording_inner()?;
        }
        Ok(())
    }

    fn selected_device_name(&self) -> Option<String> {
        self.selected
            .index()
            .and_then(|i| self.devices.get(i as usize))
            .cloned()
    }

    /// Build, connect and start a graph for `mode`
    ///
    /// Must only be called with no graph running. On any failure the partly
    /// built graph is stopped and dropped before returning.
    fn launch(&mut self, mode: Mode) -> SessionResult<()> {
        debug_assert!(self.active.is_none(), "launch with a graph still running");

        let inputs = GraphInputs {
            device: self.selected,
            volume: self.volume,
            recording_path: &self.recording_path,
            playback_path: self.playback_path.as_deref(),
        };
        let description = graph::build(mode, &inputs)?;
        let sink = description
            .frame_sink_name()
            .ok_or_else(|| SessionError::MissingSink(pipeline::FRAME_SINK_NAME.to_string()))?;
        let text = self.serializer.serialize(&description);

        info!(mode = %mode, pipeline = %text, "Creating graph");
        let mut graph = self.engine.launch(&text)?;

        let started = graph
            .connect_frame_sink(sink, self.bridge.frame_callback())
            .and_then(|()| graph.set_state(GraphState::Playing));
        if let Err(e) = started {
            graph.disconnect_frame_sink();
            let _ = graph.set_state(GraphState::Null);
            return Err(e);
        }

        info!(mode = %mode, "Graph started successfully");
        self.active = Some(graph);
        self.mode = mode;
        Ok(())
    }

    /// Stop and release the running graph, if any, and return to idle
    fn teardown(&mut self) {
        if let Some(mut graph) = self.active.take() {
            info!(mode = %self.mode, "Stopping graph");
            if self.mode == Mode::Recording {
                // The container is only playable once the muxer has seen EOS
                if let Err(e) = graph.finalize() {
                    warn!(error = %e, "Recording was not finalized cleanly");
                }
            }
            graph.disconnect_frame_sink();
            if let Err(e) = graph.set_state(GraphState::Null) {
                warn!(error = %e, "Graph did not stop cleanly");
            }
            drop(graph);
            // Frames from the old graph must not outlive it
            self.bridge.slot().clear();
            debug!("Graph released");
        }
        self.mode = Mode::Idle;
    }

    // ===== Notifications =====

    fn observe(&self) -> Observable {
        Observable {
            mode: self.mode,
            devices: self.devices.clone(),
            selected: self.selected,
            volume: self.volume,
        }
    }

    /// Run a control operation and emit events for whatever it changed
    fn tracked<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> SessionResult<R>,
    ) -> SessionResult<R> {
        let before = self.observe();
        let result = op(self);

        if let Err(e) = &result {
            error!(error = %e, "Session operation failed");
            // Failed starts leave nothing running
            if self.active.is_none() {
                self.mode = Mode::Idle;
            }
        }

        debug_assert_eq!(
            self.active.is_some(),
            self.mode != Mode::Idle,
            "mode and graph ownership out of sync"
        );

        for event in before.diff(&self.observe()) {
            self.emit(event);
        }
        if let Err(e) = &result {
            self.emit(SessionEvent::Error(e.to_string()));
        }
        result
    }

    fn emit(&mut self, event: SessionEvent) {
        debug!(event = ?event, "Session event");
        self.listeners
            .retain(|listener| listener.unbounded_send(event.clone()).is_ok());
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.active.is_some() {
            info!("Session controller dropped, stopping graph");
        }
        self.teardown();
    }
}
