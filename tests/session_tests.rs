// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the session controller, driven by an in-memory engine

use futures::channel::mpsc::UnboundedReceiver;
use mediacentre::backends::{
    DeviceEnumerator, EngineGraph, FrameCallback, GraphState, MediaEngine, RawFrame,
};
use mediacentre::display::{DisplaySurface, ImageTexture, RepaintOutcome};
use mediacentre::errors::{SessionError, SessionResult};
use mediacentre::media::{FrameBridge, FrameSlot};
use mediacentre::pipelines::{GstLaunchSerializer, SourcePlatform};
use mediacentre::session::{Mode, SessionController, SessionEvent};
use std::sync::{Arc, Mutex};

/// Everything the fake engine observed, plus failure switches
#[derive(Default)]
struct EngineLog {
    launched: Vec<String>,
    live: usize,
    max_live: usize,
    playing: usize,
    fail_launch: bool,
    fail_start: bool,
    missing_sink: bool,
    finished: bool,
    callback: Option<FrameCallback>,
    /// Graph lifecycle calls in order ("playing", "finalize", "null")
    calls: Vec<&'static str>,
}

type Shared = Arc<Mutex<EngineLog>>;

struct FakeEngine {
    log: Shared,
}

impl MediaEngine for FakeEngine {
    fn launch(&mut self, description: &str) -> SessionResult<Box<dyn EngineGraph>> {
        let mut log = self.log.lock().unwrap();
        log.launched.push(description.to_string());
        if log.fail_launch {
            return Err(SessionError::GraphBuildFailure(
                "no such element".to_string(),
            ));
        }
        log.live += 1;
        log.max_live = log.max_live.max(log.live);
        Ok(Box::new(FakeGraph {
            log: self.log.clone(),
            playing: false,
        }))
    }
}

struct FakeGraph {
    log: Shared,
    playing: bool,
}

impl EngineGraph for FakeGraph {
    fn connect_frame_sink(&mut self, name: &str, callback: FrameCallback) -> SessionResult<()> {
        let mut log = self.log.lock().unwrap();
        if log.missing_sink {
            return Err(SessionError::MissingSink(name.to_string()));
        }
        log.callback = Some(callback);
        Ok(())
    }

    fn disconnect_frame_sink(&mut self) {
        self.log.lock().unwrap().callback = None;
    }

    fn set_state(&mut self, state: GraphState) -> SessionResult<()> {
        let mut log = self.log.lock().unwrap();
        match state {
            GraphState::Playing => {
                log.calls.push("playing");
                if log.fail_start {
                    return Err(SessionError::GraphStartFailure(
                        "device busy".to_string(),
                    ));
                }
                if !self.playing {
                    self.playing = true;
                    log.playing += 1;
                }
            }
            GraphState::Null => {
                log.calls.push("null");
                if self.playing {
                    self.playing = false;
                    log.playing -= 1;
                }
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> SessionResult<()> {
        self.log.lock().unwrap().calls.push("finalize");
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.log.lock().unwrap().finished
    }
}

impl Drop for FakeGraph {
    fn drop(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.live -= 1;
        if self.playing {
            log.playing -= 1;
        }
    }
}

/// Device list the test can change between enumerations
#[derive(Clone, Default)]
struct SharedDevices(Arc<Mutex<Vec<String>>>);

impl SharedDevices {
    fn set(&self, names: &[&str]) {
        *self.0.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }
}

impl DeviceEnumerator for SharedDevices {
    fn enumerate(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct Harness {
    controller: SessionController,
    log: Shared,
    devices: SharedDevices,
    events: UnboundedReceiver<SessionEvent>,
}

impl Harness {
    fn new(devices: &[&str]) -> Self {
        let log = Shared::default();
        let shared_devices = SharedDevices::default();
        shared_devices.set(devices);
        let bridge = FrameBridge::new(Arc::new(FrameSlot::new()));
        let mut controller = SessionController::new(
            Box::new(FakeEngine { log: log.clone() }),
            Box::new(shared_devices.clone()),
            bridge,
        )
        .with_serializer(Box::new(GstLaunchSerializer::new(SourcePlatform::Linux)))
        .with_recording_path("rec.mkv");
        let events = controller.subscribe();
        Self {
            controller,
            log,
            devices: shared_devices,
            events,
        }
    }

    fn events(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    fn live(&self) -> usize {
        self.log.lock().unwrap().live
    }

    /// Lifecycle calls since the last time this was called
    fn take_calls(&self) -> Vec<&'static str> {
        std::mem::take(&mut self.log.lock().unwrap().calls)
    }

    fn last_launch(&self) -> String {
        self.log.lock().unwrap().launched.last().cloned().unwrap_or_default()
    }

    fn push_frame(&self, width: u32, height: u32, data: &[u8]) {
        let mut log = self.log.lock().unwrap();
        let callback = log.callback.as_mut().expect("no frame sink connected");
        callback(RawFrame {
            data,
            width,
            height,
            stride: 0,
            format: "RGB",
        });
    }
}

#[test]
fn test_initial_state() {
    let h = Harness::new(&["Cam A", "Cam B"]);
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert!(!h.controller.is_streaming());
    assert!(!h.controller.is_recording());
    assert_eq!(h.controller.device_list(), ["Cam A", "Cam B"]);
    assert_eq!(h.controller.selected_device_index(), 0);
    assert_eq!(h.controller.record_volume(), 1.0);
}

#[test]
fn test_no_devices_selects_none() {
    let mut h = Harness::new(&[]);
    assert_eq!(h.controller.selected_device_index(), -1);

    let err = h.controller.start_streaming().unwrap_err();
    assert_eq!(err, SessionError::InvalidDevice);
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert_eq!(h.live(), 0);
    assert_eq!(
        h.events(),
        vec![SessionEvent::Error(SessionError::InvalidDevice.to_string())]
    );
}

#[test]
fn test_start_and_stop_streaming() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();

    assert_eq!(h.controller.mode(), Mode::Streaming);
    assert!(h.controller.is_streaming());
    assert!(h.last_launch().starts_with("v4l2src device=/dev/video0 ! "));
    assert_eq!(h.log.lock().unwrap().playing, 1);
    assert_eq!(
        h.events(),
        vec![
            SessionEvent::ModeChanged(Mode::Streaming),
            SessionEvent::StreamingChanged(true)
        ]
    );

    h.controller.stop_streaming();
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert_eq!(h.live(), 0);
    assert_eq!(
        h.events(),
        vec![
            SessionEvent::ModeChanged(Mode::Idle),
            SessionEvent::StreamingChanged(false)
        ]
    );
}

#[test]
fn test_stop_streaming_is_idempotent() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.stop_streaming();
    h.controller.stop_streaming();
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert!(h.events().is_empty());
    assert!(h.log.lock().unwrap().launched.is_empty());
}

#[test]
fn test_start_streaming_twice_is_noop() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.events();

    h.controller.start_streaming().unwrap();
    assert_eq!(h.log.lock().unwrap().launched.len(), 1);
    assert!(h.events().is_empty());
}

#[test]
fn test_start_recording_requires_streaming() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_recording().unwrap();

    assert_eq!(h.controller.mode(), Mode::Idle);
    assert!(!h.controller.is_recording());
    assert!(h.events().is_empty());
    assert!(h.log.lock().unwrap().launched.is_empty());
}

#[test]
fn test_recording_cycle() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.events();

    h.controller.start_recording().unwrap();
    assert_eq!(h.controller.mode(), Mode::Recording);
    assert!(h.controller.is_streaming());
    assert!(h.controller.is_recording());
    assert_eq!(h.live(), 1);
    assert_eq!(h.log.lock().unwrap().max_live, 1);

    let launch = h.last_launch();
    assert!(launch.contains("tee name=t"));
    assert!(launch.contains("filesink location=\"rec.mkv\""));
    assert!(launch.contains("volume volume=1"));
    assert_eq!(
        h.events(),
        vec![
            SessionEvent::ModeChanged(Mode::Recording),
            SessionEvent::RecordingChanged(true)
        ]
    );

    h.controller.stop_recording();
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert_eq!(h.live(), 0);
    assert_eq!(
        h.events(),
        vec![
            SessionEvent::ModeChanged(Mode::Idle),
            SessionEvent::StreamingChanged(false),
            SessionEvent::RecordingChanged(false)
        ]
    );
}

#[test]
fn test_stop_recording_finalizes_before_release() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.controller.start_recording().unwrap();
    h.take_calls();

    h.controller.stop_recording();
    assert_eq!(h.take_calls(), vec!["finalize", "null"]);
    assert_eq!(h.live(), 0);
}

#[test]
fn test_stop_streaming_skips_finalize() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.take_calls();

    h.controller.stop_streaming();
    assert_eq!(h.take_calls(), vec!["null"]);

    // Switching into recording releases the preview graph without finalizing
    h.controller.start_streaming().unwrap();
    h.take_calls();
    h.controller.start_recording().unwrap();
    assert_eq!(h.take_calls(), vec!["null", "playing"]);
}

#[test]
fn test_device_change_finalizes_previous_recording() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.start_streaming().unwrap();
    h.controller.start_recording().unwrap();
    h.take_calls();

    h.controller.set_selected_device(1).unwrap();
    let calls = h.take_calls();
    assert_eq!(&calls[..2], ["finalize", "null"]);
    assert_eq!(calls.iter().filter(|c| **c == "finalize").count(), 1);
}

#[test]
fn test_stop_recording_when_streaming_is_noop() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.events();

    h.controller.stop_recording();
    assert_eq!(h.controller.mode(), Mode::Streaming);
    assert!(h.events().is_empty());
}

#[test]
fn test_unchanged_device_emits_nothing() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.set_selected_device(0).unwrap();
    assert!(h.events().is_empty());
}

#[test]
fn test_reselecting_current_device_while_streaming_is_silent() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.events();
    let launches = h.log.lock().unwrap().launched.len();

    h.controller.set_selected_device(0).unwrap();
    assert!(h.events().is_empty());
    assert_eq!(h.controller.mode(), Mode::Streaming);
    assert_eq!(h.log.lock().unwrap().launched.len(), launches);
    assert_eq!(h.live(), 1);

    h.controller.stop_streaming();
    assert_eq!(h.live(), 0);
}

#[test]
fn test_out_of_range_device_ignored() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.set_selected_device(2).unwrap();
    h.controller.set_selected_device(-1).unwrap();
    assert_eq!(h.controller.selected_device_index(), 0);
    assert!(h.events().is_empty());
}

#[test]
fn test_device_change_while_idle() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.set_selected_device(1).unwrap();
    assert_eq!(h.controller.selected_device_index(), 1);
    assert_eq!(h.events(), vec![SessionEvent::SelectedDeviceChanged(1)]);
    assert!(h.log.lock().unwrap().launched.is_empty());
}

#[test]
fn test_device_change_restarts_stream() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.start_streaming().unwrap();
    h.events();

    h.controller.set_selected_device(1).unwrap();
    assert_eq!(h.controller.mode(), Mode::Streaming);
    assert!(h.last_launch().starts_with("v4l2src device=/dev/video1 ! "));
    assert_eq!(h.live(), 1);
    assert_eq!(h.log.lock().unwrap().max_live, 1);
    // The internal stop/start is not visible as a mode change
    assert_eq!(h.events(), vec![SessionEvent::SelectedDeviceChanged(1)]);
}

#[test]
fn test_device_change_while_recording_resumes_recording() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.set_record_volume(2.5);
    h.controller.start_streaming().unwrap();
    h.controller.start_recording().unwrap();
    h.events();

    h.controller.set_selected_device(1).unwrap();
    assert_eq!(h.controller.mode(), Mode::Recording);
    assert!(h.controller.is_recording());

    let launch = h.last_launch();
    assert!(launch.starts_with("v4l2src device=/dev/video1 ! "));
    assert!(launch.contains("volume volume=2.5"));
    assert_eq!(h.live(), 1);
    assert_eq!(h.log.lock().unwrap().max_live, 1);
    assert_eq!(h.events(), vec![SessionEvent::SelectedDeviceChanged(1)]);
}

#[test]
fn test_device_change_during_playback_keeps_playing() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.playback("clip.mkv").unwrap();
    let launches = h.log.lock().unwrap().launched.len();

    h.controller.set_selected_device(1).unwrap();
    assert_eq!(h.controller.mode(), Mode::Playback);
    assert_eq!(h.log.lock().unwrap().launched.len(), launches);
}

#[test]
fn test_record_volume_clamps() {
    let mut h = Harness::new(&["Cam A"]);

    h.controller.set_record_volume(5.0);
    assert_eq!(h.controller.record_volume(), 4.0);
    h.controller.set_record_volume(-1.0);
    assert_eq!(h.controller.record_volume(), 0.0);

    assert_eq!(
        h.events(),
        vec![
            SessionEvent::RecordVolumeChanged(4.0),
            SessionEvent::RecordVolumeChanged(0.0)
        ]
    );

    h.controller.set_record_volume(-3.0);
    h.controller.set_record_volume(f64::NAN);
    assert_eq!(h.controller.record_volume(), 0.0);
    assert!(h.events().is_empty());
}

#[test]
fn test_empty_playback_path_rejected() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.events();

    let err = h.controller.playback("").unwrap_err();
    assert_eq!(err, SessionError::InvalidPath);
    assert_eq!(h.controller.mode(), Mode::Streaming);
    assert_eq!(h.live(), 1);
    assert_eq!(
        h.events(),
        vec![SessionEvent::Error(SessionError::InvalidPath.to_string())]
    );
}

#[test]
fn test_playback_replaces_stream() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.events();

    h.controller.playback("clip.mkv").unwrap();
    assert_eq!(h.controller.mode(), Mode::Playback);
    assert!(h.controller.is_streaming());
    assert!(!h.controller.is_recording());
    assert!(h.last_launch().starts_with("filesrc location=\"clip.mkv\""));
    assert!(h.last_launch().contains("appsink name=appsink sync=true"));
    assert_eq!(h.live(), 1);
    assert_eq!(h.log.lock().unwrap().max_live, 1);
    assert_eq!(h.events(), vec![SessionEvent::ModeChanged(Mode::Playback)]);
}

#[test]
fn test_streaming_from_playback() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.playback("clip.mkv").unwrap();
    h.controller.start_streaming().unwrap();
    assert_eq!(h.controller.mode(), Mode::Streaming);
    assert_eq!(h.live(), 1);
}

#[test]
fn test_playback_finishes_at_end_of_stream() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.playback("clip.mkv").unwrap();
    assert!(!h.controller.poll_finished());

    h.log.lock().unwrap().finished = true;
    assert!(h.controller.poll_finished());
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert_eq!(h.live(), 0);
}

#[test]
fn test_build_failure_leaves_idle() {
    let mut h = Harness::new(&["Cam A"]);
    h.log.lock().unwrap().fail_launch = true;

    let err = h.controller.start_streaming().unwrap_err();
    assert!(matches!(err, SessionError::GraphBuildFailure(_)));
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert!(!h.controller.has_active_graph());
    assert_eq!(h.live(), 0);
    assert!(matches!(h.events().as_slice(), [SessionEvent::Error(_)]));
}

#[test]
fn test_start_failure_releases_graph() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.events();
    h.log.lock().unwrap().fail_start = true;

    let err = h.controller.start_recording().unwrap_err();
    assert!(matches!(err, SessionError::GraphStartFailure(_)));
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert_eq!(h.live(), 0);
    assert!(h.log.lock().unwrap().callback.is_none());

    let events = h.events();
    assert_eq!(
        &events[..2],
        &[
            SessionEvent::ModeChanged(Mode::Idle),
            SessionEvent::StreamingChanged(false)
        ]
    );
    assert!(matches!(events.last(), Some(SessionEvent::Error(_))));
}

#[test]
fn test_missing_sink_releases_graph() {
    let mut h = Harness::new(&["Cam A"]);
    h.log.lock().unwrap().missing_sink = true;

    let err = h.controller.start_streaming().unwrap_err();
    assert_eq!(err, SessionError::MissingSink("appsink".to_string()));
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert_eq!(h.live(), 0);
}

#[test]
fn test_at_most_one_graph_across_transitions() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.start_streaming().unwrap();
    h.controller.start_recording().unwrap();
    h.controller.set_selected_device(1).unwrap();
    h.controller.playback("a.mkv").unwrap();
    h.controller.playback("b.mkv").unwrap();
    h.controller.start_streaming().unwrap();
    h.controller.stop_streaming();

    let log = h.log.lock().unwrap();
    assert_eq!(log.max_live, 1);
    assert_eq!(log.live, 0);
    assert_eq!(log.playing, 0);
}

#[test]
fn test_frames_reach_display_surface() {
    let mut h = Harness::new(&["Cam A"]);
    let mut surface = DisplaySurface::new(h.controller.frame_slot().clone(), ImageTexture::new());
    assert_eq!(surface.repaint(), RepaintOutcome::Idle);

    h.controller.start_streaming().unwrap();
    h.push_frame(2, 2, &[10; 12]);
    h.push_frame(2, 2, &[20; 12]);

    assert_eq!(surface.repaint(), RepaintOutcome::Updated);
    assert_eq!(surface.last_frame().map(|f| f.sequence()), Some(1));
    assert_eq!(surface.sink().image().unwrap().get_pixel(0, 0).0, [20, 20, 20]);
    assert_eq!(surface.repaint(), RepaintOutcome::Kept);

    let stats = h.controller.bridge_stats();
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.replaced, 1);
}

#[test]
fn test_short_frame_dropped_session_continues() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();

    h.push_frame(4, 4, &[0; 4 * 4 * 3 - 1]);
    assert!(!h.controller.frame_slot().has_frame());
    assert_eq!(h.controller.bridge_stats().short_buffers, 1);
    assert_eq!(h.controller.mode(), Mode::Streaming);

    h.push_frame(4, 4, &[0; 4 * 4 * 3]);
    assert!(h.controller.frame_slot().has_frame());
}

#[test]
fn test_stop_clears_pending_frame() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.push_frame(1, 1, &[1, 2, 3]);

    h.controller.stop_streaming();
    assert!(!h.controller.frame_slot().has_frame());
    assert!(h.log.lock().unwrap().callback.is_none());
}

#[test]
fn test_refresh_devices_unchanged_is_silent() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.refresh_devices();
    assert!(h.events().is_empty());
}

#[test]
fn test_refresh_devices_empty_stops_stream() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    h.events();

    h.devices.set(&[]);
    h.controller.refresh_devices();
    assert_eq!(h.controller.mode(), Mode::Idle);
    assert_eq!(h.controller.selected_device_index(), -1);
    assert_eq!(h.live(), 0);
    assert_eq!(
        h.events(),
        vec![
            SessionEvent::ModeChanged(Mode::Idle),
            SessionEvent::StreamingChanged(false),
            SessionEvent::DeviceListChanged(Vec::new()),
            SessionEvent::SelectedDeviceChanged(-1)
        ]
    );
}

#[test]
fn test_refresh_devices_selects_first_when_appearing() {
    let mut h = Harness::new(&[]);
    h.devices.set(&["Cam A"]);
    h.controller.refresh_devices();
    assert_eq!(h.controller.selected_device_index(), 0);
    assert_eq!(
        h.events(),
        vec![
            SessionEvent::DeviceListChanged(vec!["Cam A".to_string()]),
            SessionEvent::SelectedDeviceChanged(0)
        ]
    );
}

#[test]
fn test_refresh_devices_restarts_stream_on_fallback() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.set_selected_device(1).unwrap();
    h.controller.start_streaming().unwrap();
    assert!(h.last_launch().starts_with("v4l2src device=/dev/video1 ! "));
    h.events();

    h.devices.set(&["Cam C"]);
    h.controller.refresh_devices();

    assert_eq!(h.controller.mode(), Mode::Streaming);
    assert_eq!(h.controller.selected_device_index(), 0);
    assert!(h.last_launch().starts_with("v4l2src device=/dev/video0 ! "));
    assert_eq!(h.live(), 1);
    assert_eq!(h.log.lock().unwrap().max_live, 1);
    assert_eq!(
        h.events(),
        vec![
            SessionEvent::DeviceListChanged(vec!["Cam C".to_string()]),
            SessionEvent::SelectedDeviceChanged(0)
        ]
    );
}

#[test]
fn test_refresh_devices_restarts_when_selected_name_changes() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.start_streaming().unwrap();
    h.events();
    let launches = h.log.lock().unwrap().launched.len();

    // Same index, different device behind it
    h.devices.set(&["Cam C", "Cam B"]);
    h.controller.refresh_devices();

    assert_eq!(h.controller.mode(), Mode::Streaming);
    assert_eq!(h.log.lock().unwrap().launched.len(), launches + 1);
    assert_eq!(h.live(), 1);
    assert_eq!(
        h.events(),
        vec![SessionEvent::DeviceListChanged(vec![
            "Cam C".to_string(),
            "Cam B".to_string()
        ])]
    );
}

#[test]
fn test_refresh_devices_keeps_stream_when_selection_survives() {
    let mut h = Harness::new(&["Cam A"]);
    h.controller.start_streaming().unwrap();
    let launches = h.log.lock().unwrap().launched.len();

    h.devices.set(&["Cam A", "Cam B"]);
    h.controller.refresh_devices();
    assert_eq!(h.log.lock().unwrap().launched.len(), launches);
    assert_eq!(h.controller.mode(), Mode::Streaming);
}

#[test]
fn test_refresh_devices_fallback_resumes_recording() {
    let mut h = Harness::new(&["Cam A", "Cam B"]);
    h.controller.set_selected_device(1).unwrap();
    h.controller.start_streaming().unwrap();
    h.controller.start_recording().unwrap();
    h.events();
    h.take_calls();

    h.devices.set(&["Cam C"]);
    h.controller.refresh_devices();

    assert_eq!(h.controller.mode(), Mode::Recording);
    assert!(h.controller.is_recording());
    assert_eq!(h.controller.selected_device_index(), 0);
    let launch = h.last_launch();
    assert!(launch.starts_with("v4l2src device=/dev/video0 ! "));
    assert!(launch.contains("filesink location=\"rec.mkv\""));
    assert_eq!(h.live(), 1);
    assert_eq!(h.log.lock().unwrap().max_live, 1);
    assert_eq!(h.take_calls()[0], "finalize");
    assert_eq!(
        h.events(),
        vec![
            SessionEvent::DeviceListChanged(vec!["Cam C".to_string()]),
            SessionEvent::SelectedDeviceChanged(0)
        ]
    );
}

#[test]
fn test_drop_releases_graph() {
    let h = Harness::new(&["Cam A"]);
    let log = h.log.clone();
    let mut controller = h.controller;
    controller.start_recording().unwrap();
    controller.start_streaming().unwrap();
    controller.start_recording().unwrap();
    assert_eq!(log.lock().unwrap().live, 1);

    drop(controller);
    assert_eq!(log.lock().unwrap().live, 0);
}

#[test]
fn test_closed_subscriber_is_dropped() {
    let mut h = Harness::new(&["Cam A"]);
    let extra = h.controller.subscribe();
    drop(extra);

    h.controller.start_streaming().unwrap();
    assert_eq!(h.events().len(), 2);
}
