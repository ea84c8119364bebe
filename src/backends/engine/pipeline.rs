// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer implementation of the media engine
//!
//! Graph descriptions are handed to `gst::parse::launch` as-is. The decoded-frame
//! sink is an `appsink` whose `new-sample` callback maps the buffer, reads the
//! negotiated caps and passes a borrowed [`RawFrame`] to the registered callback.

use super::{EngineGraph, FrameCallback, GraphState, MediaEngine, RawFrame};
use crate::constants::{pipeline, timing};
use crate::errors::{SessionError, SessionResult};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::{AppSink, AppSinkCallbacks};
use gstreamer_video::VideoInfo;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

/// GStreamer-backed engine
#[derive(Debug)]
pub struct GstEngine {
    _private: (),
}

impl GstEngine {
    /// Initialize GStreamer and create the engine
    pub fn new() -> SessionResult<Self> {
        debug!("Initializing GStreamer");
        gst::init().map_err(|e| {
            SessionError::GraphBuildFailure(format!("Failed to initialize GStreamer: {}", e))
        })?;
        info!(version = %gst::version_string(), "GStreamer initialized");
        Ok(Self { _private: () })
    }
}

impl MediaEngine for GstEngine {
    fn launch(&mut self, description: &str) -> SessionResult<Box<dyn EngineGraph>> {
        info!(pipeline = %description, "Creating pipeline");

        let element = gst::parse::launch(description).map_err(|e| {
            error!(error = %e, pipeline = %description, "Failed to parse pipeline");
            SessionError::GraphBuildFailure(e.to_string())
        })?;

        let pipeline = element.dynamic_cast::<gst::Pipeline>().map_err(|_| {
            SessionError::GraphBuildFailure("Description did not produce a pipeline".to_string())
        })?;

        debug!("Pipeline parsed successfully");
        Ok(Box::new(GstGraph {
            pipeline,
            appsink: None,
            finished: AtomicBool::new(false),
        }))
    }
}

/// A parsed GStreamer pipeline plus its connected appsink
struct GstGraph {
    pipeline: gst::Pipeline,
    appsink: Option<AppSink>,
    finished: AtomicBool,
}

impl GstGraph {
    fn start(&mut self) -> SessionResult<()> {
        debug!("Setting pipeline to PLAYING state");
        if let Err(e) = self.pipeline.set_state(gst::State::Playing) {
            error!(error = %e, "Failed to set pipeline to PLAYING state");
            let reason = self
                .take_bus_error()
                .unwrap_or_else(|| format!("Failed to set pipeline to PLAYING: {}", e));
            return Err(SessionError::GraphStartFailure(reason));
        }

        let (result, state, pending) = self
            .pipeline
            .state(gst::ClockTime::from_seconds(timing::START_TIMEOUT_SECS));
        debug!(?result, ?state, ?pending, "Pipeline state");

        match result {
            Ok(_) if state == gst::State::Playing => {}
            // Live sources may still be prerolling; frames arrive once the device is ready
            Ok(gst::StateChangeSuccess::Async) if pending == gst::State::Playing => {
                info!(?state, ?pending, "Pipeline transitioning asynchronously");
            }
            Ok(_) => {
                warn!(?state, ?pending, "Pipeline is not in PLAYING state");
            }
            Err(e) => {
                let reason = self
                    .take_bus_error()
                    .unwrap_or_else(|| format!("Pipeline failed to start: {}", e));
                return Err(SessionError::GraphStartFailure(reason));
            }
        }

        if let Some(reason) = self.take_bus_error() {
            return Err(SessionError::GraphStartFailure(reason));
        }

        info!("Pipeline started successfully");
        Ok(())
    }

    fn stop(&mut self) -> SessionResult<()> {
        debug!("Setting pipeline to NULL state");
        self.pipeline.set_state(gst::State::Null).map_err(|e| {
            SessionError::GraphStartFailure(format!("Failed to stop pipeline: {}", e))
        })?;

        let (result, state, _) = self
            .pipeline
            .state(gst::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS));
        match result {
            Ok(_) => info!(state = ?state, "Pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
        Ok(())
    }

    fn finish_stream(&mut self) -> SessionResult<()> {
        debug!("Sending EOS to pipeline");
        if !self.pipeline.send_event(gst::event::Eos::new()) {
            warn!("Failed to send EOS event to pipeline");
            return Err(SessionError::GraphStartFailure(
                "Pipeline refused end of stream".to_string(),
            ));
        }

        let Some(bus) = self.pipeline.bus() else {
            return Ok(());
        };
        // Wait for the muxer to write its index before the file is closed
        let msg = bus.timed_pop_filtered(
            gst::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS),
            &[gst::MessageType::Eos, gst::MessageType::Error],
        );
        match msg.as_ref().map(|m| m.view()) {
            Some(gst::MessageView::Eos(_)) => {
                info!("Pipeline flushed end of stream");
                Ok(())
            }
            Some(gst::MessageView::Error(err)) => {
                error!(error = %err.error(), debug = ?err.debug(), "Error while finalizing");
                Err(SessionError::GraphStartFailure(err.error().to_string()))
            }
            _ => {
                warn!(
                    timeout_secs = timing::STOP_TIMEOUT_SECS,
                    "Timed out waiting for end of stream"
                );
                Ok(())
            }
        }
    }

    /// Pop an immediate error off the bus, if the pipeline posted one
    fn take_bus_error(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        let msg = bus.timed_pop_filtered(
            gst::ClockTime::from_mseconds(timing::START_ERROR_CHECK_MS),
            &[gst::MessageType::Error, gst::MessageType::Warning],
        )?;

        match msg.view() {
            gst::MessageView::Error(err) => {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "GStreamer error during start"
                );
                Some(err.error().to_string())
            }
            gst::MessageView::Warning(warn_msg) => {
                warn!(
                    warning = %warn_msg.error(),
                    debug = ?warn_msg.debug(),
                    "GStreamer warning during start"
                );
                None
            }
            _ => None,
        }
    }
}

impl EngineGraph for GstGraph {
    fn connect_frame_sink(&mut self, name: &str, callback: FrameCallback) -> SessionResult<()> {
        let appsink = self
            .pipeline
            .by_name(name)
            .ok_or_else(|| SessionError::MissingSink(name.to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| SessionError::MissingSink(name.to_string()))?;

        appsink.set_property("emit-signals", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        appsink.set_callbacks(
            AppSinkCallbacks::builder()
                .new_sample(sample_handler(callback))
                .build(),
        );
        debug!(sink = %name, "Frame callback connected");

        self.appsink = Some(appsink);
        Ok(())
    }

    fn disconnect_frame_sink(&mut self) {
        if let Some(appsink) = self.appsink.take() {
            debug!("Clearing appsink callbacks");
            appsink.set_callbacks(AppSinkCallbacks::builder().build());
        }
    }

    fn set_state(&mut self, state: GraphState) -> SessionResult<()> {
        match state {
            GraphState::Playing => self.start(),
            GraphState::Null => self.stop(),
        }
    }

    fn finalize(&mut self) -> SessionResult<()> {
        self.finish_stream()
    }

    fn is_finished(&self) -> bool {
        if self.finished.load(Ordering::Relaxed) {
            return true;
        }
        let Some(bus) = self.pipeline.bus() else {
            return false;
        };
        let Some(msg) = bus.pop_filtered(&[gst::MessageType::Eos, gst::MessageType::Error]) else {
            return false;
        };

        if let gst::MessageView::Error(err) = msg.view() {
            error!(error = %err.error(), debug = ?err.debug(), "Pipeline error");
        } else {
            info!("Pipeline reached end of stream");
        }
        self.finished.store(true, Ordering::Relaxed);
        true
    }
}

impl Drop for GstGraph {
    fn drop(&mut self) {
        self.disconnect_frame_sink();
        let _ = self.pipeline.set_state(gst::State::Null);
        debug!("Pipeline dropped");
    }
}

/// Wrap a frame callback as an appsink `new-sample` handler
fn sample_handler(
    mut callback: FrameCallback,
) -> impl FnMut(&AppSink) -> Result<gst::FlowSuccess, gst::FlowError> + Send + 'static {
    let counter = AtomicU64::new(0);

    move |appsink| {
        let frame_num = counter.fetch_add(1, Ordering::Relaxed);

        let sample = appsink.pull_sample().map_err(|_| {
            // Pulling only fails once the sink is flushing or at EOS
            gst::FlowError::Eos
        })?;

        deliver_sample(&sample, &mut callback, frame_num);
        Ok(gst::FlowSuccess::Ok)
    }
}

/// Hand one sample to the callback
///
/// A malformed sample only loses its own frame; the pipeline keeps running.
/// Returns whether the callback was invoked.
fn deliver_sample(sample: &gst::Sample, callback: &mut FrameCallback, frame_num: u64) -> bool {
    let should_log = frame_num % timing::FRAME_LOG_INTERVAL == 0;

    let Some(buffer) = sample.buffer() else {
        if should_log {
            warn!(frame = frame_num, "No buffer in sample, dropping frame");
        }
        return false;
    };

    let Some(caps) = sample.caps() else {
        if should_log {
            warn!(frame = frame_num, "No caps in sample, dropping frame");
        }
        return false;
    };

    let video_info = match VideoInfo::from_caps(caps) {
        Ok(info) => info,
        Err(e) => {
            if should_log {
                warn!(frame = frame_num, error = ?e, "Failed to get video info, dropping frame");
            }
            return false;
        }
    };

    let map = match buffer.map_readable() {
        Ok(map) => map,
        Err(e) => {
            if should_log {
                warn!(frame = frame_num, error = ?e, "Failed to map buffer, dropping frame");
            }
            return false;
        }
    };

    callback(RawFrame {
        data: map.as_slice(),
        width: video_info.width(),
        height: video_info.height(),
        stride: video_info.stride()[0].max(0) as usize,
        format: video_info.format().to_str().as_str(),
    });
    true
}
