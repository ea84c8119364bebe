// SPDX-License-Identifier: GPL-3.0-only

//! Capture device enumeration
//!
//! Produces the ordered list of human-readable device names the controller
//! exposes as `device_list`. An empty list means "no device"; the controller
//! then holds selection `-1`.

use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, info, warn};

/// Device enumerator collaborator
pub trait DeviceEnumerator {
    /// Ordered list of capture device names
    fn enumerate(&self) -> Vec<String>;
}

/// Enumerates video capture devices through GStreamer's device monitor
#[derive(Debug, Default)]
pub struct GstDeviceEnumerator;

impl GstDeviceEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceEnumerator for GstDeviceEnumerator {
    fn enumerate(&self) -> Vec<String> {
        if let Err(e) = gst::init() {
            warn!(error = %e, "GStreamer unavailable, no devices enumerated");
            return Vec::new();
        }

        let monitor = gst::DeviceMonitor::new();
        monitor.add_filter(Some("Video/Source"), None);

        if let Err(e) = monitor.start() {
            warn!(error = %e, "Failed to start device monitor");
            return Vec::new();
        }

        let names: Vec<String> = monitor
            .devices()
            .iter()
            .filter(|device| device.device_class().contains("Video/Source"))
            .map(|device| device.display_name().to_string())
            .collect();

        monitor.stop();

        for (index, name) in names.iter().enumerate() {
            debug!(index, name = %name, "Found capture device");
        }
        info!(count = names.len(), "Detected capture devices");
        names
    }
}

/// Fixed device list (headless runs and tests)
#[derive(Debug, Clone, Default)]
pub struct StaticDevices {
    names: Vec<String>,
}

impl StaticDevices {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl DeviceEnumerator for StaticDevices {
    fn enumerate(&self) -> Vec<String> {
        self.names.clone()
    }
}
