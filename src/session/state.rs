// SPDX-License-Identifier: GPL-3.0-only

//! Controller state types and change notifications

use crate::constants::volume;

/// Operating mode of the session
///
/// Exactly one mode is active at a time; every mode other than `Idle` owns
/// exactly one running graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// No graph
    #[default]
    Idle,
    /// Live preview from the selected device
    Streaming,
    /// Live preview while writing audio and video to a container file
    Recording,
    /// Decoding a container file
    Playback,
}

impl Mode {
    /// Whether this mode needs a live capture device
    pub fn needs_device(&self) -> bool {
        matches!(self, Mode::Streaming | Mode::Recording)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Streaming => "Streaming",
            Mode::Recording => "Recording",
            Mode::Playback => "Playback",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Index into the enumerated device list; `-1` means "no device available"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceSelection(i32);

impl DeviceSelection {
    /// The "no device" selection
    pub const NONE: DeviceSelection = DeviceSelection(-1);

    pub fn new(index: i32) -> Self {
        Self(index.max(-1))
    }

    /// Raw index as exposed to the control surface
    pub fn raw(&self) -> i32 {
        self.0
    }

    /// Device index, or `None` when no device is selected
    pub fn index(&self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }

    pub fn is_none(&self) -> bool {
        self.0 < 0
    }
}

impl Default for DeviceSelection {
    fn default() -> Self {
        Self::NONE
    }
}

/// Audio gain applied to recordings, always within `[0.0, 4.0]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RecordVolume(f64);

impl RecordVolume {
    /// Clamp a requested gain into range (NaN becomes unity gain)
    pub fn new(gain: f64) -> Self {
        if gain.is_nan() {
            return Self(volume::DEFAULT);
        }
        Self(gain.clamp(volume::MIN, volume::MAX))
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for RecordVolume {
    fn default() -> Self {
        Self(volume::DEFAULT)
    }
}

/// Change notification emitted by the controller
///
/// Each event is emitted only when the observable value actually changed
/// across a control call.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ModeChanged(Mode),
    StreamingChanged(bool),
    RecordingChanged(bool),
    DeviceListChanged(Vec<String>),
    SelectedDeviceChanged(i32),
    RecordVolumeChanged(f64),
    /// A control call failed; the controller is idle
    Error(String),
}

/// Snapshot of everything the control surface can observe
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Observable {
    pub mode: Mode,
    pub devices: Vec<String>,
    pub selected: DeviceSelection,
    pub volume: RecordVolume,
}

impl Observable {
    pub fn is_streaming(&self) -> bool {
        self.mode != Mode::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.mode == Mode::Recording
    }

    /// Events describing how `after` differs from `self`
    pub fn diff(&self, after: &Observable) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.mode != after.mode {
            events.push(SessionEvent::ModeChanged(after.mode));
        }
        if self.is_streaming() != after.is_streaming() {
            events.push(SessionEvent::StreamingChanged(after.is_streaming()));
        }
        if self.is_recording() != after.is_recording() {
            events.push(SessionEvent::RecordingChanged(after.is_recording()));
        }
        if self.devices != after.devices {
            events.push(SessionEvent::DeviceListChanged(after.devices.clone()));
        }
        if self.selected != after.selected {
            events.push(SessionEvent::SelectedDeviceChanged(after.selected.raw()));
        }
        if self.volume != after.volume {
            events.push(SessionEvent::RecordVolumeChanged(after.volume.get()));
        }

        events
    }
}
