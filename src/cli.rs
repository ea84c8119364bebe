// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for session operations
//!
//! This module provides command-line functionality for:
//! - Listing capture devices
//! - Viewing a live stream in the terminal
//! - Recording to a container file
//! - Playing back a recording
//! - Saving a snapshot of the live stream

use mediacentre::backends::{
    DeviceEnumerator, GstDeviceEnumerator, StaticDevices, engine::GstEngine,
};
use mediacentre::config::{self, Config};
use mediacentre::display::{DisplaySurface, ImageTexture, RepaintOutcome};
use mediacentre::media::{FrameBridge, FrameSlot, RepaintReceiver, RepaintSignal};
use mediacentre::pipelines::{GstLaunchSerializer, SourcePlatform};
use mediacentre::session::SessionController;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Name reported for the synthetic source
const TEST_DEVICE_NAME: &str = "Test pattern";

/// How long to wait for the first frame before giving up on a snapshot
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Frames to let through before a snapshot so exposure settles
const SNAPSHOT_WARMUP: Duration = Duration::from_millis(500);

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn enumerator(test_source: bool) -> Box<dyn DeviceEnumerator> {
    if test_source {
        Box::new(StaticDevices::new([TEST_DEVICE_NAME]))
    } else {
        Box::new(GstDeviceEnumerator::new())
    }
}

/// Build a controller wired to the GStreamer engine
fn open_session(
    test_source: bool,
    config: &Config,
) -> Result<(SessionController, RepaintReceiver), Box<dyn std::error::Error>> {
    let engine = GstEngine::new()?;
    let (signal, receiver) = RepaintSignal::channel();
    let bridge = FrameBridge::new(Arc::new(FrameSlot::new())).with_repaint(signal);

    let platform = if test_source {
        SourcePlatform::Test
    } else {
        SourcePlatform::native()
    };

    let mut controller =
        SessionController::new(Box::new(engine), enumerator(test_source), bridge)
            .with_serializer(Box::new(GstLaunchSerializer::new(platform)))
            .with_recording_path(config.recording_path.clone());
    controller.set_record_volume(config.record_volume);

    Ok((controller, receiver))
}

/// Select `device` (or the remembered one) if it exists
fn select_device(controller: &mut SessionController, device: Option<u32>) -> CliResult {
    let count = controller.device_list().len();
    if count == 0 {
        return Err("No capture devices found".into());
    }

    if let Some(index) = device {
        if index as usize >= count {
            return Err(format!("Device index {} out of range (0-{})", index, count - 1).into());
        }
        controller.set_selected_device(index as i32)?;
    }

    let index = controller.selected_device_index();
    if let Some(name) = usize::try_from(index)
        .ok()
        .and_then(|i| controller.device_list().get(i))
    {
        println!("Using device: [{}] {}", index, name);
    }
    Ok(())
}

/// Install a Ctrl+C handler that raises the returned flag
fn stop_flag() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })?;
    Ok(flag)
}

/// List all available capture devices
pub fn list_devices(test_source: bool) -> CliResult {
    let devices = enumerator(test_source).enumerate();

    if devices.is_empty() {
        println!("No capture devices found.");
        return Ok(());
    }

    println!("Available capture devices:");
    println!();
    for (index, name) in devices.iter().enumerate() {
        println!("  [{}] {}", index, name);
    }

    Ok(())
}

/// Run the interactive terminal viewer
pub fn view(device: Option<u32>, test_source: bool) -> CliResult {
    let mut config = Config::load();
    let (mut controller, repaint) = open_session(test_source, &config)?;

    let device = device.or(config.last_device_index);
    if let Some(index) = device
        && (index as usize) < controller.device_list().len()
    {
        controller.set_selected_device(index as i32)?;
    }

    mediacentre::terminal::run(&mut controller, repaint, &mut config)?;

    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save configuration");
    }
    Ok(())
}

/// Record from a device until `duration` elapses or Ctrl+C
pub fn record(
    device: Option<u32>,
    duration: u64,
    volume: Option<f64>,
    output: Option<PathBuf>,
    test_source: bool,
) -> CliResult {
    let config = Config::load();
    let (mut controller, _repaint) = open_session(test_source, &config)?;
    select_device(&mut controller, device)?;

    let output_path =
        output.unwrap_or_else(|| config::timestamped_recording_path(&config.recording_path));
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    controller.set_recording_path(&output_path);
    if let Some(volume) = volume {
        controller.set_record_volume(volume);
    }

    println!("Output: {}", output_path.display());
    println!("Duration: {} seconds", duration);
    println!("Volume: {:.2}", controller.record_volume());

    controller.start_streaming()?;
    controller.start_recording()?;
    if !controller.is_recording() {
        return Err("Recording did not start".into());
    }

    println!();
    println!("Recording... (press Ctrl+C to stop early)");

    let stop = stop_flag()?;
    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);

    while start.elapsed() < target_duration {
        if stop.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    controller.stop_recording();
    let stats = controller.bridge_stats();
    println!("Video saved: {}", output_path.display());
    println!(
        "Frames previewed: {} (short buffers: {})",
        stats.delivered, stats.short_buffers
    );

    Ok(())
}

/// Play a recording until end of stream or Ctrl+C
pub fn play(path: &Path, snapshot: Option<PathBuf>) -> CliResult {
    let config = Config::load();
    let (mut controller, mut repaint) = open_session(false, &config)?;
    let mut surface = DisplaySurface::new(controller.frame_slot().clone(), ImageTexture::new())
        .with_options(config.display_options());

    println!("Playing: {}", path.display());
    controller.playback(path)?;

    let stop = stop_flag()?;
    loop {
        if repaint.drain() && surface.repaint() == RepaintOutcome::Updated {
            let frames = surface.sink().upload_count();
            print!("\rFrames: {}", frames);
            std::io::Write::flush(&mut std::io::stdout())?;
        }
        if controller.poll_finished() {
            break;
        }
        if stop.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }
    println!();
    controller.stop_streaming();

    if let Some(snapshot) = snapshot {
        surface.sink().save_snapshot(&snapshot)?;
        println!("Snapshot saved: {}", snapshot.display());
    }

    Ok(())
}

/// Stream briefly and save the first settled frame as PNG
pub fn snapshot(device: Option<u32>, output: &Path, test_source: bool) -> CliResult {
    let config = Config::load();
    let (mut controller, mut repaint) = open_session(test_source, &config)?;
    select_device(&mut controller, device)?;

    let mut surface = DisplaySurface::new(controller.frame_slot().clone(), ImageTexture::new())
        .with_options(config.display_options());

    println!("Capturing...");
    controller.start_streaming()?;

    let start = Instant::now();
    let mut captured = false;
    while start.elapsed() < SNAPSHOT_TIMEOUT {
        if repaint.drain()
            && surface.repaint() == RepaintOutcome::Updated
            && start.elapsed() >= SNAPSHOT_WARMUP
        {
            captured = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }
    controller.stop_streaming();

    if !captured && surface.last_frame().is_none() {
        return Err("No frame received from device".into());
    }

    surface.sink().save_snapshot(output)?;
    println!("Snapshot saved: {}", output.display());
    Ok(())
}
