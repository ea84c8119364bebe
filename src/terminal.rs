// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based session viewer
//!
//! Drives a [`SessionController`] from the keyboard and renders the frame slot
//! to the terminal using Unicode half-block characters.

use crate::config::Config;
use crate::constants::timing;
use crate::display::{DisplaySurface, FrameWidget, ImageTexture, StatusBar};
use crate::media::RepaintReceiver;
use crate::session::{Mode, SessionController, SessionEvent};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Gain change per `+`/`-` key press
const VOLUME_STEP: f64 = 0.1;

/// Run the terminal viewer until the user quits
///
/// Streaming starts immediately when a device is available. Settings changed
/// from the keyboard are written back to `config` on exit.
pub fn run(
    controller: &mut SessionController,
    repaint: RepaintReceiver,
    config: &mut Config,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, controller, repaint, config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut SessionController,
    mut repaint: RepaintReceiver,
    config: &mut Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = controller.subscribe();
    let mut surface = DisplaySurface::new(controller.frame_slot().clone(), ImageTexture::new())
        .with_options(config.display_options());

    let mut show_help = false;
    let mut status_message = build_status_message(controller);
    let mut ticks: u32 = 0;
    let mut needs_draw = true;

    if controller.selected_device_index() >= 0 {
        let _ = controller.start_streaming();
    } else {
        status_message = "No capture devices detected | 'q' quit".to_string();
    }

    loop {
        // Coalesced wakeups; repaint() itself decides whether anything is new
        repaint.drain();
        surface.repaint();
        needs_draw |= surface.sink_mut().take_dirty();

        if controller.poll_finished() {
            info!("Playback reached end of stream");
        }

        ticks = ticks.wrapping_add(1);
        if ticks % timing::DEVICE_REFRESH_TICKS == 0 {
            controller.refresh_devices();
        }

        while let Ok(event) = events.try_recv() {
            needs_draw = true;
            match event {
                SessionEvent::Error(message) => status_message = format!("Error: {}", message),
                SessionEvent::ModeChanged(Mode::Idle) => {
                    surface.reset();
                    if !show_help {
                        status_message = build_status_message(controller);
                    }
                }
                _ if !show_help => status_message = build_status_message(controller),
                _ => {}
            }
        }

        if std::mem::take(&mut needs_draw) {
            draw(terminal, surface.sink(), &status_message)?;
        }

        if !event::poll(Duration::from_millis(timing::UI_POLL_MS))? {
            continue;
        }
        let key = match event::read()? {
            Event::Key(key) => key,
            Event::Resize(..) => {
                needs_draw = true;
                continue;
            }
            _ => continue,
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        needs_draw = true;

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
            KeyCode::Char('q') => break,
            KeyCode::Char('s') => {
                if controller.is_streaming() {
                    controller.stop_streaming();
                } else {
                    let _ = controller.start_streaming();
                }
            }
            KeyCode::Char('r') => {
                if controller.is_recording() {
                    controller.stop_recording();
                    status_message =
                        format!("Saved: {}", controller.recording_path().display());
                } else {
                    let _ = controller.start_recording();
                }
            }
            KeyCode::Char('d') => {
                let count = controller.device_list().len() as i32;
                if count > 1 {
                    let next = (controller.selected_device_index() + 1) % count;
                    let _ = controller.set_selected_device(next);
                    if let Ok(index) = u32::try_from(controller.selected_device_index()) {
                        config.last_device_index = Some(index);
                    }
                }
            }
            KeyCode::Char('m') => {
                let mirror = !surface.options().mirror_horizontally;
                surface.set_mirror_horizontally(mirror);
                config.mirror_preview = mirror;
            }
            KeyCode::Char('f') => {
                let smooth = !surface.options().smooth_scaling;
                surface.set_smooth_scaling(smooth);
                config.smooth_scaling = smooth;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                controller.set_record_volume(controller.record_volume() + VOLUME_STEP);
                config.record_volume = controller.record_volume();
            }
            KeyCode::Char('-') => {
                controller.set_record_volume(controller.record_volume() - VOLUME_STEP);
                config.record_volume = controller.record_volume();
            }
            KeyCode::Char('p') => {
                show_help = false;
                status_message = match save_snapshot(surface.sink()) {
                    Ok(path) => format!("Saved: {}", path.display()),
                    Err(e) => {
                        error!("Failed to save snapshot: {}", e);
                        format!("Error: {}", e)
                    }
                };
            }
            KeyCode::Char('h') => {
                show_help = !show_help;
                status_message = if show_help {
                    build_help_message()
                } else {
                    build_status_message(controller)
                };
            }
            _ => {}
        }
    }

    controller.stop_streaming();
    Ok(())
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    texture: &ImageTexture,
    status_message: &str,
) -> io::Result<()> {
    terminal.draw(|f| {
        let area = f.area();
        let video_area = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        let status_area = Rect {
            y: area.height.saturating_sub(1),
            height: 1,
            ..area
        };

        f.render_widget(FrameWidget::new(texture), video_area);
        f.render_widget(
            StatusBar {
                message: status_message,
            },
            status_area,
        );
    })?;
    Ok(())
}

fn build_status_message(controller: &SessionController) -> String {
    let device = usize::try_from(controller.selected_device_index())
        .ok()
        .and_then(|i| controller.device_list().get(i))
        .map(String::as_str)
        .unwrap_or("no device");

    format!(
        "[{}] {} | vol {:.1} | 's' stream | 'r' record | 'h' help | 'q' quit",
        controller.mode(),
        device,
        controller.record_volume()
    )
}

fn build_help_message() -> String {
    "s: Start/stop | r: Record | d: Next device | m: Mirror | f: Filter | +/-: Volume | \
     p: Snapshot | q/Ctrl+C: Quit"
        .to_string()
}

/// Save the displayed texture as a timestamped PNG
fn save_snapshot(texture: &ImageTexture) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::constants::app_info::APP_DIR);

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("snapshot_{}.png", timestamp));

    texture.save_snapshot(&path)?;
    Ok(path)
}
