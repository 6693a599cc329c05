mod halfblock;

pub use halfblock::HalfBlockRenderer;

use crate::visual::{FieldEngine, Surface};
use std::io::Write;
use std::time::Duration;

pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    /// Terminal rows used by the image; each holds two pixel rows.
    pub visual_rows: u16,
    pub surface: &'a Surface,
    pub hud: &'a str,
    pub hud_rows: u16,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

/// Pixel size of the surface that fills `cols x rows` cells above the HUD.
pub fn surface_size(cols: u16, rows: u16, hud_rows: u16) -> (usize, usize) {
    let visual = rows.saturating_sub(hud_rows).max(1) as usize;
    (cols.max(1) as usize, visual * 2)
}

/// One status line: visualizer, session state, timing and feed health.
pub fn hud_line(engine: &FieldEngine, fps: f32, stale_frames: u32) -> String {
    let budget = Duration::from_micros(16_600);
    let frame = engine.last_frame_time();
    let over = if frame > budget { " OVER" } else { "" };
    let state = match engine.session().state() {
        crate::visual::SessionState::Idle => "idle".to_string(),
        crate::visual::SessionState::Active(_) => "live".to_string(),
        crate::visual::SessionState::Transitioning { progress, .. } => format!("fade {:>3.0}%", progress * 100.0),
    };
    format!(
        "{} [{}] | q:{} x{} | {:.1} ms{} | {:.0} fps | stale {} | space/→ next  0-9 pick  l list  q quit",
        engine.active_name(),
        state,
        engine.quality().label(),
        engine.threads(),
        frame.as_secs_f64() * 1000.0,
        over,
        fps,
        stale_frames
    )
}

/// Centered text box over a dimmed screen. First line is the title.
pub fn draw_popup(out: &mut dyn Write, cols: u16, rows: u16, text: &str) -> anyhow::Result<()> {
    let cols = cols as usize;
    let rows = rows as usize;
    if text.trim().is_empty() || cols < 8 || rows < 4 {
        return Ok(());
    }

    let inner = cols.saturating_sub(6).max(1);
    let lines: Vec<String> = text.lines().map(|l| l.chars().take(inner).collect()).collect();
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0).clamp(1, inner);
    let body = lines.len().min(rows.saturating_sub(3).max(1));
    let left = (cols.saturating_sub(width + 4)) / 2 + 1;
    let top = (rows.saturating_sub(body + 2)) / 2 + 1;
    let rule = "-".repeat(width + 2);

    out.write_all(b"\x1b[0m\x1b[38;2;236;242;255m\x1b[48;2;8;10;20m")?;
    write!(out, "\x1b[{top};{left}H+{rule}+")?;
    for (i, line) in lines.iter().take(body).enumerate() {
        let row = top + 1 + i;
        write!(out, "\x1b[{row};{left}H| {line:<width$} |")?;
    }
    write!(out, "\x1b[{};{left}H+{rule}+", top + body + 1)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}
