use crate::render::{Frame, Renderer, draw_popup};
use std::io::Write;

/// Two pixels per cell: the upper half block takes the top pixel as
/// foreground and the bottom pixel as background.
pub struct HalfBlockRenderer {
    last_fg: Option<[u8; 3]>,
    last_bg: Option<[u8; 3]>,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let surface = frame.surface;
        let cols = (frame.term_cols as usize).min(surface.width());
        let rows = (frame.visual_rows as usize).min(surface.height() / 2);
        if cols == 0 || rows == 0 {
            return Ok(());
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }
        // home, reset, autowrap off while painting full rows
        out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;
        self.last_fg = None;
        self.last_bg = None;

        for row in 0..rows {
            for x in 0..cols {
                let (Some(top), Some(bottom)) = (surface.pixel(x, row * 2), surface.pixel(x, row * 2 + 1)) else {
                    continue;
                };
                let fg = [top[0], top[1], top[2]];
                let bg = [bottom[0], bottom[1], bottom[2]];
                if self.last_fg != Some(fg) {
                    write!(out, "\x1b[38;2;{};{};{}m", fg[0], fg[1], fg[2])?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    write!(out, "\x1b[48;2;{};{};{}m", bg[0], bg[1], bg[2])?;
                    self.last_bg = Some(bg);
                }
                out.write_all("\u{2580}".as_bytes())?;
            }
            out.write_all(b"\r\n")?;
        }

        let mut hud = frame.hud.lines();
        for i in 0..frame.hud_rows as usize {
            write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", rows + i + 1)?;
            if let Some(line) = hud.next() {
                let clipped: String = line.chars().take(frame.term_cols as usize).collect();
                out.write_all(clipped.as_bytes())?;
            }
        }

        if let Some(text) = frame.overlay {
            draw_popup(out, frame.term_cols, frame.term_rows, text)?;
        }

        out.write_all(b"\x1b[?7h")?;
        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }
}
