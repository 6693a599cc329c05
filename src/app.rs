use crate::audio::{SnapshotReader, SynthFeed};
use crate::config::Config;
use crate::render::{Frame, HalfBlockRenderer, Renderer, hud_line, surface_size};
use crate::terminal::TerminalGuard;
use crate::visual::{EngineOptions, FieldEngine, QualityGovernor, Registry, Surface, Viewport};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::{BufWriter, stdout};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const HUD_ROWS: u16 = 1;

/// Build the engine described by `cfg`, applying the start visualizer.
pub fn build_engine(cfg: &Config) -> FieldEngine {
    let mut engine = FieldEngine::new(Registry::default(), EngineOptions::from_config(cfg));
    if let Some(id) = cfg.visualizer.as_deref() {
        if let Err(err) = engine.select_visualizer(id) {
            warn!(%err, "start visualizer ignored");
        }
    }
    engine
}

/// Text for `--list` and the in-app list overlay.
pub fn list_text(engine: &FieldEngine) -> String {
    let mut s = String::from("Visualizers");
    for (i, e) in engine.visualizers().iter().enumerate() {
        s.push_str(&format!("\n{:>2}  {:<16} {}", i, e.id, e.name));
    }
    s
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let feed = SynthFeed::spawn(cfg.seed, cfg.analysis_hz).context("start synthetic audio feed")?;
    let mut reader = SnapshotReader::new(feed.slot());
    let mut engine = build_engine(&cfg);
    let mut governor = QualityGovernor::new(cfg.quality, cfg.adaptive_quality);

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(stdout());
    let mut renderer = HalfBlockRenderer::new();
    info!(renderer = renderer.name(), visualizers = engine.visualizers().len(), "preview started");

    let mut size = TerminalGuard::size()?;
    let mut surface = Surface::default();
    let mut show_list = false;
    let mut digits = String::new();
    let mut fps = FpsCounter::new();
    let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);

    loop {
        let now = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let quit = handle_key(k.code, k.modifiers, &mut engine, &mut show_list, &mut digits);
                    if quit {
                        return Ok(());
                    }
                }
                Event::Resize(c, r) => size = (c, r),
                _ => {}
            }
        }

        let (cols, rows) = size;
        let (w, h) = match (cfg.width, cfg.height) {
            (Some(w), Some(h)) => (w.min(cols as usize), h.min(rows.saturating_sub(HUD_ROWS) as usize * 2)),
            _ => surface_size(cols, rows, HUD_ROWS),
        };
        let view = Viewport::new(w, h);

        let snapshot = reader.latest();
        engine.set_quality(governor.quality());
        engine.render_frame(&mut surface, &snapshot, view);

        let hud = hud_line(&engine, fps.fps(), reader.stale_frames());
        let list = if show_list { Some(list_text(&engine)) } else { None };
        let frame = Frame {
            term_cols: cols,
            term_rows: rows,
            visual_rows: (h / 2) as u16,
            surface: &surface,
            hud: &hud,
            hud_rows: HUD_ROWS,
            overlay: list.as_deref(),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;

        fps.tick();
        governor.update(engine.last_frame_time().as_secs_f32() * 1000.0, target.as_secs_f32() * 1000.0);

        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

/// Returns true when the app should quit. Digits accumulate so two-digit
/// indices can be typed; Enter (or a second digit) commits.
fn handle_key(code: KeyCode, mods: KeyModifiers, engine: &mut FieldEngine, show_list: &mut bool, digits: &mut String) -> bool {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return true;
    }
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Char(' ') | KeyCode::Right | KeyCode::Char('n') => {
            digits.clear();
            if let Err(err) = engine.cycle_visualizer() {
                warn!(%err, "cycle failed");
            }
        }
        KeyCode::Char('l') | KeyCode::Char('L') => *show_list = !*show_list,
        KeyCode::Char(c) if c.is_ascii_digit() => {
            digits.push(c);
            if digits.len() >= 2 {
                commit_index(engine, digits);
            }
        }
        KeyCode::Enter => commit_index(engine, digits),
        _ => {}
    }
    false
}

fn commit_index(engine: &mut FieldEngine, digits: &mut String) {
    let picked = digits.parse::<usize>().ok();
    digits.clear();
    let Some(idx) = picked else { return };
    let Some(id) = engine.visualizers().get(idx).map(|e| e.id) else {
        warn!(idx, "no visualizer at index");
        return;
    };
    // the id comes from the registry, so this only fails if it was emptied
    if let Err(err) = engine.select_visualizer(id) {
        warn!(%err, "select failed");
    }
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let dt = self.last.elapsed().as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = Instant::now();
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
