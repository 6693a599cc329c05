pub mod field;
pub mod generators;
pub mod governor;
pub mod math;
pub mod post;
pub mod registry;
pub mod session;

use crate::audio::AudioSnapshot;
use crate::config::{Config, Quality};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub use field::{FieldCtx, Generator, Rgb, Shade, Viewport};
pub use governor::QualityGovernor;
pub use post::PostFx;
pub use registry::{ClockPolicy, Registry, VisualizerDescriptor, VisualizerEntry, make_visualizers};
pub use session::{Plan, SelectError, SessionState, VisualizerSession};

/// RGBA8 render target, row-major, top row first.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(view: Viewport) -> Self {
        let mut s = Self::default();
        s.resize(view);
        s
    }

    pub fn resize(&mut self, view: Viewport) {
        self.width = view.width;
        self.height = view.height;
        self.pixels.resize(view.pixels().saturating_mul(4), 0);
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub quality: Quality,
    pub threads: usize,
    pub transition_rate: f32,
    pub post: PostFx,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            quality: Quality::Balanced,
            threads: 1,
            transition_rate: 1.0 / 54.0,
            post: PostFx::default(),
        }
    }
}

impl EngineOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            quality: cfg.quality,
            threads: cfg.threads.max(1),
            transition_rate: cfg.transition_rate(),
            post: if cfg.post_fx { PostFx::default() } else { PostFx::off() },
        }
    }
}

/// Frame orchestrator: owns the registry and the session, and fills a
/// surface once per display refresh.
pub struct FieldEngine {
    registry: Registry,
    session: VisualizerSession,
    quality: Quality,
    threads: usize,
    post: PostFx,
    last_frame: Duration,
    insane_input: bool,
}

impl FieldEngine {
    pub fn new(registry: Registry, opts: EngineOptions) -> Self {
        let session = VisualizerSession::new(&registry, opts.transition_rate);
        Self {
            registry,
            session,
            quality: opts.quality,
            threads: opts.threads.max(1),
            post: opts.post,
            last_frame: Duration::ZERO,
            insane_input: false,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Registry::default(), EngineOptions::default())
    }

    pub fn visualizers(&self) -> Vec<VisualizerEntry> {
        self.registry.entries()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> &VisualizerSession {
        &self.session
    }

    pub fn select_visualizer(&mut self, id: &str) -> Result<(), SelectError> {
        self.session.select(id)
    }

    pub fn cycle_visualizer(&mut self) -> Result<(), SelectError> {
        self.session.cycle()
    }

    pub fn active_name(&self) -> &'static str {
        self.session
            .target()
            .and_then(|i| self.registry.get(i))
            .map(|d| d.name)
            .unwrap_or("<none>")
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn set_quality(&mut self, q: Quality) {
        self.quality = q;
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn set_threads(&mut self, n: usize) {
        self.threads = n.max(1);
    }

    pub fn set_post(&mut self, post: PostFx) {
        self.post = post;
    }

    /// Wall time spent inside the last `render_frame`.
    pub fn last_frame_time(&self) -> Duration {
        self.last_frame
    }

    /// Fill `surface` for one frame. The snapshot is sanitized here, once,
    /// so generators never see NaN or out-of-range levels.
    pub fn render_frame(&mut self, surface: &mut Surface, snapshot: &AudioSnapshot, viewport: Viewport) {
        let started = Instant::now();

        let clean = snapshot.sanitized();
        let insane = clean != *snapshot;
        if insane && !self.insane_input {
            warn!(?snapshot, "audio snapshot out of range, clamping");
        }
        self.insane_input = insane;

        if self.session.state() == SessionState::Idle && !self.registry.is_empty() {
            if let Err(err) = self.session.cycle() {
                warn!(%err, "could not activate a visualizer");
            } else {
                info!(name = self.active_name(), "first frame, activating");
            }
        }
        self.session.advance(clean.time);

        if surface.viewport() != viewport {
            surface.resize(viewport);
        }
        if viewport.is_empty() {
            self.last_frame = started.elapsed();
            return;
        }

        let pass = Pass::new(&self.registry, self.session.plan(), &clean, viewport, self.quality, self.post);
        let row_bytes = viewport.width * 4;
        let threads = self.threads.min(viewport.height).max(1);
        if threads == 1 {
            pass.rows(0, &mut surface.pixels);
        } else {
            let rows_per = viewport.height.div_ceil(threads);
            let pass = &pass;
            std::thread::scope(|s| {
                for (band, chunk) in surface.pixels.chunks_mut(rows_per * row_bytes).enumerate() {
                    s.spawn(move || pass.rows(band * rows_per, chunk));
                }
            });
        }

        self.last_frame = started.elapsed();
    }
}

/// Read-only state for one frame's pixel pass; shared by every worker.
struct Pass<'a> {
    from: Option<(&'a dyn Generator, FieldCtx)>,
    to: Option<(&'a dyn Generator, FieldCtx)>,
    progress: f32,
    view: Viewport,
    post: PostFx,
}

impl<'a> Pass<'a> {
    fn new(
        registry: &'a Registry,
        plan: Plan,
        snap: &AudioSnapshot,
        view: Viewport,
        quality: Quality,
        post: PostFx,
    ) -> Self {
        let bind = |layer: session::Layer| {
            registry
                .get(layer.index)
                .map(|d| (d.generator.as_ref(), FieldCtx::new(layer.time, snap, view, quality)))
        };
        let (from, to, progress) = match plan {
            Plan::Idle => (None, None, 1.0),
            Plan::Single(layer) => (None, bind(layer), 1.0),
            Plan::Blend { from, to, progress } => (bind(from), bind(to), progress.clamp(0.0, 1.0)),
        };
        Self {
            from,
            to,
            progress,
            view,
            post,
        }
    }

    fn color(&self, x: usize, y: usize) -> Rgb {
        let p = self.view.normalize(x, y);
        let from = self.from.as_ref().map(|(g, ctx)| g.render(p, ctx));
        let to = self.to.as_ref().map(|(g, ctx)| g.render(p, ctx));
        match (from, to) {
            (Some(a), Some(b)) => a.lerp(b, self.progress),
            (None, Some(b)) => b,
            (Some(a), None) => a,
            (None, None) => Rgb::ZERO,
        }
    }

    /// Shade whole rows into `out`, whose first row is `y0`.
    fn rows(&self, y0: usize, out: &mut [u8]) {
        let w = self.view.width;
        for (dy, row) in out.chunks_exact_mut(w * 4).enumerate() {
            let y = y0 + dy;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                px.copy_from_slice(&self.post.apply(self.color(x, y), x, y, self.view));
            }
        }
    }
}
