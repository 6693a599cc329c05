use crate::audio::AudioSnapshot;
use crate::config::Quality;
use glam::{Vec2, Vec3};

pub type Rgb = Vec3;

/// Render surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel center `(x, y)` to aspect-correct field coordinates: origin at
    /// the center, y up, the short axis spanning `[-0.5, 0.5]`.
    pub fn normalize(&self, x: usize, y: usize) -> Vec2 {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        let short = w.min(h);
        let fx = x as f32 + 0.5 - 0.5 * w;
        let fy = 0.5 * h - (y as f32 + 0.5);
        Vec2::new(fx, fy) / short
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Everything a generator may read for one frame. Built once per frame; the
/// snapshot has already been sanitized.
#[derive(Debug, Clone, Copy)]
pub struct FieldCtx {
    /// Logical seconds on the generator's clock.
    pub t: f32,
    pub audio: AudioSnapshot,
    pub view: Viewport,
    pub quality: Quality,
}

impl FieldCtx {
    pub fn new(time: f64, snapshot: &AudioSnapshot, view: Viewport, quality: Quality) -> Self {
        let t = if time.is_finite() { time.max(0.0) as f32 } else { 0.0 };
        Self {
            t,
            audio: snapshot.sanitized(),
            view,
            quality,
        }
    }

    #[inline]
    pub fn band(&self, i: usize) -> f32 {
        self.audio.band(i)
    }
}

/// Raw generator output: a color that may still be out of range and the
/// number of inner-loop steps spent producing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shade {
    pub rgb: Rgb,
    pub steps: u32,
}

impl Shade {
    pub fn new(rgb: Rgb, steps: u32) -> Self {
        Self { rgb, steps }
    }

    pub fn flat(rgb: Rgb) -> Self {
        Self { rgb, steps: 0 }
    }
}

/// A procedural color field. Implementations are pure: the output depends
/// only on the point and the frame context, never on earlier calls.
pub trait Generator: Send + Sync {
    /// Upper bound on `Shade::steps` for any input at this quality tier.
    fn step_cap(&self, quality: Quality) -> u32;

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade;

    /// Final color with every channel finite and inside `[0, 1]`.
    fn render(&self, p: Vec2, ctx: &FieldCtx) -> Rgb {
        finite_rgb(self.shade(p, ctx).rgb)
    }
}

/// Replace non-finite channels with 0 and clamp the rest to `[0, 1]`.
#[inline]
pub fn finite_rgb(c: Rgb) -> Rgb {
    let fix = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    Vec3::new(fix(c.x), fix(c.y), fix(c.z))
}

/// One-shot evaluation of a single point at `Balanced` quality.
pub fn render(generator: &dyn Generator, coord: Vec2, time: f64, snap: &AudioSnapshot, viewport: Viewport) -> Rgb {
    let ctx = FieldCtx::new(time, snap, viewport, Quality::Balanced);
    generator.render(coord, &ctx)
}
