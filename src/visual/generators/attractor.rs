//! Clifford and De Jong strange attractors rendered as density fields.
//!
//! A handful of seeded orbits are iterated from fixed starting points; every
//! iterate adds `exp(-k * distance)` to the pixel, weighted by a per-step fade
//! so the later, more chaotic part of each orbit contributes less. The four
//! map parameters are linear in the audio levels plus a slow time drift, so
//! the shape morphs instead of jumping between presets.

use super::drive;
use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Rgb, Shade};
use crate::visual::math::{hash11, hsv2rgb, partial_weight, trips};
use glam::{Vec2, Vec3};

/// Dark base tint shown where no orbit passes, and everywhere while the
/// attractor is silent at the start of its clock.
pub const BACKGROUND: Rgb = Vec3::new(0.02, 0.015, 0.04);

const SEEDS: u32 = 8;
const FADE: f32 = 0.82;
const FALLOFF: f32 = 7.0;
const VIEW_SCALE: f32 = 2.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttractorKind {
    Clifford,
    DeJong,
}

pub struct Attractor {
    kind: AttractorKind,
    hue: f32,
}

impl Attractor {
    pub fn clifford() -> Self {
        Self {
            kind: AttractorKind::Clifford,
            hue: 0.56,
        }
    }

    pub fn de_jong() -> Self {
        Self {
            kind: AttractorKind::DeJong,
            hue: 0.88,
        }
    }

    pub fn kind(&self) -> AttractorKind {
        self.kind
    }

    fn iter_cap(quality: Quality) -> u32 {
        quality.cap(18, 8)
    }

    /// `(a, b, c, d)` for the current frame.
    pub fn params(&self, ctx: &FieldCtx) -> [f32; 4] {
        let a = &ctx.audio;
        let t = ctx.t;
        match self.kind {
            AttractorKind::Clifford => [
                -1.40 + 0.55 * a.bass + 0.15 * (t * 0.11).sin(),
                1.60 + 0.45 * a.mid + 0.12 * (t * 0.07).cos(),
                1.00 + 0.40 * a.treble + 0.10 * (t * 0.05).sin(),
                0.70 + 0.45 * a.energy + 0.10 * (t * 0.09).cos(),
            ],
            AttractorKind::DeJong => [
                1.40 + 0.55 * a.bass + 0.12 * (t * 0.08).cos(),
                -2.30 + 0.45 * a.mid + 0.10 * (t * 0.06).sin(),
                2.40 + 0.35 * a.treble + 0.10 * (t * 0.10).cos(),
                -2.10 + 0.45 * a.energy + 0.12 * (t * 0.05).sin(),
            ],
        }
    }

    #[inline]
    fn step(&self, z: Vec2, [a, b, c, d]: [f32; 4]) -> Vec2 {
        match self.kind {
            AttractorKind::Clifford => Vec2::new((a * z.y).sin() + c * (a * z.x).cos(), (b * z.x).sin() + d * (b * z.y).cos()),
            AttractorKind::DeJong => Vec2::new((a * z.y).sin() - (b * z.x).cos(), (c * z.x).sin() - (d * z.y).cos()),
        }
    }
}

/// Fade-in over the first moments of the generator clock.
#[inline]
fn warm(t: f32) -> f32 {
    (t * 0.8).clamp(0.0, 1.0)
}

impl Generator for Attractor {
    fn step_cap(&self, quality: Quality) -> u32 {
        SEEDS * Self::iter_cap(quality)
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let cap = Self::iter_cap(ctx.quality);
        let effective = (10.0 + 8.0 * ctx.audio.energy).min(cap as f32);
        let n = trips(effective, cap);
        let params = self.params(ctx);
        let q = p * VIEW_SCALE;

        let mut density = 0.0f32;
        let mut age = 0.0f32;
        let mut steps = 0u32;
        for s in 0..SEEDS {
            let mut z = Vec2::new(hash11(s as f32) * 2.0 - 1.0, hash11(s as f32 + 101.0) * 2.0 - 1.0);
            let mut w = 0.5f32;
            for i in 0..n {
                z = self.step(z, params);
                let k = w * partial_weight(i, effective) * (-FALLOFF * (q - z).length()).exp();
                density += k;
                age += k * (i as f32 / cap as f32);
                w *= FADE;
                steps += 1;
            }
        }

        let a = &ctx.audio;
        let gain = warm(ctx.t) * (0.15 + 0.85 * drive(a));
        let bright = 1.0 - (-density).exp();
        let hue = self.hue + 0.30 * age / (density + 1e-3) + 0.08 * a.treble + 0.01 * ctx.t;
        let tint = hsv2rgb(hue, 0.70 - 0.25 * a.beat, 1.0);
        Shade::new(BACKGROUND + tint * (bright * gain), steps)
    }
}
