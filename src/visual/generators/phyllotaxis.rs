//! Phyllotaxis spiral: particle `n` sits at `r = c·√n`, `θ = n·golden`.
//! Each particle follows spectrum band `n mod 8` for size, brightness and
//! hue, and is drawn as a soft elongated blob with its own rotation.

use super::drive;
use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Shade};
use crate::visual::math::{GOLDEN_ANGLE, hsv2rgb, partial_weight, rotate, trips};
use glam::{Vec2, Vec3};

pub struct Phyllotaxis;

impl Phyllotaxis {
    pub fn new() -> Self {
        Self
    }

    fn count_cap(quality: Quality) -> u32 {
        quality.cap(140, 60)
    }

    /// Center of particle `n`.
    pub fn particle(n: u32, spacing: f32, twist: f32) -> Vec2 {
        let r = spacing * (n as f32).sqrt();
        let theta = n as f32 * GOLDEN_ANGLE + twist;
        Vec2::new(r * theta.cos(), r * theta.sin())
    }
}

impl Default for Phyllotaxis {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Phyllotaxis {
    fn step_cap(&self, quality: Quality) -> u32 {
        Self::count_cap(quality)
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let cap = Self::count_cap(ctx.quality);
        let effective = (cap as f32 * (0.6 + 0.4 * a.energy)).min(cap as f32);
        let n = trips(effective, cap);
        let spacing = 0.036 + 0.006 * a.bass;
        let twist = 0.08 * ctx.t;

        let mut rgb = Vec3::ZERO;
        for i in 0..n {
            let center = Self::particle(i, spacing, twist);
            let level = ctx.band(i as usize % 8);
            let size = 0.010 + 0.016 * level + 0.004 * a.beat;
            // elongate along a per-particle axis that slowly spins
            let local = rotate(p - center, -(i as f32 * GOLDEN_ANGLE + ctx.t * (0.3 + 0.2 * a.mid)));
            let d = (local * Vec2::new(1.0, 2.2)).length() / size;
            let blob = (-d * d).exp();
            let hue = 0.9 + 0.25 * i as f32 / cap as f32 + 0.2 * level + 0.015 * ctx.t;
            rgb += hsv2rgb(hue, 0.75, 0.35 + 0.65 * level) * (blob * partial_weight(i, effective));
        }

        let halo = (-8.0 * p.length()).exp() * 0.08 * drive(a);
        Shade::new(rgb + Vec3::new(halo, halo * 0.6, halo * 0.9), n)
    }
}
