//! Mandelbrot/Julia morph.
//!
//! `z0 = p·m`, `c = mix(p, orbit, m)`: at `m = 0` this is the Mandelbrot
//! set, at `m = 1` the Julia set of `orbit`. The morph factor drifts slowly
//! and `orbit` circles a bounded loop nudged by bass and treble, so the set
//! morphs continuously. Coloring uses the smooth escape count on a
//! non-cycling gradient plus an orbit trap to the axes.
//!
//! Near the set boundary the escape count reacts violently to tiny moves of
//! `c`, so the gradient saturates toward the interior color after a few
//! iterations and the trap only looks at the first iterates. Late escapes and
//! the interior then shade alike and audio nudges do not pop pixels.

use super::drive;
use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Rgb, Shade};
use crate::visual::math::{complex_square, mix, smoothstep};
use glam::{Vec2, Vec3};

/// Squared escape radius.
const BAILOUT: f32 = 256.0;
const VIEW_SCALE: f32 = 2.6;

/// Falloff of the gradient position with escape count, in iterations.
const GLOW_FALLOFF: f32 = 4.0;
/// Iterates that feed the orbit trap.
const TRAP_DEPTH: u32 = 4;

/// Position 0 is far outside the set, 1 is the set itself.
const STOPS: [(f32, Rgb); 4] = [
    (0.0, Vec3::new(0.01, 0.01, 0.04)),
    (0.35, Vec3::new(0.05, 0.12, 0.38)),
    (0.7, Vec3::new(0.62, 0.28, 0.55)),
    (1.0, Vec3::new(0.72, 0.45, 0.55)),
];

/// Piecewise-linear gradient over `[0, 1]`.
pub fn gradient(t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    for w in STOPS.windows(2) {
        let (t0, c0) = w[0];
        let (t1, c1) = w[1];
        if t <= t1 {
            return c0.lerp(c1, (t - t0) / (t1 - t0));
        }
    }
    STOPS[STOPS.len() - 1].1
}

/// Base color for smooth escape count `nu`. Points that never escape get
/// `nu = cap`, which lands on the last stop, so the interior joins its
/// boundary without a seam.
pub fn escape_color(nu: f32) -> Rgb {
    gradient(1.0 - (-nu.max(0.0) / GLOW_FALLOFF).exp())
}

/// Escape result for one point.
#[derive(Debug, Clone, Copy)]
pub struct Escape {
    /// Smooth iteration count, `cap` for points that never escape.
    pub nu: f32,
    /// Closest approach of the first `TRAP_DEPTH` iterates to the axes, with
    /// a penalty that keeps escaping iterates from registering.
    pub trap: f32,
    pub iterations: u32,
}

pub fn escape(z0: Vec2, c: Vec2, cap: u32) -> Escape {
    let mut z = z0;
    let mut trap = f32::MAX;
    for i in 0..cap {
        z = complex_square(z) + c;
        let r2 = z.length_squared();
        if i < TRAP_DEPTH {
            trap = trap.min(z.x.abs().min(z.y.abs()) + 0.25 * (r2.sqrt() - 2.0).max(0.0));
        }
        if r2 > BAILOUT {
            // ln|z| / ln(sqrt(BAILOUT)) is in (1, 2] right after escape
            let ratio = (0.5 * r2.ln()) / (0.5 * BAILOUT.ln());
            let nu = (i as f32 + 2.0 - ratio.max(1.0).log2()).min(cap as f32);
            return Escape {
                nu,
                trap,
                iterations: i + 1,
            };
        }
    }
    Escape {
        nu: cap as f32,
        trap,
        iterations: cap,
    }
}

pub struct JuliaMorph;

impl JuliaMorph {
    pub fn new() -> Self {
        Self
    }

    fn iter_cap(quality: Quality) -> u32 {
        quality.cap(96, 48)
    }

    /// Julia parameter on its bounded loop.
    pub fn orbit(ctx: &FieldCtx) -> Vec2 {
        let a = &ctx.audio;
        let theta = 0.05 * ctx.t + 0.15 * a.bass + 0.08 * a.treble;
        let radius = 0.7885 + 0.015 * (a.treble - a.bass);
        Vec2::new(theta.cos(), theta.sin()) * radius
    }
}

impl Default for JuliaMorph {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for JuliaMorph {
    fn step_cap(&self, quality: Quality) -> u32 {
        Self::iter_cap(quality)
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let cap = Self::iter_cap(ctx.quality);
        let m = smoothstep(-0.6, 0.6, (ctx.t * 0.03).sin()) * 0.85 + 0.15;
        let zoom = VIEW_SCALE * (1.0 - 0.04 * a.energy);
        let q = p * zoom + Vec2::new(mix(-0.5, 0.0, m), 0.0);
        let z0 = q * m;
        let c = q.lerp(Self::orbit(ctx), m);

        let e = escape(z0, c, cap);
        let base = escape_color(e.nu);
        let trap = (-e.trap * 4.0).exp();
        let trap_tint = Vec3::new(0.2, 0.75, 0.9) * trap * (0.10 + 0.15 * a.treble);
        let gain = 0.85 + 0.15 * a.beat + 0.1 * drive(a);
        Shade::new((base + trap_tint) * gain, e.iterations)
    }
}
