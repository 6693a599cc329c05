//! Harmonograph: two damped sinusoids per axis, sampled densely along the
//! curve parameter and drawn as glowing segments. Hue walks along the
//! parameter; three phase-shifted echoes are layered behind the main trace.

use super::{Light, drive};
use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Shade};
use crate::visual::math::{hsv2rgb, partial_weight, trips};
use glam::Vec2;

const ECHOES: u32 = 3;
const SPAN: f32 = 36.0;
const AMP: f32 = 0.22;

#[derive(Debug, Clone, Copy)]
struct Swing {
    f1: f32,
    f3: f32,
    phase: f32,
    d1: f32,
    d2: f32,
}

impl Swing {
    /// `A·sin(f1·s+φ)·e^{-d1·s} + A·sin(f3·s+φ/2)·e^{-d2·s}`
    #[inline]
    fn eval(&self, s: f32) -> f32 {
        AMP * (self.f1 * s + self.phase).sin() * (-self.d1 * s).exp()
            + AMP * (self.f3 * s + 0.5 * self.phase).sin() * (-self.d2 * s).exp()
    }
}

pub struct Harmonograph;

impl Harmonograph {
    pub fn new() -> Self {
        Self
    }

    fn sample_cap(quality: Quality) -> u32 {
        quality.cap(96, 40)
    }

    /// Curve point at parameter `s` for echo `echo`.
    pub fn point(ctx: &FieldCtx, echo: u32, s: f32) -> Vec2 {
        let a = &ctx.audio;
        let t = ctx.t;
        let shift = echo as f32 * (0.35 + 0.25 * a.mid);
        let damp = 0.018 + 0.03 * (1.0 - a.energy);
        let x = Swing {
            f1: 2.0 + 0.004 * t,
            f3: 3.0 + 0.15 * a.bass,
            phase: 0.3 * t + shift,
            d1: damp,
            d2: damp * 1.4,
        };
        let y = Swing {
            f1: 3.0 - 0.003 * t + 0.1 * a.treble,
            f3: 2.0,
            phase: 0.21 * t + 1.3 + shift,
            d1: damp * 1.2,
            d2: damp,
        };
        Vec2::new(x.eval(s) * 1.6, y.eval(s))
    }
}

impl Default for Harmonograph {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Harmonograph {
    fn step_cap(&self, quality: Quality) -> u32 {
        ECHOES * Self::sample_cap(quality)
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let cap = Self::sample_cap(ctx.quality);
        let effective = (cap as f32 * (0.55 + 0.45 * a.energy)).min(cap as f32);
        let n = trips(effective, cap);
        let ds = SPAN / cap as f32;
        let width = 0.004 + 0.004 * a.bass;

        let mut light = Light::default();
        for echo in 0..ECHOES {
            let fade = 1.0 / (1.0 + 1.6 * echo as f32);
            let mut prev = Self::point(ctx, echo, 0.0);
            for i in 0..n {
                let s = (i + 1) as f32 * ds;
                let next = Self::point(ctx, echo, s);
                let hue = 0.55 + 0.45 * s / SPAN + 0.02 * ctx.t + 0.1 * echo as f32;
                let w = fade * partial_weight(i, effective) * (0.35 + 0.65 * (1.0 - s / SPAN));
                light.line(p, prev, next, width, hsv2rgb(hue, 0.7, 1.0), w * 0.5);
                prev = next;
            }
        }

        let gain = 0.45 + 0.55 * drive(a);
        Shade::new(light.rgb * gain, light.steps)
    }
}
