//! Moiré interference: concentric rings, stripes, radial wedges and a grid
//! at slightly different frequency, rotation and offset, multiplied
//! together. The beating pattern comes from the product alone.

use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Shade};
use crate::visual::math::{hsv2rgb, rotate};
use glam::Vec2;

const LAYERS: u32 = 4;

#[inline]
fn wave(x: f32) -> f32 {
    0.5 + 0.5 * x.cos()
}

pub struct Moire;

impl Moire {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Moire {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Moire {
    fn step_cap(&self, _quality: Quality) -> u32 {
        LAYERS
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let t = ctx.t;

        let c1 = Vec2::new(0.12 * (t * 0.21).sin(), 0.08 * (t * 0.17).cos());
        let rings = wave((p - c1).length() * (70.0 + 12.0 * a.bass) - t * 1.5);

        let sp = rotate(p, 0.04 + 0.03 * (t * 0.1).sin() + 0.05 * a.mid);
        let stripes = wave(sp.x * (72.0 + 8.0 * a.treble));

        // wedges via the direction vector so there is no atan2 seam
        let r = p.length() + 1e-3;
        let dir = rotate(p / r, 0.2 * t);
        let spokes = 0.5 + 0.5 * (wave(dir.x * (18.0 + 6.0 * a.energy)) - 0.5) * r.min(0.3) / 0.3;

        let gp = rotate(p + Vec2::splat(0.01 * t.sin()), -0.07 - 0.04 * a.bass);
        let grid = wave(gp.x * 64.0) * wave(gp.y * 64.0);
        let grid = 0.6 + 0.4 * grid;

        let v = rings * stripes * spokes * grid;
        let hue = 0.62 + 0.25 * v + 0.08 * a.treble + 0.02 * t;
        let rgb = hsv2rgb(hue, 0.55 + 0.3 * a.mid, (0.15 + 0.85 * v) * (0.75 + 0.25 * a.beat));
        Shade::new(rgb, LAYERS)
    }
}
