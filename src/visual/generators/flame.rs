//! Fractal flame IFS.
//!
//! A few fixed chains play the chaos game: each step picks one of three
//! affine maps (choice hashed from chain and step index, so it never depends
//! on the pixel or the audio), then applies a weighted blend of nonlinear
//! variations. After a short burn-in every iterate adds proximity density
//! and drags the chain color toward the chosen map's hue.

use super::drive;
use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Shade};
use crate::visual::math::{affine, hash1, hsv2rgb, partial_weight, trips};
use glam::{Vec2, Vec3};

const CHAINS: u32 = 4;
const BURN_IN: u32 = 5;
const VIEW_SCALE: f32 = 2.2;
const FALLOFF: f32 = 6.0;
const MAX_RADIUS: f32 = 3.0;
const VARIATIONS: usize = 5;

/// Variation weights from the spectrum, normalized to sum to 1.
pub fn variation_weights(bands: &[f32; 8]) -> [f32; VARIATIONS] {
    let raw = [
        0.35 + bands[0] + 0.5 * bands[1],
        0.20 + bands[2],
        0.25 + bands[3] + 0.5 * bands[4],
        0.15 + bands[5],
        0.20 + bands[6] + 0.5 * bands[7],
    ];
    let sum: f32 = raw.iter().sum();
    raw.map(|w| w / sum)
}

/// Sinusoidal, softened spherical, swirl, horseshoe, spiral.
fn vary(p: Vec2, w: &[f32; VARIATIONS]) -> Vec2 {
    let r2 = p.length_squared();
    let r = r2.sqrt();
    let sinusoidal = Vec2::new(p.x.sin(), p.y.sin());
    let spherical = p / (r2 + 0.3);
    let (s, c) = r2.sin_cos();
    let swirl = Vec2::new(p.x * s - p.y * c, p.x * c + p.y * s);
    let horseshoe = Vec2::new((p.x - p.y) * (p.x + p.y), 2.0 * p.x * p.y) / (r + 0.3);
    // cos/sin of the polar angle without atan2, so there is no branch cut
    let dir = p / (r + 1e-3);
    let spiral = Vec2::new(dir.x + r.sin(), dir.y - r.cos()) / (r + 0.5);

    let out = sinusoidal * w[0] + spherical * w[1] + swirl * w[2] + horseshoe * w[3] + spiral * w[4];
    let len = out.length();
    if len > MAX_RADIUS { out * (MAX_RADIUS / len) } else { out }
}

pub struct Flame;

impl Flame {
    pub fn new() -> Self {
        Self
    }

    fn iter_cap(quality: Quality) -> u32 {
        quality.cap(24, 10)
    }

    fn maps(ctx: &FieldCtx) -> [[f32; 6]; 3] {
        let a = &ctx.audio;
        let t = ctx.t;
        let wob = 0.08 * (t * 0.13).sin();
        [
            [0.56 + wob, -0.28 - 0.1 * a.bass, 0.32, 0.28, 0.52 + 0.1 * a.mid, -0.18],
            [-0.46, 0.32 + wob, -0.41, -0.3 + 0.08 * a.treble, -0.5, 0.27],
            [0.31 + 0.1 * a.bass, 0.6, 0.05 - wob, -0.58, 0.28 - 0.1 * a.mid, 0.44],
        ]
    }
}

impl Default for Flame {
    fn default() -> Self {
        Self::new()
    }
}

const MAP_HUES: [f32; 3] = [0.02, 0.12, 0.62];

impl Generator for Flame {
    fn step_cap(&self, quality: Quality) -> u32 {
        CHAINS * (BURN_IN + Self::iter_cap(quality))
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let cap = Self::iter_cap(ctx.quality);
        let effective = (12.0 + 12.0 * a.energy).min(cap as f32);
        let n = trips(effective, cap);
        let maps = Self::maps(ctx);
        let weights = variation_weights(&a.bands);
        let q = p * VIEW_SCALE;

        let mut density = 0.0f32;
        let mut hue_acc = 0.0f32;
        let mut steps = 0u32;
        for chain in 0..CHAINS {
            let seed = Vec2::new(chain as f32, 7.0);
            let mut z = Vec2::new(hash1(seed) - 0.5, hash1(seed + Vec2::Y) - 0.5);
            let mut color = 0.5f32;
            for i in 0..BURN_IN + n {
                let pick = (hash1(Vec2::new(chain as f32 * 61.0, i as f32)) * 3.0) as usize % 3;
                let [ma, mb, mc, md, me, mf] = maps[pick];
                z = vary(affine(z, ma, mb, mc, md, me, mf), &weights);
                color = 0.5 * (color + MAP_HUES[pick]);
                steps += 1;
                if i < BURN_IN {
                    continue;
                }
                let k = partial_weight(i - BURN_IN, effective) * (-FALLOFF * (q - z).length()).exp();
                density += k;
                hue_acc += k * color;
            }
        }

        let hue = hue_acc / (density + 1e-3) + 0.05 * ctx.t.sin() * a.treble;
        let bright = 1.0 - (-0.9 * density).exp();
        let gain = 0.35 + 0.65 * drive(a);
        let ember = Vec3::new(0.03, 0.01, 0.02);
        Shade::new(ember + hsv2rgb(hue, 0.8, 1.0) * bright * gain, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_normalized() {
        for bands in [[0.0; 8], [1.0; 8], [0.3, 0.9, 0.0, 0.2, 1.0, 0.5, 0.1, 0.7]] {
            let w = variation_weights(&bands);
            let sum: f32 = w.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            assert!(w.iter().all(|&x| x > 0.0));
        }
    }

    #[test]
    fn variations_stay_bounded() {
        let w = variation_weights(&[1.0; 8]);
        for p in [Vec2::ZERO, Vec2::new(1e-6, 0.0), Vec2::new(50.0, -80.0)] {
            let out = vary(p, &w);
            assert!(out.is_finite());
            assert!(out.length() <= MAX_RADIUS + 1e-4);
        }
    }
}
