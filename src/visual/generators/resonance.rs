//! Chladni plate sand.
//!
//! One grain lives in every lattice cell. It starts at a hashed spot and is
//! pulled toward the nearest nodal line of the plate mode by a Newton step on
//! the mode function; how far it has travelled is the layer's "settle"
//! factor, driven by that layer's band energy. Three layers (low, mid, high
//! bands) with their own `(n, m)` modes are composited additively.

use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Rgb, Shade};
use crate::visual::math::{EPS, hash2, hsv2rgb, smoothstep};
use glam::{Vec2, Vec3};
use std::f32::consts::PI;

const PLATE_SCALE: f32 = 1.9;
const GRAINS_PER_UNIT: f32 = 15.0;
/// Max travel of a grain in lattice cells. Kept below the neighbour window so
/// a 3x3 scan always sees every grain that can touch the pixel.
const MAX_TRAVEL: f32 = 0.5;
const GRAIN_RADIUS: f32 = 0.45;

struct Layer {
    bands: [usize; 3],
    n: f32,
    m: f32,
    hue: f32,
    offset: Vec2,
}

const LAYERS: [Layer; 3] = [
    Layer {
        bands: [0, 1, 2],
        n: 2.0,
        m: 3.0,
        hue: 0.07,
        offset: Vec2::new(0.0, 0.0),
    },
    Layer {
        bands: [3, 4, 5],
        n: 3.0,
        m: 5.0,
        hue: 0.46,
        offset: Vec2::new(0.37, 0.61),
    },
    Layer {
        bands: [5, 6, 7],
        n: 5.0,
        m: 7.0,
        hue: 0.80,
        offset: Vec2::new(0.71, 0.19),
    },
];

/// `cos(nπx)cos(mπy) - cos(mπx)cos(nπy)`
pub fn chladni(p: Vec2, n: f32, m: f32) -> f32 {
    (n * PI * p.x).cos() * (m * PI * p.y).cos() - (m * PI * p.x).cos() * (n * PI * p.y).cos()
}

fn chladni_grad(p: Vec2, n: f32, m: f32) -> Vec2 {
    let (np, mp) = (n * PI, m * PI);
    Vec2::new(
        -np * (np * p.x).sin() * (mp * p.y).cos() + mp * (mp * p.x).sin() * (np * p.y).cos(),
        -mp * (np * p.x).cos() * (mp * p.y).sin() + np * (mp * p.x).cos() * (np * p.y).sin(),
    )
}

/// Grain position in lattice space for `cell` at settle amount `settle`.
fn grain(cell: Vec2, n: f32, m: f32, settle: f32) -> Vec2 {
    let start = cell + Vec2::splat(0.25) + 0.5 * hash2(cell);
    let plate = start / GRAINS_PER_UNIT;
    let f = chladni(plate, n, m);
    let g = chladni_grad(plate, n, m);
    let mut travel = -f * g / (g.length_squared() + EPS) * GRAINS_PER_UNIT;
    let len = travel.length();
    if len > MAX_TRAVEL {
        travel *= MAX_TRAVEL / len;
    }
    start + travel * settle
}

pub struct Resonance;

impl Resonance {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Resonance {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Resonance {
    fn step_cap(&self, _quality: Quality) -> u32 {
        LAYERS.len() as u32 * 9
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let t = ctx.t;
        let plate = p * PLATE_SCALE;

        let mut rgb: Rgb = Vec3::new(0.025, 0.022, 0.03);
        let mut steps = 0u32;
        for (li, layer) in LAYERS.iter().enumerate() {
            let level = (ctx.band(layer.bands[0]) + ctx.band(layer.bands[1]) + ctx.band(layer.bands[2])) / 3.0;
            let drift = 0.25 * (t * (0.05 + 0.02 * li as f32)).sin();
            let n = layer.n + 1.6 * level + drift;
            let m = layer.m + 1.2 * level - drift;
            let settle = smoothstep(0.0, 1.0, 0.8 * level + 0.2 * a.energy);

            let lattice = plate * GRAINS_PER_UNIT + layer.offset;
            let base = lattice.floor();
            let mut sand = 0.0f32;
            for j in -1..=1 {
                for i in -1..=1 {
                    let cell = base + Vec2::new(i as f32, j as f32);
                    let g = grain(cell - layer.offset, n, m, settle) + layer.offset;
                    let d = (lattice - g).length();
                    sand += smoothstep(GRAIN_RADIUS, 0.0, d);
                    steps += 1;
                }
            }

            let node = smoothstep(0.08, 0.0, chladni(plate, n, m).abs());
            let color = hsv2rgb(layer.hue + 0.05 * a.beat, 0.65, 1.0);
            let gain = 0.30 + 0.70 * level;
            rgb += color * (sand * gain * 0.55 + node * 0.06 * (0.3 + settle));
        }

        rgb *= 0.9 + 0.25 * a.beat;
        Shade::new(rgb, steps)
    }
}
