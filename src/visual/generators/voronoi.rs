//! Voronoi flow field at three scales.
//!
//! Seeds drift inside their cells along a time- and audio-driven flow; the
//! pixel looks at the 3x3 neighbourhood for the nearest and second-nearest
//! seed. Cell color comes from a hashed hue tied to one spectrum band, and
//! borders are a smooth function of `d2 - d1`. Because the border color is
//! shared, the hue jump between cells is always hidden under it.

use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Rgb, Shade};
use crate::visual::math::{hash1, hash2, hsv2rgb, smoothstep};
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// (density, weight) per scale: base, fine, coarse.
const SCALES: [(f32, f32); 3] = [(4.0, 1.0), (9.0, 0.35), (2.0, 0.45)];

/// Seed offset amplitude inside a cell; stays under 0.5 so seeds never
/// leave their cell.
const FLOW_MAX: f32 = 0.4;

pub struct CellHit {
    pub d1: f32,
    pub d2: f32,
    pub cell: Vec2,
}

/// Nearest and second-nearest flowing seed around `p` (in lattice units).
pub fn cells(p: Vec2, t: f32, flow: f32, swirl: f32) -> CellHit {
    let base = p.floor();
    let mut hit = CellHit {
        d1: f32::MAX,
        d2: f32::MAX,
        cell: base,
    };
    for j in -1..=1 {
        for i in -1..=1 {
            let cell = base + Vec2::new(i as f32, j as f32);
            let h = hash2(cell);
            let phase = TAU * h;
            let amp = (0.25 + 0.15 * flow).min(FLOW_MAX);
            let drift = Vec2::new((t * (0.6 + swirl) + phase.x).sin(), (t * (0.5 + 0.7 * swirl) + phase.y).cos());
            let seed = cell + Vec2::splat(0.5) + drift * amp;
            let d = (p - seed).length();
            if d < hit.d1 {
                hit.d2 = hit.d1;
                hit.d1 = d;
                hit.cell = cell;
            } else if d < hit.d2 {
                hit.d2 = d;
            }
        }
    }
    hit
}

pub struct VoronoiFlow;

impl VoronoiFlow {
    pub fn new() -> Self {
        Self
    }

    fn cell_color(cell: Vec2, ctx: &FieldCtx, scale: usize) -> Rgb {
        let h = hash1(cell + Vec2::splat(scale as f32 * 113.0));
        let band = (h * 8.0) as usize;
        let level = ctx.band(band);
        hsv2rgb(h * 0.6 + 0.45 + 0.1 * level + 0.01 * ctx.t, 0.55 + 0.3 * level, 0.25 + 0.75 * level)
    }
}

impl Default for VoronoiFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for VoronoiFlow {
    fn step_cap(&self, _quality: Quality) -> u32 {
        SCALES.len() as u32 * 9
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let mut rgb = Vec3::new(0.01, 0.012, 0.02);
        let border_color = hsv2rgb(0.55 + 0.2 * a.treble, 0.35, 0.9 + 0.1 * a.beat);
        let width = 0.06 + 0.08 * a.beat;
        for (si, &(density, weight)) in SCALES.iter().enumerate() {
            let q = p * density + Vec2::new(si as f32 * 31.7, si as f32 * -12.3);
            let hit = cells(q, ctx.t * (1.0 + 0.3 * si as f32), a.bass, a.mid);
            let edge = smoothstep(0.0, width, hit.d2 - hit.d1);
            let fill = Self::cell_color(hit.cell, ctx, si) * (1.0 - 0.6 * hit.d1.min(1.0));
            rgb += (fill * edge + border_color * (1.0 - edge) * (0.3 + 0.7 * a.energy)) * weight;
        }
        Shade::new(rgb * 0.6, SCALES.len() as u32 * 9)
    }
}
