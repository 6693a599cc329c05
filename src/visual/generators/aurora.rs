//! Aurora curtains and celestial halo rings.

use super::drive;
use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Shade};
use crate::visual::math::{fbm, hash11, hsv2rgb, mix, smoothstep, value_noise};
use glam::{Vec2, Vec3};

/// Parametric bands `y = center(t) + wave(x, t)` with a hard lower edge, a
/// long upward fade and fine vertical ray texture.
pub struct Aurora;

impl Aurora {
    pub fn new() -> Self {
        Self
    }

    fn layer_count(quality: Quality) -> u32 {
        quality.cap(4, 2)
    }

    fn octaves(quality: Quality) -> u32 {
        quality.cap(4, 2)
    }
}

impl Default for Aurora {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Aurora {
    fn step_cap(&self, quality: Quality) -> u32 {
        Self::layer_count(quality) * (Self::octaves(quality) + 1)
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let t = ctx.t;
        let layers = Self::layer_count(ctx.quality);
        let octaves = Self::octaves(ctx.quality);

        let sky = mix(0.005, 0.03, smoothstep(-0.6, 0.5, p.y));
        let mut rgb = Vec3::new(sky * 0.4, sky * 0.6, sky * 1.4);
        let mut steps = 0;
        for k in 0..layers {
            let kf = k as f32;
            let level = ctx.band(2 + k as usize);
            let center = 0.05 - 0.12 * kf + 0.06 * (t * (0.07 + 0.02 * kf)).sin();
            let warp = fbm(Vec2::new(p.x * 1.3 + kf * 7.1, t * 0.08 + kf), octaves);
            let wave_y = 0.09 * (p.x * (2.2 + 0.4 * kf) + t * 0.35).sin() + 0.18 * (warp - 0.5) * (1.0 + a.bass);
            let above = p.y - (center + wave_y);
            let curtain = smoothstep(-0.012, 0.0, above) * (-above.max(0.0) * (7.0 - 2.0 * level)).exp();
            let rays = 0.55 + 0.45 * value_noise(Vec2::new(p.x * 70.0 + kf * 13.0, t * (0.5 + a.treble)));
            let hue = mix(0.36, 0.82, smoothstep(0.0, 0.35, above)) + 0.04 * kf;
            let color = hsv2rgb(hue, 0.8, 1.0);
            rgb += color * curtain * rays * (0.25 + 0.75 * level) * 0.6;
            steps += octaves + 1;
        }
        let stars = smoothstep(0.985, 1.0, value_noise(p * 160.0)) * smoothstep(-0.1, 0.4, p.y) * 0.4;
        rgb += Vec3::splat(stars) + Vec3::new(0.0, 0.04, 0.03) * a.beat;
        Shade::new(rgb * (0.8 + 0.3 * drive(a)), steps)
    }
}

/// Concentric soft rings whose radii wobble with noise, one ring per band.
pub struct Halo;

impl Halo {
    pub fn new() -> Self {
        Self
    }

    fn ring_count(quality: Quality) -> u32 {
        quality.cap(6, 4).min(8)
    }

    fn octaves(quality: Quality) -> u32 {
        quality.cap(3, 2)
    }
}

impl Default for Halo {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Halo {
    fn step_cap(&self, quality: Quality) -> u32 {
        Self::ring_count(quality) * Self::octaves(quality)
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let t = ctx.t;
        let rings = Self::ring_count(ctx.quality);
        let octaves = Self::octaves(ctx.quality);
        let r = p.length();
        // sample noise on the direction so the wobble has no angular seam
        let dir = p / (r + 1e-3);

        let mut rgb = Vec3::new(0.01, 0.008, 0.02) + Vec3::new(0.08, 0.05, 0.12) * (-6.0 * r).exp();
        for k in 0..rings {
            let level = ctx.band(k as usize);
            let kf = k as f32;
            let radius = 0.06 + 0.065 * kf + 0.02 * a.bass + 0.01 * (t * 0.4 + kf).sin();
            let wobble = (fbm(dir * 1.8 + Vec2::new(t * 0.12, kf * 3.7), octaves) - 0.5) * (0.04 + 0.05 * a.energy);
            let d = (r - radius - wobble).abs();
            let width = 0.006 + 0.01 * level + 0.004 * a.beat;
            let ring = (-(d / width) * (d / width)).exp();
            let hue = 0.08 + 0.09 * kf + 0.1 * hash11(kf) + 0.01 * t;
            rgb += hsv2rgb(hue, 0.55, 0.4 + 0.6 * level) * ring;
        }
        Shade::new(rgb, rings * octaves)
    }
}
