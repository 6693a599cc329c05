//! Generator families. Each module exposes plain structs implementing
//! [`Generator`](crate::visual::field::Generator); the registry decides ids
//! and display names.

pub mod attractor;
pub mod aurora;
pub mod flame;
pub mod fractal;
pub mod harmonograph;
pub mod moire;
pub mod pendulum;
pub mod phyllotaxis;
pub mod resonance;
pub mod voronoi;

use crate::audio::AudioSnapshot;
use crate::visual::field::Rgb;
use crate::visual::math::{glow, segment_distance};
use glam::Vec2;

/// Overall loudness blend used for gains and flashes, `[0, 1]`.
#[inline]
pub(crate) fn drive(a: &AudioSnapshot) -> f32 {
    (0.40 * a.bass + 0.20 * a.mid + 0.10 * a.treble + 0.15 * a.energy + 0.15 * a.beat).clamp(0.0, 1.0)
}

/// Additive light accumulator shared by the curve and rig generators.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Light {
    pub rgb: Rgb,
    pub steps: u32,
}

impl Light {
    /// Soft disc around `center`.
    #[inline]
    pub fn dot(&mut self, p: Vec2, center: Vec2, radius: f32, color: Rgb, weight: f32) {
        let d = (p - center).length();
        let core = glow(d, 1.0 / radius.max(1e-3));
        self.rgb += color * (core * weight);
        self.steps += 1;
    }

    /// Thin glowing segment `a..b`.
    #[inline]
    pub fn line(&mut self, p: Vec2, a: Vec2, b: Vec2, width: f32, color: Rgb, weight: f32) {
        let d = segment_distance(p, a, b);
        self.rgb += color * (glow(d, 1.0 / width.max(1e-3)) * weight);
        self.steps += 1;
    }
}
