//! Shared post-effects applied after the generator pass.

use crate::visual::field::{Rgb, Viewport};
use glam::Vec3;

const BAYER4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostFx {
    pub enabled: bool,
    /// 0 = none, 1 = strong corner falloff.
    pub vignette: f32,
    pub exposure: f32,
    pub dither: bool,
    pub gamma: f32,
}

impl Default for PostFx {
    fn default() -> Self {
        Self {
            enabled: true,
            vignette: 0.45,
            exposure: 1.6,
            dither: true,
            gamma: 2.2,
        }
    }
}

impl PostFx {
    pub fn off() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn vignette_gain(&self, x: usize, y: usize, view: Viewport) -> f32 {
        let cx = (view.width as f32 - 1.0) * 0.5;
        let cy = (view.height as f32 - 1.0) * 0.5;
        let nx = (x as f32 - cx) / cx.max(1.0);
        let ny = (y as f32 - cy) / cy.max(1.0);
        let rad = (nx * nx + ny * ny).clamp(0.0, 1.0);
        let amt = self.vignette.clamp(0.0, 1.0);
        let v = (1.0 - rad.powf(1.18 + 1.4 * amt)).clamp(0.0, 1.0);
        1.0 - amt * 0.5 * (1.0 - v)
    }

    /// Filmic-ish shoulder that maps 0 to 0 and 1 to 1.
    fn tone(&self, c: f32) -> f32 {
        let k = self.exposure.max(1e-3);
        (1.0 - (-k * c).exp()) / (1.0 - (-k).exp())
    }

    /// Vignette, tone map, gamma and ordered dither for one pixel.
    pub fn apply(&self, rgb: Rgb, x: usize, y: usize, view: Viewport) -> [u8; 4] {
        if !self.enabled {
            return to_rgba8(rgb, 0.0);
        }
        let g = self.vignette_gain(x, y, view);
        let inv_gamma = 1.0 / self.gamma.max(0.1);
        let shaped = Vec3::new(
            self.tone(rgb.x * g).clamp(0.0, 1.0).powf(inv_gamma),
            self.tone(rgb.y * g).clamp(0.0, 1.0).powf(inv_gamma),
            self.tone(rgb.z * g).clamp(0.0, 1.0).powf(inv_gamma),
        );
        let bias = if self.dither {
            (BAYER4[y & 3][x & 3] as f32 + 0.5) / 16.0 - 0.5
        } else {
            0.0
        };
        to_rgba8(shaped, bias)
    }
}

/// Quantize with a dither bias in `[-0.5, 0.5]` code values.
#[inline]
pub fn to_rgba8(c: Rgb, bias: f32) -> [u8; 4] {
    let q = |v: f32| {
        let v = if v.is_finite() { v } else { 0.0 };
        (v.clamp(0.0, 1.0) * 255.0 + 0.5 + bias).clamp(0.0, 255.0) as u8
    };
    [q(c.x), q(c.y), q(c.z), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_keeps_endpoints() {
        let fx = PostFx::default();
        assert!(fx.tone(0.0).abs() < 1e-6);
        assert!((fx.tone(1.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn disabled_post_is_plain_quantize() {
        let view = Viewport::new(8, 8);
        let px = PostFx::off().apply(Vec3::new(1.0, 0.5, 0.0), 0, 0, view);
        assert_eq!(px, [255, 128, 0, 255]);
    }

    #[test]
    fn vignette_darkens_corners_only() {
        let fx = PostFx {
            dither: false,
            ..PostFx::default()
        };
        let view = Viewport::new(33, 33);
        let grey = Vec3::splat(0.5);
        let center = fx.apply(grey, 16, 16, view);
        let corner = fx.apply(grey, 0, 0, view);
        assert!(corner[0] < center[0]);
    }
}
