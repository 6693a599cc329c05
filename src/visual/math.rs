//! Shared shading primitives. Every generator draws its pseudo-randomness
//! from the single hash in this module so seeding stays consistent.

use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Guard added to denominators and lengths before division.
pub const EPS: f32 = 1e-4;
pub const GOLDEN_ANGLE: f32 = 2.399_963_1;
pub const MAX_FBM_OCTAVES: u32 = 8;

const SEED_A: u32 = 0x68E3_1DA4;
const SEED_B: u32 = 0xB529_7A4D;

/// Deterministic 2D integer hash (not crypto).
#[inline]
pub fn hash_u32(x: u32, y: u32, seed: u32) -> u32 {
    let mut n = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed.wrapping_mul(0x9E37_79B9);
    n ^= n >> 13;
    n = n.wrapping_mul(1_274_126_177);
    n ^ (n >> 16)
}

#[inline]
fn to_unit(n: u32) -> f32 {
    ((n & 0x00FF_FFFF) as f32) * (1.0 / 16_777_216.0)
}

#[inline]
fn lattice(p: Vec2) -> (u32, u32) {
    (p.x.floor() as i32 as u32, p.y.floor() as i32 as u32)
}

/// Scalar in `[0, 1)` for the lattice cell containing `p`.
#[inline]
pub fn hash1(p: Vec2) -> f32 {
    let (x, y) = lattice(p);
    to_unit(hash_u32(x, y, SEED_A))
}

/// `hash1` keyed by an integer index (particle number, layer, cell id).
#[inline]
pub fn hash11(n: f32) -> f32 {
    hash1(Vec2::new(n, 0.0))
}

/// Two independent values in `[0, 1)` for the lattice cell containing `p`.
#[inline]
pub fn hash2(p: Vec2) -> Vec2 {
    let (x, y) = lattice(p);
    Vec2::new(to_unit(hash_u32(x, y, SEED_A)), to_unit(hash_u32(x, y, SEED_B)))
}

/// Bilinear value noise over the hash lattice with a smoothstep fade, `[0, 1)`.
pub fn value_noise(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);

    let a = hash1(i);
    let b = hash1(i + Vec2::X);
    let c = hash1(i + Vec2::Y);
    let d = hash1(i + Vec2::ONE);
    mix(mix(a, b, u.x), mix(c, d, u.x), u.y)
}

/// Fractal sum of `value_noise`, doubling frequency and halving amplitude per
/// octave. Normalized back to `[0, 1)`. Octaves are capped at `MAX_FBM_OCTAVES`.
pub fn fbm(p: Vec2, octaves: u32) -> f32 {
    let octaves = octaves.clamp(1, MAX_FBM_OCTAVES);
    // Rotate between octaves so lattice axes don't stack up.
    let (s, c) = 0.5f32.sin_cos();
    let mut q = p;
    let mut amp = 0.5;
    let mut sum = 0.0;
    let mut norm = 0.0;
    for _ in 0..octaves {
        sum += amp * value_noise(q);
        norm += amp;
        q = Vec2::new(c * q.x - s * q.y, s * q.x + c * q.y) * 2.0 + Vec2::splat(17.13);
        amp *= 0.5;
    }
    sum / norm
}

/// HSV to RGB with `h` wrapping, output clamped to `[0, 1]`.
pub fn hsv2rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h = fract01(h) * 6.0;
    let k = Vec3::new(h, h + 4.0, h + 2.0);
    let k = Vec3::new(k.x.rem_euclid(6.0), k.y.rem_euclid(6.0), k.z.rem_euclid(6.0));
    let rgb = ((k - Vec3::splat(3.0)).abs() - Vec3::ONE).clamp(Vec3::ZERO, Vec3::ONE);
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    (v * Vec3::ONE.lerp(rgb, s)).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Cosine palette `a + b * cos(TAU * (c * t + d))`.
pub fn cosine_palette(t: f32, a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Vec3 {
    let arg = TAU * (c * t + d);
    a + b * Vec3::new(arg.x.cos(), arg.y.cos(), arg.z.cos())
}

#[inline]
pub fn complex_mul(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x * b.x - a.y * b.y, a.x * b.y + a.y * b.x)
}

#[inline]
pub fn complex_square(z: Vec2) -> Vec2 {
    Vec2::new(z.x * z.x - z.y * z.y, 2.0 * z.x * z.y)
}

/// `(a*x + b*y + c, d*x + e*y + f)`
#[inline]
pub fn affine(p: Vec2, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Vec2 {
    Vec2::new(a * p.x + b * p.y + c, d * p.x + e * p.y + f)
}

#[inline]
pub fn rotate(p: Vec2, ang: f32) -> Vec2 {
    let (s, c) = ang.sin_cos();
    Vec2::new(c * p.x - s * p.y, s * p.x + c * p.y)
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let d = edge1 - edge0;
    let d = if d.abs() < 1e-6 { 1e-6f32.copysign(d) } else { d };
    let t = ((x - edge0) / d).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn fract01(x: f32) -> f32 {
    let f = x - x.floor();
    if f < 0.0 { f + 1.0 } else { f }
}

/// Exponential falloff `exp(-k * d)`.
#[inline]
pub fn glow(d: f32, k: f32) -> f32 {
    (-k * d.max(0.0)).exp()
}

/// Inverse-square style point light, epsilon-guarded.
#[inline]
pub fn point_light(d: f32, radius: f32) -> f32 {
    radius * radius / (d * d + radius * radius + EPS)
}

/// Distance from `p` to the segment `a..b`.
pub fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let h = (pa.dot(ba) / (ba.length_squared() + EPS)).clamp(0.0, 1.0);
    (pa - ba * h).length()
}

/// Weight of loop trip `i` when the audio-driven trip count is the real
/// number `effective`: full trips get 1, the last partial trip fades in.
#[inline]
pub fn partial_weight(i: u32, effective: f32) -> f32 {
    (effective - i as f32).clamp(0.0, 1.0)
}

/// Trip count covering `effective`, never above `cap`.
#[inline]
pub fn trips(effective: f32, cap: u32) -> u32 {
    (effective.max(0.0).ceil() as u32).min(cap)
}

#[inline]
pub fn luminance(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash_is_stable_per_cell() {
        let a = hash1(Vec2::new(3.2, -7.9));
        let b = hash1(Vec2::new(3.9, -7.1));
        assert_eq!(a, b);
        assert_ne!(hash1(Vec2::new(4.0, -7.5)), a);
    }

    #[test]
    fn hsv_primaries() {
        let red = hsv2rgb(0.0, 1.0, 1.0);
        assert!((red - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        let green = hsv2rgb(1.0 / 3.0, 1.0, 1.0);
        assert!((green - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-4);
        let grey = hsv2rgb(0.7, 0.0, 0.5);
        assert!((grey - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn complex_helpers_match_definition() {
        let z = Vec2::new(1.5, -0.5);
        assert_eq!(complex_square(z), complex_mul(z, z));
        assert_eq!(complex_mul(Vec2::new(0.0, 1.0), Vec2::new(0.0, 1.0)), Vec2::new(-1.0, 0.0));
        assert_eq!(affine(Vec2::new(2.0, 3.0), 1.0, 2.0, 3.0, 4.0, 5.0, 6.0), Vec2::new(11.0, 29.0));
    }

    #[test]
    fn partial_weight_fades_last_trip() {
        assert_eq!(trips(3.25, 10), 4);
        assert_eq!(trips(30.0, 10), 10);
        assert_eq!(partial_weight(2, 3.25), 1.0);
        assert!((partial_weight(3, 3.25) - 0.25).abs() < 1e-6);
        assert_eq!(partial_weight(4, 3.25), 0.0);
    }

    #[test]
    fn segment_distance_handles_degenerate_segment() {
        let p = Vec2::new(1.0, 1.0);
        let d = segment_distance(p, Vec2::ZERO, Vec2::ZERO);
        assert!((d - 2f32.sqrt()).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn noise_stays_in_unit_range(x in -1.0e4f32..1.0e4, y in -1.0e4f32..1.0e4, oct in 0u32..12) {
            let p = Vec2::new(x, y);
            let n = value_noise(p);
            prop_assert!((0.0..1.0).contains(&n));
            let f = fbm(p, oct);
            prop_assert!((0.0..=1.0).contains(&f));
            prop_assert_eq!(f, fbm(p, oct));
        }

        #[test]
        fn hsv_output_is_clamped(h in -10.0f32..10.0, s in -1.0f32..2.0, v in -1.0f32..2.0) {
            let c = hsv2rgb(h, s, v);
            prop_assert!(c.is_finite());
            prop_assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
        }

        #[test]
        fn value_noise_is_continuous(x in -100.0f32..100.0, y in -100.0f32..100.0) {
            let p = Vec2::new(x, y);
            let q = p + Vec2::splat(1e-3);
            prop_assert!((value_noise(p) - value_noise(q)).abs() < 0.01);
        }
    }
}
