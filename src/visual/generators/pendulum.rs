//! Pendulum family.
//!
//! Every variant swings its bobs with the same closed form,
//! `angle(i, t) = amplitude * sin(2π t / period(i))`, where the periods form
//! a near-harmonic series across the rig. Coupled and spring variants bend
//! that with heuristic terms instead of integrating equations of motion, so
//! each frame stays a pure function of time.

use super::{Light, drive};
use crate::audio::AudioSnapshot;
use crate::config::Quality;
use crate::visual::field::{FieldCtx, Generator, Rgb, Shade};
use crate::visual::math::{hsv2rgb, partial_weight, rotate, smoothstep, trips};
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Seconds for the wave array to realign.
const CYCLE: f32 = 60.0;
/// Oscillations the longest pendulum completes per cycle.
const BASE_OSC: f32 = 40.0;
const TRAIL_DT: f32 = 0.045;
const TRAIL_FADE: f32 = 0.72;

#[inline]
pub fn angle(amplitude: f32, period: f32, t: f32) -> f32 {
    amplitude * (TAU * t / period.max(1e-3)).sin()
}

/// Near-harmonic period series: pendulum `i` completes `BASE_OSC + i`
/// swings per `CYCLE`.
#[inline]
pub fn period(i: u32) -> f32 {
    CYCLE / (BASE_OSC + i as f32)
}

/// Bob hanging from `anchor` on a rod of `length` at `angle` (0 = straight
/// down). A negative length gives an inverted pendulum.
#[inline]
pub fn bob_position(anchor: Vec2, length: f32, angle: f32) -> Vec2 {
    anchor + length * Vec2::new(angle.sin(), -angle.cos())
}

/// Swing amplitude for the current audio; never zero so the rig keeps moving.
#[inline]
pub fn amplitude(a: &AudioSnapshot) -> f32 {
    0.30 + 0.22 * a.bass + 0.12 * a.beat
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendulumKind {
    WaveArray,
    Circular,
    Double,
    Spring,
    Cradle,
    WaveMachine,
    Metronome,
    Firefly,
    Mirror,
    Sand,
}

impl PendulumKind {
    pub const ALL: [PendulumKind; 10] = [
        PendulumKind::WaveArray,
        PendulumKind::Circular,
        PendulumKind::Double,
        PendulumKind::Spring,
        PendulumKind::Cradle,
        PendulumKind::WaveMachine,
        PendulumKind::Metronome,
        PendulumKind::Firefly,
        PendulumKind::Mirror,
        PendulumKind::Sand,
    ];

    /// Number of swinging elements in the rig.
    pub fn count(self) -> u32 {
        match self {
            Self::WaveArray => 12,
            Self::Circular => 14,
            Self::Double => 3,
            Self::Spring => 5,
            Self::Cradle => 5,
            Self::WaveMachine => 22,
            Self::Metronome => 4,
            Self::Firefly => 7,
            Self::Mirror => 6,
            Self::Sand => 1,
        }
    }

    fn trail_cap(self, quality: Quality) -> u32 {
        match self {
            Self::Firefly => quality.cap(16, 6),
            Self::Sand => quality.cap(120, 48),
            Self::Cradle | Self::WaveMachine => 0,
            _ => quality.cap(6, 2),
        }
    }

    /// Draw calls per element per trail sample and fixed extras.
    fn per_element(self) -> u32 {
        match self {
            // two bobs, two rods
            Self::Double => 4,
            // rod, bob, slider
            Self::Metronome => 3,
            // rod, two end balls
            Self::WaveMachine => 3,
            Self::Firefly => 1,
            Self::Sand => 0,
            _ => 2,
        }
    }
}

pub struct Pendulum {
    kind: PendulumKind,
}

impl Pendulum {
    pub fn new(kind: PendulumKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> PendulumKind {
        self.kind
    }

    fn wave_anchor(i: u32, n: u32) -> Vec2 {
        let x = -0.62 + 1.24 * i as f32 / (n - 1).max(1) as f32;
        Vec2::new(x, 0.44)
    }

    fn wave_length(i: u32) -> f32 {
        let r = period(i) / period(0);
        0.78 * r * r
    }

    /// Bob `i` of the wave array at logical time `t`.
    pub fn wave_bob(i: u32, t: f32, a: &AudioSnapshot) -> Vec2 {
        let n = PendulumKind::WaveArray.count();
        bob_position(Self::wave_anchor(i, n), Self::wave_length(i), angle(amplitude(a), period(i), t))
    }

    fn hue(&self, i: u32, ctx: &FieldCtx) -> f32 {
        let n = self.kind.count() as f32;
        let base = match self.kind {
            PendulumKind::Firefly => 0.17,
            PendulumKind::Sand => 0.09,
            PendulumKind::Metronome => 0.58,
            _ => 0.52,
        };
        base + 0.35 * i as f32 / n + 0.15 * ctx.band(i as usize) + 0.01 * ctx.t
    }

    fn color(&self, i: u32, ctx: &FieldCtx) -> Rgb {
        let level = ctx.band(i as usize);
        let sat = if self.kind == PendulumKind::Firefly { 0.85 } else { 0.6 };
        hsv2rgb(self.hue(i, ctx), sat, 0.45 + 0.55 * level)
    }

    fn draw_wave_array(&self, p: Vec2, ctx: &FieldCtx, mirror: bool, light: &mut Light, trail: (u32, f32)) {
        let a = &ctx.audio;
        let n = self.kind.count();
        for i in 0..n {
            let (anchor, length) = if mirror {
                // half-width rig folded about x = 0
                let x = 0.06 + 0.7 * i as f32 / (n - 1).max(1) as f32;
                (Vec2::new(x, 0.44), 0.55 + 0.25 * (1.0 - period(i) / period(0)))
            } else {
                (Self::wave_anchor(i, n), Self::wave_length(i))
            };
            let amp = amplitude(a);
            let color = self.color(i, ctx);
            let bob = bob_position(anchor, length, angle(amp, period(i), ctx.t));
            light.line(p, anchor, bob, 0.0025, color * 0.35, 1.0);
            light.dot(p, bob, 0.012 + 0.008 * a.beat, color, 1.0);
            self.trail(p, ctx, light, trail, color, |t| {
                bob_position(anchor, length, angle(amp, period(i), t))
            });
        }
    }

    fn draw_circular(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light, trail: (u32, f32)) {
        let a = &ctx.audio;
        let n = self.kind.count();
        let amp = 0.6 * amplitude(a);
        let spin = 0.05 * ctx.t;
        for i in 0..n {
            let dir = spin + TAU * i as f32 / n as f32;
            let length = 0.20 + 0.18 * period(i) / period(0);
            let place = |t: f32| rotate(bob_position(Vec2::ZERO, length, angle(amp, period(i), t)), dir);
            let color = self.color(i, ctx);
            let bob = place(ctx.t);
            light.line(p, Vec2::ZERO, bob, 0.002, color * 0.3, 1.0);
            light.dot(p, bob, 0.011 + 0.006 * ctx.band(i as usize), color, 1.0);
            self.trail(p, ctx, light, trail, color, place);
        }
    }

    /// Upper and lower arm angles. The lower arm follows its own swing plus
    /// a coupling term driven by the upper arm.
    fn double_angles(i: u32, t: f32, a: &AudioSnapshot) -> (f32, f32) {
        let amp = amplitude(a);
        let theta1 = angle(amp * 1.4, 3.1 + 0.37 * i as f32, t);
        let coupling = 0.8 + 0.6 * a.mid;
        let theta2 = angle(amp * 2.2, 1.7 + 0.23 * i as f32, t + 0.5 * i as f32) + coupling * (2.0 * theta1 - 0.4 * t).sin();
        (theta1, theta1 + theta2)
    }

    fn draw_double(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light, trail: (u32, f32)) {
        let a = &ctx.audio;
        for i in 0..self.kind.count() {
            let anchor = Vec2::new(-0.5 + 0.5 * i as f32, 0.36);
            let color = self.color(i, ctx);
            let place = |t: f32| {
                let (t1, t2) = Self::double_angles(i, t, a);
                let mid = bob_position(anchor, 0.22, t1);
                (mid, bob_position(mid, 0.2, t2))
            };
            let (mid, tip) = place(ctx.t);
            light.line(p, anchor, mid, 0.0025, color * 0.4, 1.0);
            light.line(p, mid, tip, 0.0025, color * 0.4, 1.0);
            light.dot(p, mid, 0.010, color, 0.7);
            light.dot(p, tip, 0.013 + 0.006 * a.beat, color, 1.0);
            self.trail(p, ctx, light, trail, color, |t| place(t).1);
        }
    }

    fn spring_length(i: u32, t: f32, a: &AudioSnapshot) -> f32 {
        let stretch = 0.12 + 0.18 * a.bass;
        0.42 * (1.0 + stretch * (TAU * t / (0.9 + 0.13 * i as f32) + i as f32).sin())
    }

    fn draw_spring(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light, trail: (u32, f32)) {
        let a = &ctx.audio;
        let amp = 0.8 * amplitude(a);
        for i in 0..self.kind.count() {
            let anchor = Vec2::new(-0.56 + 0.28 * i as f32, 0.44);
            let color = self.color(i, ctx);
            let place = |t: f32| bob_position(anchor, Self::spring_length(i, t, a), angle(amp, period(i) * 2.5, t));
            let bob = place(ctx.t);
            // coil ripple along the spring
            let axis = bob - anchor;
            let h = ((p - anchor).dot(axis) / (axis.length_squared() + 1e-4)).clamp(0.0, 1.0);
            let coil = 0.55 + 0.45 * (h * axis.length() * 180.0).sin();
            light.line(p, anchor, bob, 0.004, color * 0.45 * coil, 1.0);
            light.dot(p, bob, 0.016, color, 1.0);
            self.trail(p, ctx, light, trail, color, place);
        }
    }

    fn draw_cradle(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light) {
        let a = &ctx.audio;
        let n = self.kind.count();
        let radius = 0.055;
        let length = 0.5;
        let swing = angle(0.45 + 0.15 * a.bass, 1.6, ctx.t);
        for i in 0..n {
            let anchor = Vec2::new((i as f32 - 0.5 * (n - 1) as f32) * 2.0 * radius, 0.34);
            // momentum passes through the row; only the end balls swing out
            let theta = if i == 0 {
                swing.min(0.0)
            } else if i == n - 1 {
                swing.max(0.0)
            } else {
                0.015 * a.beat * (ctx.t * 40.0 + i as f32).sin()
            };
            let bob = bob_position(anchor, length, theta);
            let color = self.color(i, ctx);
            light.line(p, anchor, bob, 0.002, Vec3::splat(0.35), 1.0);
            let d = (p - bob).length();
            let ball = smoothstep(radius, radius * 0.8, d);
            let rim = smoothstep(radius * 1.6, radius, d) * 0.15;
            light.rgb += color * (ball * (0.5 + 0.5 * (1.0 - d / radius)) + rim);
            light.steps += 1;
        }
    }

    fn draw_wave_machine(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light) {
        let a = &ctx.audio;
        let n = self.kind.count();
        let half = 0.28 + 0.06 * a.bass;
        let delay = 0.06 + 0.04 * a.mid;
        for i in 0..n {
            let x = -0.8 + 1.6 * i as f32 / (n - 1) as f32;
            let theta = angle(1.1 * amplitude(a) + 0.3, 2.4, ctx.t - delay * i as f32);
            // rod seen edge-on: its ends move up and down, depth from sin
            let reach = half * theta.cos();
            let depth = 0.55 + 0.45 * theta.sin();
            let top = Vec2::new(x, reach);
            let bottom = Vec2::new(x, -reach);
            let color = self.color(i, ctx) * depth;
            light.line(p, bottom, top, 0.003, color * 0.5, 1.0);
            light.dot(p, top, 0.012, color, 1.0);
            light.dot(p, bottom, 0.012, color * 0.6, 1.0);
        }
        // spine
        light.line(p, Vec2::new(-0.85, 0.0), Vec2::new(0.85, 0.0), 0.002, Vec3::splat(0.25), 1.0);
    }

    fn draw_metronome(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light, trail: (u32, f32)) {
        let a = &ctx.audio;
        let n = self.kind.count();
        for i in 0..n {
            let anchor = Vec2::new(-0.54 + 0.36 * i as f32, -0.42);
            // slight detuning between metronomes gives slow beat patterns
            let per = 1.0 * (1.0 + 0.012 * i as f32);
            let amp = 0.35 + 0.15 * a.beat;
            let color = self.color(i, ctx);
            let place = |t: f32| bob_position(anchor, -0.62, angle(amp, per, t));
            let tip = place(ctx.t);
            let slider = anchor + (tip - anchor) * (0.55 + 0.25 * a.mid);
            light.line(p, anchor, tip, 0.003, color * 0.45, 1.0);
            light.dot(p, tip, 0.01, color, 0.8);
            light.dot(p, slider, 0.018, color * 1.2, 1.0);
            self.trail(p, ctx, light, trail, color, place);
        }
    }

    fn draw_firefly(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light, trail: (u32, f32)) {
        let a = &ctx.audio;
        let n = self.kind.count();
        for i in 0..n {
            let anchor = Vec2::new(-0.48 + 0.16 * i as f32, 0.5);
            let length = 0.45 + 0.05 * (i % 3) as f32;
            let amp = 0.9 * amplitude(a);
            let per = period(i * 3) * 2.0;
            let color = self.color(i, ctx);
            let place = |t: f32| bob_position(anchor, length, angle(amp, per, t));
            light.dot(p, place(ctx.t), 0.03 + 0.02 * a.beat, color, 1.6);
            self.trail(p, ctx, light, trail, color * 1.3, place);
        }
    }

    /// Sand table: one pendulum swinging on both axes, its past positions
    /// left behind as a Lissajous groove.
    fn draw_sand(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light, trail: (u32, f32)) {
        let a = &ctx.audio;
        let amp = 0.35 + 0.08 * a.bass;
        let px = 3.0;
        let py = 3.0 * (2.0 / 3.0) * (1.0 + 0.01 * a.treble);
        let place = |t: f32| {
            let decay = 0.75 + 0.25 * (0.05 * t).cos();
            Vec2::new(
                1.3 * amp * decay * angle(1.0, px, t),
                amp * decay * angle(1.0, py, t + 0.25 * py),
            )
        };
        let sand = Vec3::new(0.19, 0.15, 0.1) * (0.9 + 0.1 * (p.x * 90.0).sin() * (p.y * 70.0).cos());
        light.rgb += sand;
        let (n, effective) = trail;
        let mut prev = place(ctx.t);
        for k in 0..n {
            let t = ctx.t - (k + 1) as f32 * 0.05;
            let next = place(t);
            let fade = partial_weight(k, effective) * (1.0 - k as f32 / (n + 1) as f32);
            let groove = self.color(k % 8, ctx) * 0.5;
            light.line(p, prev, next, 0.004, groove, fade * 0.5);
            prev = next;
        }
        let bob = place(ctx.t);
        light.dot(p, bob, 0.02 + 0.01 * a.beat, Vec3::new(0.95, 0.85, 0.6), 1.0);
    }

    fn trail<F>(&self, p: Vec2, ctx: &FieldCtx, light: &mut Light, (n, effective): (u32, f32), color: Rgb, place: F)
    where
        F: Fn(f32) -> Vec2,
    {
        let mut fade = 1.0;
        for k in 0..n {
            fade *= TRAIL_FADE;
            let past = place(ctx.t - (k + 1) as f32 * TRAIL_DT);
            light.dot(p, past, 0.008, color, 0.6 * fade * partial_weight(k, effective));
        }
    }
}

impl Generator for Pendulum {
    fn step_cap(&self, quality: Quality) -> u32 {
        let kind = self.kind;
        let trail = kind.trail_cap(quality);
        let extra = match kind {
            PendulumKind::WaveMachine => 1,
            PendulumKind::Sand => 1,
            _ => 0,
        };
        kind.count() * (kind.per_element() + trail) + extra
    }

    fn shade(&self, p: Vec2, ctx: &FieldCtx) -> Shade {
        let a = &ctx.audio;
        let cap = self.kind.trail_cap(ctx.quality);
        let effective = (cap as f32 * (0.5 + 0.5 * a.energy)).min(cap as f32);
        let trail = (trips(effective, cap), effective);

        let mut light = Light::default();
        match self.kind {
            PendulumKind::WaveArray => self.draw_wave_array(p, ctx, false, &mut light, trail),
            PendulumKind::Mirror => self.draw_wave_array(Vec2::new(p.x.abs(), p.y), ctx, true, &mut light, trail),
            PendulumKind::Circular => self.draw_circular(p, ctx, &mut light, trail),
            PendulumKind::Double => self.draw_double(p, ctx, &mut light, trail),
            PendulumKind::Spring => self.draw_spring(p, ctx, &mut light, trail),
            PendulumKind::Cradle => self.draw_cradle(p, ctx, &mut light),
            PendulumKind::WaveMachine => self.draw_wave_machine(p, ctx, &mut light),
            PendulumKind::Metronome => self.draw_metronome(p, ctx, &mut light, trail),
            PendulumKind::Firefly => self.draw_firefly(p, ctx, &mut light, trail),
            PendulumKind::Sand => self.draw_sand(p, ctx, &mut light, trail),
        }

        let backdrop = match self.kind {
            PendulumKind::Firefly => Vec3::new(0.0, 0.01, 0.02),
            PendulumKind::Sand => Vec3::ZERO,
            _ => Vec3::new(0.02, 0.02, 0.035) * (1.0 - 0.4 * p.length()).max(0.0),
        };
        // bar the rigs hang from
        let bar = match self.kind {
            PendulumKind::WaveArray | PendulumKind::Spring | PendulumKind::Cradle | PendulumKind::Mirror => {
                smoothstep(0.006, 0.0, (p.y - 0.44).abs()) * 0.2
            }
            _ => 0.0,
        };
        let gain = 0.75 + 0.25 * drive(a);
        Shade::new(backdrop + Vec3::splat(bar) + light.rgb * gain, light.steps)
    }
}
