use glam::Vec2;
use proptest::prelude::*;
use pulsefield::audio::{AudioSnapshot, SynthAudio};
use pulsefield::config::Quality;
use pulsefield::visual::field::render;
use pulsefield::visual::generators::attractor::{Attractor, BACKGROUND};
use pulsefield::visual::generators::pendulum::{Pendulum, PendulumKind, bob_position, period};
use pulsefield::visual::{FieldCtx, Generator, Registry, Viewport};

fn view() -> Viewport {
    Viewport::new(96, 54)
}

/// Sparse grid of field points covering the whole viewport.
fn grid_points() -> Vec<Vec2> {
    let v = view();
    let mut pts = Vec::new();
    for y in (3..v.height).step_by(9) {
        for x in (5..v.width).step_by(13) {
            pts.push(v.normalize(x, y));
        }
    }
    pts
}

fn in_unit(c: glam::Vec3) -> bool {
    c.to_array().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v))
}

/// Snapshot with field `k` (0..5 scalars, 5..13 bands) set to `v`.
fn with_field(mut s: AudioSnapshot, k: usize, v: f32) -> AudioSnapshot {
    match k {
        0 => s.bass = v,
        1 => s.mid = v,
        2 => s.treble = v,
        3 => s.energy = v,
        4 => s.beat = v,
        b => s.bands[b - 5] = v,
    }
    s
}

fn mid_snapshot(time: f64) -> AudioSnapshot {
    AudioSnapshot {
        time,
        bass: 0.4,
        mid: 0.35,
        treble: 0.3,
        energy: 0.45,
        beat: 0.2,
        bands: [0.5, 0.45, 0.4, 0.35, 0.3, 0.25, 0.2, 0.15],
    }
}

#[test]
fn registry_has_every_family() {
    let reg = Registry::default();
    assert_eq!(reg.len(), 21);
    for id in [
        "clifford",
        "dejong",
        "chladni",
        "flame",
        "harmonograph",
        "pendulum-wave",
        "sand-lissajous",
        "voronoi-flow",
        "phyllotaxis",
        "moire",
        "aurora",
        "halo",
        "julia-morph",
    ] {
        assert!(reg.index_of(id).is_some(), "missing {id}");
    }
}

#[test]
fn output_is_bounded_for_edge_snapshots() {
    let reg = Registry::default();
    let mut synth = SynthAudio::new(11);
    let mut snaps = vec![
        AudioSnapshot::silent(0.0),
        AudioSnapshot::silent(12.5),
        AudioSnapshot::saturated(0.0),
        AudioSnapshot::saturated(240.0),
    ];
    for f in 0..4 {
        snaps.push(synth.sample(f as f64 * 1.7));
    }
    for desc in reg.iter() {
        for snap in &snaps {
            for p in grid_points() {
                let c = render(desc.generator.as_ref(), p, snap.time, snap, view());
                assert!(in_unit(c), "{} out of range at {p:?}: {c:?}", desc.id);
            }
        }
    }
}

#[test]
fn garbage_input_still_yields_valid_color() {
    let reg = Registry::default();
    let snap = AudioSnapshot {
        time: f64::NAN,
        bass: f32::NAN,
        mid: f32::INFINITY,
        treble: -3.0,
        energy: f32::NEG_INFINITY,
        beat: 7.0,
        bands: [f32::NAN, 2.0, -1.0, 0.5, f32::INFINITY, 0.0, 1.0, 0.3],
    };
    for desc in reg.iter() {
        for p in [Vec2::ZERO, Vec2::new(1e6, -1e6), Vec2::new(f32::NAN, 0.0)] {
            let c = render(desc.generator.as_ref(), p, snap.time, &snap, view());
            assert!(in_unit(c), "{} produced {c:?}", desc.id);
        }
    }
}

#[test]
fn render_is_deterministic() {
    let reg = Registry::default();
    let snap = mid_snapshot(7.25);
    for desc in reg.iter() {
        for p in grid_points() {
            let a = render(desc.generator.as_ref(), p, 7.25, &snap, view());
            let b = render(desc.generator.as_ref(), p, 7.25, &snap, view());
            assert_eq!(a, b, "{} differs between calls", desc.id);
        }
    }
}

#[test]
fn iterations_stay_under_cap_at_every_tier() {
    let reg = Registry::default();
    let v = view();
    for desc in reg.iter() {
        for q in Quality::all() {
            let cap = desc.generator.step_cap(q);
            for snap in [AudioSnapshot::saturated(3.0), AudioSnapshot::silent(3.0), mid_snapshot(90.0)] {
                let ctx = FieldCtx::new(snap.time, &snap, v, q);
                for p in grid_points() {
                    let steps = desc.generator.shade(p, &ctx).steps;
                    assert!(steps <= cap, "{} at {}: {steps} > {cap}", desc.id, q.label());
                }
            }
        }
    }
}

#[test]
fn higher_tiers_never_lower_the_cap() {
    let reg = Registry::default();
    for desc in reg.iter() {
        let caps: Vec<u32> = Quality::all().iter().map(|&q| desc.generator.step_cap(q)).collect();
        // all() runs from Ultra down to Fast
        assert!(caps.windows(2).all(|w| w[0] >= w[1]), "{}: {caps:?}", desc.id);
    }
}

/// Largest color change allowed between neighbouring sweep values.
const MAX_STEP_DELTA: f32 = 0.35;

/// Denser grid for the continuity sweeps.
fn sweep_points() -> Vec<Vec2> {
    let v = view();
    let mut pts = Vec::new();
    for y in (3..v.height).step_by(6) {
        for x in (4..v.width).step_by(8) {
            pts.push(v.normalize(x, y));
        }
    }
    pts
}

/// Worst per-step color change while field `k` walks `values` in order,
/// with the value where it happened.
fn worst_step(g: &dyn Generator, base: AudioSnapshot, k: usize, values: &[f32], pts: &[Vec2]) -> (f32, f32) {
    let shade_all = |v: f32| -> Vec<glam::Vec3> {
        let snap = with_field(base, k, v);
        pts.iter().map(|&p| render(g, p, snap.time, &snap, view())).collect()
    };
    let mut prev = shade_all(values[0]);
    let mut worst = (0.0f32, values[0]);
    for &v in &values[1..] {
        let next = shade_all(v);
        for (a, b) in prev.iter().zip(&next) {
            let d = (*a - *b).abs().max_element();
            if d > worst.0 {
                worst = (d, v);
            }
        }
        prev = next;
    }
    worst
}

#[test]
fn dense_audio_sweeps_change_color_smoothly() {
    let reg = Registry::default();
    let pts = sweep_points();
    let values: Vec<f32> = (0..=200).map(|i| i as f32 * 0.005).collect();
    let base = mid_snapshot(5.0);
    for desc in reg.iter() {
        for k in 0..13 {
            let (delta, at) = worst_step(desc.generator.as_ref(), base, k, &values, &pts);
            assert!(
                delta < MAX_STEP_DELTA,
                "{} jumps by {delta} for a 0.005 step of field {k} at {at}",
                desc.id
            );
        }
    }
}

#[test]
fn julia_morph_holds_steady_under_tiny_bass_steps() {
    let reg = Registry::default();
    let julia = reg.get(reg.index_of("julia-morph").unwrap()).unwrap();
    let pts = sweep_points();
    let values: Vec<f32> = (0..=3000).map(|i| 0.82 + i as f32 * 1e-5).collect();
    let (delta, at) = worst_step(julia.generator.as_ref(), mid_snapshot(5.0), 0, &values, &pts);
    assert!(delta < 0.15, "julia-morph jumps by {delta} for a 1e-5 bass step at {at}");
}

#[test]
fn small_time_steps_give_small_color_changes() {
    let reg = Registry::default();
    let snap = mid_snapshot(0.0);
    for desc in reg.iter() {
        let mut worst = 0.0f32;
        for t in [1.0f64, 4.0, 17.0] {
            for p in grid_points() {
                let a = render(desc.generator.as_ref(), p, t, &snap, view());
                let b = render(desc.generator.as_ref(), p, t + 1e-4, &snap, view());
                worst = worst.max((a - b).abs().max_element());
            }
        }
        assert!(worst < 0.3, "{} jumps by {worst} over a 0.1 ms step", desc.id);
    }
}

#[test]
fn silent_attractor_at_start_shows_background() {
    let snap = AudioSnapshot::silent(0.0);
    for g in [Attractor::clifford(), Attractor::de_jong()] {
        for p in grid_points() {
            let c = render(&g, p, 0.0, &snap, view());
            assert!((c - BACKGROUND).abs().max_element() < 1e-6, "{c:?}");
        }
    }
}

#[test]
fn pendulum_bob_hangs_straight_at_phase_zero() {
    let snap = AudioSnapshot {
        beat: 1.0,
        ..AudioSnapshot::silent(0.0)
    };
    let n = PendulumKind::WaveArray.count();
    for i in 0..n {
        let anchor = Vec2::new(-0.62 + 1.24 * i as f32 / (n - 1) as f32, 0.44);
        let r = period(i) / period(0);
        let length = 0.78 * r * r;
        let expected = anchor + length * Vec2::new(0.0f32.sin(), -0.0f32.cos());
        let bob = Pendulum::wave_bob(i, 0.0, &snap);
        assert!((bob - expected).length() < 1e-5, "bob {i}: {bob:?} vs {expected:?}");
        assert!((bob - bob_position(anchor, length, 0.0)).length() < 1e-6);
    }
}

#[test]
fn pendulum_bob_passes_through_rest_every_half_period() {
    let snap = AudioSnapshot::saturated(0.0);
    let i = 5;
    let half = period(i) * 0.5;
    let rest = Pendulum::wave_bob(i, 0.0, &snap);
    let later = Pendulum::wave_bob(i, half * 3.0, &snap);
    assert!((rest - later).length() < 1e-3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn any_snapshot_renders_in_range(
        idx in 0usize..21,
        levels in prop::array::uniform5(proptest::num::f32::ANY),
        bands in prop::array::uniform8(-2.0f32..3.0),
        time in -10.0f64..1.0e4,
        x in -1.5f32..1.5,
        y in -1.0f32..1.0,
    ) {
        let reg = Registry::default();
        let desc = reg.get(idx).unwrap();
        let snap = AudioSnapshot {
            time,
            bass: levels[0],
            mid: levels[1],
            treble: levels[2],
            energy: levels[3],
            beat: levels[4],
            bands,
        };
        let c = render(desc.generator.as_ref(), Vec2::new(x, y), time, &snap, view());
        prop_assert!(in_unit(c), "{} -> {:?}", desc.id, c);
    }
}
