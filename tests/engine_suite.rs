use pulsefield::audio::{AudioSnapshot, SynthAudio};
use pulsefield::config::{Config, Quality};
use pulsefield::visual::{EngineOptions, FieldEngine, PostFx, Registry, SessionState, Surface, Viewport};

fn engine(threads: usize, rate: f32) -> FieldEngine {
    FieldEngine::new(
        Registry::default(),
        EngineOptions {
            threads,
            transition_rate: rate,
            ..EngineOptions::default()
        },
    )
}

fn lit_pixels(s: &Surface) -> usize {
    s.as_bytes()
        .chunks_exact(4)
        .filter(|p| p[0] > 10 || p[1] > 10 || p[2] > 10)
        .count()
}

#[test]
fn first_frame_activates_and_fills_surface() {
    let mut e = engine(1, 1.0);
    let view = Viewport::new(64, 36);
    let mut surface = Surface::default();
    let mut synth = SynthAudio::new(3);
    assert_eq!(e.session().state(), SessionState::Idle);
    e.render_frame(&mut surface, &synth.sample(2.0), view);
    assert!(matches!(e.session().state(), SessionState::Active(0)));
    assert_eq!(surface.as_bytes().len(), 64 * 36 * 4);
    assert!(surface.as_bytes().chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn every_visualizer_draws_something() {
    let mut e = engine(1, 1.0);
    let view = Viewport::new(80, 44);
    let mut surface = Surface::new(view);
    let mut synth = SynthAudio::new(21);
    for entry in e.visualizers() {
        e.select_visualizer(entry.id).unwrap();
        let mut lit = 0;
        for f in 0..6 {
            let snap = synth.sample(1.0 + f as f64 * 0.5);
            e.render_frame(&mut surface, &snap, view);
            lit = lit.max(lit_pixels(&surface));
        }
        assert!(lit > 0, "{} rendered a black surface", entry.id);
    }
}

#[test]
fn threaded_render_matches_single_thread() {
    let view = Viewport::new(73, 41);
    let mut synth = SynthAudio::new(5);
    let snaps: Vec<AudioSnapshot> = (0..4).map(|f| synth.sample(0.5 + f as f64 / 60.0)).collect();
    for id in ["clifford", "flame", "pendulum-double", "voronoi-flow", "julia-morph"] {
        let mut single = engine(1, 0.3);
        let mut multi = engine(4, 0.3);
        let mut a = Surface::new(view);
        let mut b = Surface::new(view);
        for e in [&mut single, &mut multi] {
            e.select_visualizer("aurora").unwrap();
            e.select_visualizer(id).unwrap();
        }
        for snap in &snaps {
            single.render_frame(&mut a, snap, view);
            multi.render_frame(&mut b, snap, view);
            assert_eq!(a.as_bytes(), b.as_bytes(), "{id} differs with 4 threads");
        }
    }
}

#[test]
fn surface_follows_viewport_changes() {
    let mut e = engine(2, 1.0);
    let mut surface = Surface::new(Viewport::new(10, 10));
    let snap = AudioSnapshot::silent(1.0);
    e.render_frame(&mut surface, &snap, Viewport::new(33, 17));
    assert_eq!((surface.width(), surface.height()), (33, 17));
    assert_eq!(surface.as_bytes().len(), 33 * 17 * 4);
    assert!(surface.pixel(32, 16).is_some());
    assert!(surface.pixel(33, 0).is_none());

    e.render_frame(&mut surface, &snap, Viewport::new(0, 12));
    assert!(surface.as_bytes().is_empty());
}

#[test]
fn nan_snapshot_does_not_poison_the_frame() {
    let mut e = engine(1, 1.0);
    let view = Viewport::new(32, 18);
    let mut surface = Surface::new(view);
    let bad = AudioSnapshot {
        time: f64::INFINITY,
        bass: f32::NAN,
        mid: f32::NAN,
        treble: f32::INFINITY,
        energy: -1.0,
        beat: f32::NAN,
        bands: [f32::NAN; 8],
    };
    assert!(!bad.is_sane());
    for entry in e.visualizers() {
        e.select_visualizer(entry.id).unwrap();
        e.render_frame(&mut surface, &bad, view);
        assert!(surface.as_bytes().chunks_exact(4).all(|p| p[3] == 255));
    }
}

#[test]
fn crossfade_midpoint_sits_between_both_sides() {
    let view = Viewport::new(24, 16);
    let snap = AudioSnapshot::saturated(3.0);
    let render_only = |id: &str| {
        let mut e = engine(1, 1.0);
        e.set_post(PostFx::off());
        e.select_visualizer(id).unwrap();
        let mut s = Surface::new(view);
        e.render_frame(&mut s, &snap, view);
        s
    };
    let a = render_only("moire");
    let b = render_only("halo");

    let mut e = engine(1, 0.5);
    e.set_post(PostFx::off());
    e.select_visualizer("moire").unwrap();
    e.select_visualizer("halo").unwrap();
    let mut mid = Surface::new(view);
    e.render_frame(&mut mid, &snap, view);
    assert!(matches!(e.session().state(), SessionState::Transitioning { .. }));

    for ((pa, pb), pm) in a.as_bytes().iter().zip(b.as_bytes()).zip(mid.as_bytes()) {
        let lo = (*pa).min(*pb).saturating_sub(1);
        let hi = (*pa).max(*pb).saturating_add(1);
        assert!((lo..=hi).contains(pm));
    }
}

#[test]
fn list_matches_registry_order() {
    let e = FieldEngine::with_defaults();
    let list = e.visualizers();
    assert_eq!(list.len(), e.registry().len());
    assert_eq!(list[0].id, "clifford");
    assert_eq!(list.last().map(|v| v.id), Some("julia-morph"));
    assert!(list.iter().any(|v| v.id == "pendulum-wave"));
}

#[test]
fn options_follow_cli_flags() {
    use clap::Parser;
    let cfg = Config::parse_from([
        "pulsefield",
        "--quality",
        "fast",
        "--threads",
        "0",
        "--fps",
        "30",
        "--transition-ms",
        "500",
        "--post-fx",
        "false",
    ]);
    let opts = EngineOptions::from_config(&cfg);
    assert_eq!(opts.quality, Quality::Fast);
    assert_eq!(opts.threads, 1);
    assert!((opts.transition_rate - 1.0 / 15.0).abs() < 1e-6);
    assert!(!opts.post.enabled);
}

#[test]
fn start_visualizer_with_reset_clock_starts_at_zero() {
    let mut e = engine(1, 1.0);
    let view = Viewport::new(16, 10);
    let mut surface = Surface::new(view);
    e.select_visualizer("sand-lissajous").unwrap();
    e.render_frame(&mut surface, &AudioSnapshot::silent(5000.0), view);
    let idx = e.registry().index_of("sand-lissajous").unwrap();
    assert_eq!(e.session().clock(idx), 0.0);
    e.render_frame(&mut surface, &AudioSnapshot::silent(5001.0), view);
    assert_eq!(e.session().clock(idx), 1.0);
}
