use pulsefield::visual::{ClockPolicy, Plan, Registry, SelectError, SessionState, VisualizerSession};

fn active_id(s: &VisualizerSession) -> Option<&'static str> {
    s.target_id()
}

#[test]
fn starts_idle_with_no_plan() {
    let s = VisualizerSession::new(&Registry::default(), 0.1);
    assert_eq!(s.state(), SessionState::Idle);
    assert_eq!(s.plan(), Plan::Idle);
    assert_eq!(s.target(), None);
}

#[test]
fn cycling_registry_size_times_returns_to_start() {
    let reg = Registry::default();
    let mut s = VisualizerSession::new(&reg, 1.0);
    s.select("flame").unwrap();
    let start = active_id(&s);
    for f in 0..reg.len() {
        s.cycle().unwrap();
        s.advance(f as f64 / 60.0);
    }
    assert_eq!(active_id(&s), start);
    assert!(matches!(s.state(), SessionState::Active(_)));
}

#[test]
fn cycle_follows_registration_order_and_wraps() {
    let reg = Registry::default();
    let mut s = VisualizerSession::new(&reg, 1.0);
    s.cycle().unwrap();
    assert_eq!(s.target(), Some(0));
    s.select("julia-morph").unwrap();
    s.advance(0.0);
    s.cycle().unwrap();
    assert_eq!(s.target(), Some(0));
    assert_eq!(reg.index_of("julia-morph"), Some(reg.len() - 1));
}

#[test]
fn unknown_id_is_an_error_and_changes_nothing() {
    let mut s = VisualizerSession::new(&Registry::default(), 0.1);
    s.select("aurora").unwrap();
    s.select("halo").unwrap();
    s.advance(0.0);
    let before = s.state();
    match s.select("not-a-visualizer") {
        Err(SelectError::UnknownVisualizer { id }) => assert_eq!(id, "not-a-visualizer"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(s.state(), before);
}

#[test]
fn empty_registry_cannot_cycle() {
    let mut s = VisualizerSession::new(&Registry::new(Vec::new()), 0.1);
    assert_eq!(s.cycle(), Err(SelectError::Empty));
    assert_eq!(s.state(), SessionState::Idle);
}

#[test]
fn blend_progress_grows_by_rate_each_frame() {
    let mut s = VisualizerSession::new(&Registry::default(), 0.25);
    s.select("moire").unwrap();
    s.select("aurora").unwrap();
    let mut last = 0.0f32;
    for f in 1..4 {
        s.advance(f as f64 / 60.0);
        let Plan::Blend { progress, from, to } = s.plan() else {
            panic!("expected a blend on frame {f}");
        };
        assert!(progress > last);
        assert!((progress - 0.25 * f as f32).abs() < 1e-6);
        assert_ne!(from.index, to.index);
        last = progress;
    }
    s.advance(4.0 / 60.0);
    assert!(matches!(s.plan(), Plan::Single(_)));
    assert_eq!(s.target_id(), Some("aurora"));
}

#[test]
fn selecting_mid_fade_retargets_from_current_target() {
    let reg = Registry::default();
    let mut s = VisualizerSession::new(&reg, 0.2);
    s.select("clifford").unwrap();
    s.select("dejong").unwrap();
    s.advance(0.0);
    s.select("moire").unwrap();
    let moire = reg.index_of("moire").unwrap();
    assert_eq!(
        s.state(),
        SessionState::Transitioning {
            from: 1,
            to: moire,
            progress: 0.0
        }
    );
}

#[test]
fn reselecting_target_is_a_no_op() {
    let mut s = VisualizerSession::new(&Registry::default(), 0.2);
    s.select("clifford").unwrap();
    s.select("dejong").unwrap();
    s.advance(0.0);
    let before = s.state();
    s.select("dejong").unwrap();
    assert_eq!(s.state(), before);
}

#[test]
fn session_clock_keeps_running_across_switches() {
    let reg = Registry::default();
    let mut s = VisualizerSession::new(&reg, 1.0);
    s.select("clifford").unwrap();
    s.advance(100.0);
    s.advance(104.0);
    s.select("dejong").unwrap();
    s.advance(106.0);
    let dejong = reg.index_of("dejong").unwrap();
    assert_eq!(reg.get(dejong).map(|d| d.clock), Some(ClockPolicy::Session));
    assert_eq!(s.clock(dejong), 6.0);
    assert_eq!(s.session_time(), 6.0);
}

#[test]
fn clock_never_runs_backwards() {
    let mut s = VisualizerSession::new(&Registry::default(), 1.0);
    s.select("halo").unwrap();
    s.advance(10.0);
    s.advance(12.0);
    s.advance(11.0);
    s.advance(f64::NAN);
    assert_eq!(s.session_time(), 2.0);
}

#[test]
fn reset_clock_only_restarts_when_not_visible() {
    let reg = Registry::default();
    let wave = reg.index_of("pendulum-wave").unwrap();
    let mut s = VisualizerSession::new(&reg, 0.5);
    s.select("pendulum-wave").unwrap();
    s.advance(0.0);
    s.advance(3.0);
    s.select("moire").unwrap();
    s.advance(4.0);
    // still on screen as the fade source: reversing must not jump its clock
    s.select("pendulum-wave").unwrap();
    assert_eq!(s.clock(wave), 4.0);
}
