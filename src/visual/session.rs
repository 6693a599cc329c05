use crate::visual::registry::{ClockPolicy, Registry};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("unknown visualizer id `{id}`")]
    UnknownVisualizer { id: String },
    #[error("no visualizers registered")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Idle,
    Active(usize),
    Transitioning { from: usize, to: usize, progress: f32 },
}

/// One generator to evaluate this frame and the clock it runs on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub index: usize,
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Plan {
    Idle,
    Single(Layer),
    /// Linear blend, `progress` 0 shows `from` only, 1 shows `to` only.
    Blend { from: Layer, to: Layer, progress: f32 },
}

/// Selection and crossfade state for one render surface.
///
/// Mutated only between frames. Clocks are tracked per descriptor: a
/// `Session` descriptor reads time since the session started, a
/// `ResetOnSelect` descriptor reads time since it last became the target.
pub struct VisualizerSession {
    state: SessionState,
    ids: Vec<&'static str>,
    clocks: Vec<ClockPolicy>,
    origins: Vec<Option<f64>>,
    started: Option<f64>,
    now: f64,
    rate: f32,
}

impl VisualizerSession {
    /// `rate` is the crossfade progress added per frame.
    pub fn new(registry: &Registry, rate: f32) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 { rate.min(1.0) } else { 1.0 };
        Self {
            state: SessionState::Idle,
            ids: registry.iter().map(|d| d.id).collect(),
            clocks: registry.iter().map(|d| d.clock).collect(),
            origins: vec![None; registry.len()],
            started: None,
            now: 0.0,
            rate,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The descriptor the session is showing or fading toward.
    pub fn target(&self) -> Option<usize> {
        match self.state {
            SessionState::Idle => None,
            SessionState::Active(i) => Some(i),
            SessionState::Transitioning { to, .. } => Some(to),
        }
    }

    pub fn target_id(&self) -> Option<&'static str> {
        self.target().and_then(|i| self.ids.get(i).copied())
    }

    pub fn transition_rate(&self) -> f32 {
        self.rate
    }

    pub fn set_transition_rate(&mut self, rate: f32) {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate.min(1.0);
        }
    }

    /// Seconds since the first frame of this session.
    pub fn session_time(&self) -> f64 {
        self.started.map_or(0.0, |s| (self.now - s).max(0.0))
    }

    /// Logical time for descriptor `index`.
    pub fn clock(&self, index: usize) -> f64 {
        match self.clocks.get(index) {
            Some(ClockPolicy::ResetOnSelect) => match self.origins.get(index).copied().flatten() {
                Some(origin) => (self.now - origin).max(0.0),
                None => self.session_time(),
            },
            _ => self.session_time(),
        }
    }

    pub fn select(&mut self, id: &str) -> Result<(), SelectError> {
        let Some(index) = self.ids.iter().position(|&d| d == id) else {
            warn!(id, "select: unknown visualizer, keeping current selection");
            return Err(SelectError::UnknownVisualizer { id: id.to_string() });
        };
        self.retarget(index);
        Ok(())
    }

    /// Next descriptor after the current target, wrapping.
    pub fn cycle(&mut self) -> Result<(), SelectError> {
        if self.ids.is_empty() {
            return Err(SelectError::Empty);
        }
        let next = self.target().map_or(0, |i| (i + 1) % self.ids.len());
        self.retarget(next);
        Ok(())
    }

    fn retarget(&mut self, index: usize) {
        let next = match self.state {
            SessionState::Idle => SessionState::Active(index),
            SessionState::Active(current) if current == index => return,
            SessionState::Active(current) => SessionState::Transitioning {
                from: current,
                to: index,
                progress: 0.0,
            },
            SessionState::Transitioning { to, .. } if to == index => return,
            // reversing a fade keeps the on-screen mix
            SessionState::Transitioning { from, to, progress } if from == index => SessionState::Transitioning {
                from: to,
                to: index,
                progress: 1.0 - progress,
            },
            SessionState::Transitioning { to, .. } => SessionState::Transitioning {
                from: to,
                to: index,
                progress: 0.0,
            },
        };

        let visible = match self.state {
            SessionState::Idle => false,
            SessionState::Active(i) => i == index,
            SessionState::Transitioning { from, to, .. } => from == index || to == index,
        };
        if !visible && self.clocks.get(index) == Some(&ClockPolicy::ResetOnSelect) {
            self.origins[index] = Some(self.now);
        }

        debug!(from = ?self.state, to = ?next, id = self.ids[index], "session retarget");
        self.state = next;
    }

    /// Per-frame update: move the clock to `now` and step any crossfade.
    pub fn advance(&mut self, now: f64) {
        let now = if now.is_finite() { now } else { self.now };
        if self.started.is_none() {
            // selections made before the first frame restart with the session
            self.started = Some(now);
            self.now = now;
            for origin in self.origins.iter_mut().flatten() {
                *origin = now;
            }
        }
        // the clock never runs backwards
        self.now = now.max(self.now);

        if let SessionState::Transitioning { from, to, progress } = self.state {
            let progress = progress + self.rate;
            self.state = if progress >= 1.0 {
                debug!(id = self.ids[to], "transition complete");
                SessionState::Active(to)
            } else {
                SessionState::Transitioning { from, to, progress }
            };
        }
    }

    pub fn plan(&self) -> Plan {
        let layer = |index| Layer {
            index,
            time: self.clock(index),
        };
        match self.state {
            SessionState::Idle => Plan::Idle,
            SessionState::Active(i) => Plan::Single(layer(i)),
            SessionState::Transitioning { from, to, progress } => Plan::Blend {
                from: layer(from),
                to: layer(to),
                progress,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(rate: f32) -> VisualizerSession {
        VisualizerSession::new(&Registry::default(), rate)
    }

    #[test]
    fn select_from_idle_activates_directly() {
        let mut s = session(0.25);
        s.select("moire").unwrap();
        assert!(matches!(s.state(), SessionState::Active(_)));
        assert_eq!(s.target_id(), Some("moire"));
    }

    #[test]
    fn transition_collapses_after_enough_frames() {
        let mut s = session(0.25);
        s.select("clifford").unwrap();
        s.select("dejong").unwrap();
        for f in 0..3 {
            s.advance(f as f64 / 60.0);
            assert!(matches!(s.state(), SessionState::Transitioning { .. }));
        }
        s.advance(3.0 / 60.0);
        assert_eq!(s.state(), SessionState::Active(1));
    }

    #[test]
    fn reversing_a_fade_keeps_the_mix() {
        let mut s = session(0.25);
        s.select("clifford").unwrap();
        s.select("dejong").unwrap();
        s.advance(0.0);
        s.select("clifford").unwrap();
        assert_eq!(
            s.state(),
            SessionState::Transitioning {
                from: 1,
                to: 0,
                progress: 0.75
            }
        );
    }

    #[test]
    fn unknown_id_leaves_state_alone() {
        let mut s = session(0.5);
        s.select("flame").unwrap();
        let before = s.state();
        let err = s.select("does-not-exist").unwrap_err();
        assert_eq!(
            err,
            SelectError::UnknownVisualizer {
                id: "does-not-exist".into()
            }
        );
        assert_eq!(s.state(), before);
    }

    #[test]
    fn reset_clock_selected_before_first_frame_starts_at_zero() {
        let mut s = session(1.0);
        s.select("harmonograph").unwrap();
        let idx = s.target().unwrap();
        assert_eq!(s.clocks[idx], ClockPolicy::ResetOnSelect);
        s.advance(1000.0);
        assert_eq!(s.clock(idx), 0.0);
        s.advance(1002.5);
        assert_eq!(s.clock(idx), 2.5);
    }

    #[test]
    fn reset_policy_restarts_clock_on_select() {
        let mut s = session(1.0);
        s.select("clifford").unwrap();
        s.advance(10.0);
        s.advance(15.0);
        assert_eq!(s.clock(0), 5.0);
        s.select("pendulum-wave").unwrap();
        let idx = s.target().unwrap();
        assert_eq!(s.clock(idx), 0.0);
        s.advance(16.5);
        assert_eq!(s.clock(idx), 1.5);
        assert_eq!(s.clock(0), 6.5);
    }
}
