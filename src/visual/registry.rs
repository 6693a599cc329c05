use crate::visual::field::Generator;
use crate::visual::generators::attractor::Attractor;
use crate::visual::generators::aurora::{Aurora, Halo};
use crate::visual::generators::flame::Flame;
use crate::visual::generators::fractal::JuliaMorph;
use crate::visual::generators::harmonograph::Harmonograph;
use crate::visual::generators::moire::Moire;
use crate::visual::generators::pendulum::{Pendulum, PendulumKind};
use crate::visual::generators::phyllotaxis::Phyllotaxis;
use crate::visual::generators::resonance::Resonance;
use crate::visual::generators::voronoi::VoronoiFlow;

/// Which clock a generator sees after it is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPolicy {
    /// Keeps running on session time, so reselecting continues where the
    /// motion would have been anyway.
    Session,
    /// Restarts at zero whenever the visualizer becomes the selection target.
    /// Only safe because the switch is crossfaded.
    ResetOnSelect,
}

pub struct VisualizerDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub clock: ClockPolicy,
    pub generator: Box<dyn Generator>,
}

impl VisualizerDescriptor {
    fn new(id: &'static str, name: &'static str, generator: Box<dyn Generator>) -> Self {
        Self {
            id,
            name,
            clock: ClockPolicy::Session,
            generator,
        }
    }

    fn reset_on_select(mut self) -> Self {
        self.clock = ClockPolicy::ResetOnSelect;
        self
    }
}

impl std::fmt::Debug for VisualizerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualizerDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// `{id, name}` pair for UI lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualizerEntry {
    pub id: &'static str,
    pub name: &'static str,
}

/// Every visualizer in registration order. Built once at startup.
pub fn make_visualizers() -> Vec<VisualizerDescriptor> {
    use PendulumKind::*;

    let mut v = vec![
        VisualizerDescriptor::new("clifford", "Clifford Attractor", Box::new(Attractor::clifford())),
        VisualizerDescriptor::new("dejong", "De Jong Attractor", Box::new(Attractor::de_jong())),
        VisualizerDescriptor::new("chladni", "Chladni Sand", Box::new(Resonance::new())),
        VisualizerDescriptor::new("flame", "Fractal Flame", Box::new(Flame::new())),
        VisualizerDescriptor::new("harmonograph", "Harmonograph", Box::new(Harmonograph::new())).reset_on_select(),
    ];

    let pendulums = [
        (WaveArray, "pendulum-wave", "Pendulum Wave"),
        (Circular, "pendulum-circle", "Circular Pendulums"),
        (Double, "pendulum-double", "Double Pendulum"),
        (Spring, "pendulum-spring", "Spring Pendulums"),
        (Cradle, "newton-cradle", "Newton's Cradle"),
        (WaveMachine, "wave-machine", "Wave Machine"),
        (Metronome, "metronome", "Metronomes"),
        (Firefly, "firefly", "Firefly Swing"),
        (Mirror, "pendulum-mirror", "Mirror Pendulums"),
        (Sand, "sand-lissajous", "Sand Lissajous"),
    ];
    for (kind, id, name) in pendulums {
        let d = VisualizerDescriptor::new(id, name, Box::new(Pendulum::new(kind)));
        // the wave array and sand table read best from their aligned start
        let d = if matches!(kind, WaveArray | Sand) { d.reset_on_select() } else { d };
        v.push(d);
    }

    v.push(VisualizerDescriptor::new("voronoi-flow", "Voronoi Flow", Box::new(VoronoiFlow::new())));
    v.push(VisualizerDescriptor::new("phyllotaxis", "Phyllotaxis Bloom", Box::new(Phyllotaxis::new())));
    v.push(VisualizerDescriptor::new("moire", "Moire Interference", Box::new(Moire::new())));
    v.push(VisualizerDescriptor::new("aurora", "Aurora Curtains", Box::new(Aurora::new())));
    v.push(VisualizerDescriptor::new("halo", "Celestial Halo", Box::new(Halo::new())));
    v.push(VisualizerDescriptor::new("julia-morph", "Julia Morph", Box::new(JuliaMorph::new())));
    v
}

pub struct Registry {
    items: Vec<VisualizerDescriptor>,
}

impl Registry {
    pub fn new(items: Vec<VisualizerDescriptor>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VisualizerDescriptor> {
        self.items.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|d| d.id == id)
    }

    pub fn entries(&self) -> Vec<VisualizerEntry> {
        self.items
            .iter()
            .map(|d| VisualizerEntry { id: d.id, name: d.name })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisualizerDescriptor> {
        self.items.iter()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(make_visualizers())
    }
}
