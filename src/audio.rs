use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering, fence};
use std::thread;
use std::time::{Duration, Instant};

/// Per-frame audio features. Produced by an external analyzer, read-only to
/// every generator. All level fields are normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSnapshot {
    /// Monotonic seconds.
    pub time: f64,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub energy: f32,
    /// Onset impulse, decays toward 0 between beats.
    pub beat: f32,
    pub bands: [f32; 8],
}

impl Default for AudioSnapshot {
    fn default() -> Self {
        Self::silent(0.0)
    }
}

impl AudioSnapshot {
    pub fn silent(time: f64) -> Self {
        Self {
            time,
            bass: 0.0,
            mid: 0.0,
            treble: 0.0,
            energy: 0.0,
            beat: 0.0,
            bands: [0.0; 8],
        }
    }

    /// Every level field pinned to 1.0; the worst case for audio-modulated work.
    pub fn saturated(time: f64) -> Self {
        Self {
            time,
            bass: 1.0,
            mid: 1.0,
            treble: 1.0,
            energy: 1.0,
            beat: 1.0,
            bands: [1.0; 8],
        }
    }

    /// Band lookup with wrap-around, `band(i)` == `bands[i % 8]`.
    #[inline]
    pub fn band(&self, i: usize) -> f32 {
        self.bands[i % 8]
    }

    /// Clamp every field into its valid range. NaN levels become 0, +inf
    /// becomes 1, and a non-finite or negative time becomes 0.
    pub fn sanitized(&self) -> Self {
        let time = if self.time.is_finite() { self.time.max(0.0) } else { 0.0 };
        let mut bands = [0.0f32; 8];
        for (dst, src) in bands.iter_mut().zip(self.bands) {
            *dst = unit(src);
        }
        Self {
            time,
            bass: unit(self.bass),
            mid: unit(self.mid),
            treble: unit(self.treble),
            energy: unit(self.energy),
            beat: unit(self.beat),
            bands,
        }
    }

    pub fn is_sane(&self) -> bool {
        *self == self.sanitized()
    }
}

#[inline]
fn unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Single-producer/single-consumer latest-value slot.
///
/// The producer overwrites the slot with `publish`; the renderer reads the
/// most recent complete snapshot with `try_load`. Torn reads are detected by
/// a sequence counter (odd while a write is in flight) and reported as
/// `None` after a few attempts instead of spinning.
pub struct SnapshotSlot {
    seq: AtomicU64,
    time: AtomicU64,
    bass: AtomicU32,
    mid: AtomicU32,
    treble: AtomicU32,
    energy: AtomicU32,
    beat: AtomicU32,
    bands: [AtomicU32; 8],
}

const LOAD_ATTEMPTS: usize = 4;

impl SnapshotSlot {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            time: AtomicU64::new(0),
            bass: AtomicU32::new(0),
            mid: AtomicU32::new(0),
            treble: AtomicU32::new(0),
            energy: AtomicU32::new(0),
            beat: AtomicU32::new(0),
            bands: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    pub fn publish(&self, s: AudioSnapshot) {
        self.seq.fetch_add(1, Ordering::Relaxed); // odd => write in progress
        fence(Ordering::Release);
        self.time.store(s.time.to_bits(), Ordering::Relaxed);
        self.bass.store(s.bass.to_bits(), Ordering::Relaxed);
        self.mid.store(s.mid.to_bits(), Ordering::Relaxed);
        self.treble.store(s.treble.to_bits(), Ordering::Relaxed);
        self.energy.store(s.energy.to_bits(), Ordering::Relaxed);
        self.beat.store(s.beat.to_bits(), Ordering::Relaxed);
        for (dst, src) in self.bands.iter().zip(s.bands) {
            dst.store(src.to_bits(), Ordering::Relaxed);
        }
        self.seq.fetch_add(1, Ordering::Release); // even => stable
    }

    /// Number of completed publishes.
    pub fn generation(&self) -> u64 {
        self.seq.load(Ordering::Acquire) / 2
    }

    /// Latest complete snapshot, or `None` if nothing was published yet or
    /// the producer kept the slot busy for every attempt.
    pub fn try_load(&self) -> Option<(u64, AudioSnapshot)> {
        for _ in 0..LOAD_ATTEMPTS {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 == 0 {
                return None;
            }
            if v1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }

            let time = f64::from_bits(self.time.load(Ordering::Relaxed));
            let bass = f32::from_bits(self.bass.load(Ordering::Relaxed));
            let mid = f32::from_bits(self.mid.load(Ordering::Relaxed));
            let treble = f32::from_bits(self.treble.load(Ordering::Relaxed));
            let energy = f32::from_bits(self.energy.load(Ordering::Relaxed));
            let beat = f32::from_bits(self.beat.load(Ordering::Relaxed));
            let mut bands = [0.0f32; 8];
            for (i, src) in self.bands.iter().enumerate() {
                bands[i] = f32::from_bits(src.load(Ordering::Relaxed));
            }

            fence(Ordering::Acquire);
            let v2 = self.seq.load(Ordering::Relaxed);
            if v1 == v2 {
                let snap = AudioSnapshot {
                    time,
                    bass,
                    mid,
                    treble,
                    energy,
                    beat,
                    bands,
                };
                return Some((v1 / 2, snap));
            }
        }
        None
    }
}

impl Default for SnapshotSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Renderer-side handle: always yields a snapshot, falling back to the
/// previous one when the slot has nothing newer (never waits on audio).
pub struct SnapshotReader {
    slot: Arc<SnapshotSlot>,
    last: AudioSnapshot,
    last_generation: u64,
    stale_frames: u32,
}

impl SnapshotReader {
    pub fn new(slot: Arc<SnapshotSlot>) -> Self {
        Self {
            slot,
            last: AudioSnapshot::default(),
            last_generation: 0,
            stale_frames: 0,
        }
    }

    pub fn latest(&mut self) -> AudioSnapshot {
        match self.slot.try_load() {
            Some((generation, snap)) if generation != self.last_generation => {
                self.last = snap;
                self.last_generation = generation;
                self.stale_frames = 0;
            }
            _ => {
                self.stale_frames = self.stale_frames.saturating_add(1);
            }
        }
        self.last
    }

    /// Consecutive reads that reused the previous snapshot.
    pub fn stale_frames(&self) -> u32 {
        self.stale_frames
    }
}

/// Deterministic stand-in for an audio analyzer: layered sinusoids for the
/// spectrum, a decaying impulse on a fixed tempo for `beat`, plus seeded
/// jitter so repeated runs with the same seed match exactly.
#[derive(Debug, Clone)]
pub struct SynthAudio {
    rng: fastrand::Rng,
    bpm: f64,
    phase: [f32; 3],
}

impl SynthAudio {
    pub fn new(seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let phase = [rng.f32() * 6.283, rng.f32() * 6.283, rng.f32() * 6.283];
        Self {
            rng,
            bpm: 118.0 + (seed % 17) as f64,
            phase,
        }
    }

    pub fn sample(&mut self, time: f64) -> AudioSnapshot {
        let t = time as f32;
        let beat_period = 60.0 / self.bpm;
        let since_beat = time.rem_euclid(beat_period) as f32;
        let beat = (-since_beat * 9.0).exp();

        let jitter = |rng: &mut fastrand::Rng| (rng.f32() - 0.5) * 0.06;
        let bass = ((t * 1.9 + self.phase[0]).sin() * 0.5 + 0.5).powf(1.15) * 0.75 + beat * 0.25;
        let mid = ((t * 2.8 + self.phase[1]).sin() * 0.5 + 0.5).powf(1.08);
        let treble = ((t * 5.2 + self.phase[2]).sin() * 0.5 + 0.5).powf(1.02);

        let bands = [
            bass * 0.95 + jitter(&mut self.rng),
            bass + jitter(&mut self.rng),
            bass * 0.6 + mid * 0.35 + jitter(&mut self.rng),
            mid + jitter(&mut self.rng),
            mid * 0.5 + treble * 0.45 + jitter(&mut self.rng),
            treble + jitter(&mut self.rng),
            treble * 0.9 + jitter(&mut self.rng),
            treble * 0.75 + mid * 0.2 + jitter(&mut self.rng),
        ];

        AudioSnapshot {
            time,
            bass,
            mid,
            treble,
            energy: 0.12 + bass * 0.42 + mid * 0.26 + treble * 0.18,
            beat,
            bands,
        }
        .sanitized()
    }
}

pub const DEFAULT_ANALYSIS_HZ: f32 = 86.0;

/// Publish interval for an analysis rate, falling back to the default rate
/// when `rate_hz` is not a number.
pub fn feed_period(rate_hz: f32) -> Duration {
    let rate = if rate_hz.is_finite() { rate_hz.clamp(1.0, 1000.0) } else { DEFAULT_ANALYSIS_HZ };
    Duration::from_secs_f32(1.0 / rate)
}

/// Background thread that feeds a `SnapshotSlot` from `SynthAudio` at a
/// fixed analysis rate. Stops and joins on drop.
pub struct SynthFeed {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    slot: Arc<SnapshotSlot>,
}

impl SynthFeed {
    pub fn spawn(seed: u64, rate_hz: f32) -> anyhow::Result<Self> {
        let slot = Arc::new(SnapshotSlot::new());
        let stop = Arc::new(AtomicBool::new(false));
        let slot_for_thread = Arc::clone(&slot);
        let stop_for_thread = Arc::clone(&stop);
        let period = feed_period(rate_hz);

        let handle = thread::Builder::new()
            .name("synth-audio".into())
            .spawn(move || {
                let mut synth = SynthAudio::new(seed);
                let start = Instant::now();
                while !stop_for_thread.load(Ordering::Relaxed) {
                    let t = start.elapsed().as_secs_f64();
                    slot_for_thread.publish(synth.sample(t));
                    thread::sleep(period);
                }
            })?;

        tracing::debug!(seed, rate_hz, "synthetic audio feed started");
        Ok(Self {
            stop,
            handle: Some(handle),
            slot,
        })
    }

    pub fn slot(&self) -> Arc<SnapshotSlot> {
        Arc::clone(&self.slot)
    }
}

impl Drop for SynthFeed {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_nan_and_infinities() {
        let mut s = AudioSnapshot::silent(f64::NAN);
        s.bass = f32::NAN;
        s.mid = f32::INFINITY;
        s.treble = -3.0;
        s.bands[4] = f32::NEG_INFINITY;
        let c = s.sanitized();
        assert_eq!(c.time, 0.0);
        assert_eq!(c.bass, 0.0);
        assert_eq!(c.mid, 1.0);
        assert_eq!(c.treble, 0.0);
        assert_eq!(c.bands[4], 0.0);
        assert!(c.is_sane());
    }

    #[test]
    fn slot_round_trips_latest_value() {
        let slot = SnapshotSlot::new();
        assert!(slot.try_load().is_none());
        let mut s = AudioSnapshot::silent(1.5);
        s.bands[3] = 0.25;
        slot.publish(s);
        s.time = 2.0;
        slot.publish(s);
        let (generation, got) = slot.try_load().expect("published");
        assert_eq!(generation, 2);
        assert_eq!(got, s);
    }

    #[test]
    fn reader_reuses_previous_snapshot_when_nothing_new() {
        let slot = Arc::new(SnapshotSlot::new());
        let mut reader = SnapshotReader::new(Arc::clone(&slot));
        assert_eq!(reader.latest(), AudioSnapshot::default());

        let mut s = AudioSnapshot::silent(3.0);
        s.energy = 0.7;
        slot.publish(s);
        assert_eq!(reader.latest(), s);
        assert_eq!(reader.stale_frames(), 0);
        assert_eq!(reader.latest(), s);
        assert_eq!(reader.stale_frames(), 1);
    }

    #[test]
    fn feed_period_survives_bad_rates() {
        assert_eq!(feed_period(f32::NAN), feed_period(DEFAULT_ANALYSIS_HZ));
        assert_eq!(feed_period(f32::INFINITY), feed_period(DEFAULT_ANALYSIS_HZ));
        assert_eq!(feed_period(0.0), Duration::from_secs(1));
        assert_eq!(feed_period(1e9), Duration::from_secs_f32(1.0 / 1000.0));
    }

    #[test]
    fn feed_spawns_with_nan_rate() {
        let feed = SynthFeed::spawn(4, f32::NAN).unwrap();
        let slot = feed.slot();
        let deadline = Instant::now() + Duration::from_secs(2);
        while slot.try_load().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert!(slot.try_load().is_some());
    }

    #[test]
    fn synth_is_deterministic_per_seed() {
        let mut a = SynthAudio::new(7);
        let mut b = SynthAudio::new(7);
        for i in 0..32 {
            let t = i as f64 / 60.0;
            let (sa, sb) = (a.sample(t), b.sample(t));
            assert_eq!(sa, sb);
            assert!(sa.is_sane());
        }
    }
}
