use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec2;
use pulsefield::audio::{AudioSnapshot, SynthAudio};
use pulsefield::config::Quality;
use pulsefield::visual::{EngineOptions, FieldCtx, FieldEngine, PostFx, Registry, Surface, Viewport};
use tracing_subscriber::EnvFilter;

/// Nominal refresh interval at 60 Hz.
const FRAME_BUDGET_MS: f64 = 16.6;

struct Args {
    frames: usize,
    w: usize,
    h: usize,
    quality: Quality,
    all_tiers: bool,
    threads: usize,
    seed: u64,
    ci_smoke: bool,
    quick: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 120,
        w: 160,
        h: 88,
        quality: Quality::Balanced,
        all_tiers: false,
        threads: 1,
        seed: 0xF15D_2026,
        ci_smoke: false,
        quick: false,
        max_ms: FRAME_BUDGET_MS,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--threads", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.threads = n.max(1);
                }
                i += 2;
            }
            ("--seed", Some(x)) => {
                if let Ok(n) = x.parse::<u64>() {
                    args.seed = n;
                }
                i += 2;
            }
            ("--quality", Some("all")) => {
                args.all_tiers = true;
                i += 2;
            }
            ("--quality", Some(x)) => {
                if let Some(q) = Quality::all().into_iter().find(|q| q.label() == x) {
                    args.quality = q;
                }
                i += 2;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(30);
    }
    args
}

/// Most inner-loop steps any sampled pixel needed with every audio level
/// pinned to 1.
fn worst_steps(registry: &Registry, index: usize, view: Viewport, quality: Quality) -> (u32, u32) {
    let Some(desc) = registry.get(index) else {
        return (0, 0);
    };
    let snap = AudioSnapshot::saturated(3.0);
    let ctx = FieldCtx::new(3.0, &snap, view, quality);
    let mut worst = 0u32;
    for y in (0..view.height).step_by(4) {
        for x in (0..view.width).step_by(4) {
            let p: Vec2 = view.normalize(x, y);
            worst = worst.max(desc.generator.shade(p, &ctx).steps);
        }
    }
    (worst, desc.generator.step_cap(quality))
}

/// Snapshot time for frame `f` of a visualizer run that starts after
/// `done` frames. The session clock never runs backwards, so time has to keep
/// counting across visualizers.
fn frame_clock(done: usize, f: usize) -> f64 {
    (done + f) as f64 / 60.0
}

struct Failures {
    black: Vec<String>,
    slow: Vec<(String, f64)>,
    over_cap: Vec<(String, u32, u32)>,
}

fn bench_tier(args: &Args, quality: Quality, failures: &mut Failures) -> (Duration, usize) {
    let view = Viewport::new(args.w, args.h);
    let registry = Registry::default();
    let entries = registry.entries();
    let opts = EngineOptions {
        quality,
        threads: args.threads,
        transition_rate: 1.0,
        post: PostFx::default(),
    };
    let mut engine = FieldEngine::new(Registry::default(), opts);
    let mut surface = Surface::new(view);

    println!(
        "benchmark: visualizers={} frames={} size={}x{} quality={} threads={} budget={:.1}ms",
        entries.len(),
        args.frames,
        args.w,
        args.h,
        quality.label(),
        args.threads,
        FRAME_BUDGET_MS
    );

    let mut total = Duration::ZERO;
    let mut frames = 0usize;
    for (idx, entry) in entries.iter().enumerate() {
        if let Err(err) = engine.select_visualizer(entry.id) {
            eprintln!("skip {}: {err}", entry.id);
            continue;
        }
        let mut synth = SynthAudio::new(args.seed);
        let mut worst_frame = Duration::ZERO;
        let mut lit = 0usize;
        let start = Instant::now();
        for f in 0..args.frames {
            let snap = synth.sample(frame_clock(frames, f));
            engine.render_frame(&mut surface, &snap, view);
            worst_frame = worst_frame.max(engine.last_frame_time());
            if surface.as_bytes().chunks_exact(4).any(|p| p[0] > 8 || p[1] > 8 || p[2] > 8) {
                lit += 1;
            }
        }
        let elapsed = start.elapsed();
        total += elapsed;
        frames += args.frames;

        let ms = elapsed.as_secs_f64() * 1000.0 / args.frames as f64;
        let worst_ms = worst_frame.as_secs_f64() * 1000.0;
        let (steps, cap) = worst_steps(&registry, idx, view, quality);
        let flag = if ms > FRAME_BUDGET_MS { " over budget" } else { "" };
        println!(
            "{:>2}. {:<20} {:>8.3} ms/frame  worst {:>8.3} ms  steps {:>4}/{:<4} lit={:>3}/{}{}",
            idx, entry.name, ms, worst_ms, steps, cap, lit, args.frames, flag
        );

        if lit == 0 {
            failures.black.push(entry.id.to_string());
        }
        if ms > args.max_ms {
            failures.slow.push((entry.id.to_string(), ms));
        }
        if steps > cap {
            failures.over_cap.push((entry.id.to_string(), steps, cap));
        }
    }
    (total, frames)
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init();

    let args = parse_args();
    let tiers: Vec<Quality> = if args.all_tiers {
        Quality::all().to_vec()
    } else {
        vec![args.quality]
    };

    let mut failures = Failures {
        black: Vec::new(),
        slow: Vec::new(),
        over_cap: Vec::new(),
    };
    for q in tiers {
        let (total, frames) = bench_tier(&args, q, &mut failures);
        let avg_ms = total.as_secs_f64() * 1000.0 / frames.max(1) as f64;
        let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
        println!("summary [{}]: {:>8.3} ms/frame avg  {:>7.2} FPS", q.label(), avg_ms, fps);
    }

    // step caps are a hard contract, report them even outside CI
    for (id, steps, cap) in &failures.over_cap {
        eprintln!("  step cap exceeded: {id} ({steps} > {cap})");
    }

    if args.ci_smoke {
        if !failures.black.is_empty() || !failures.slow.is_empty() || !failures.over_cap.is_empty() {
            eprintln!("CI smoke: FAIL");
            if !failures.black.is_empty() {
                eprintln!("  black visualizers: {}", failures.black.join(", "));
            }
            for (id, ms) in &failures.slow {
                eprintln!("  slow visualizer: {} ({:.3} ms/frame > {:.3})", id, ms, args.max_ms);
            }
            anyhow::bail!("ci smoke failed");
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }
    Ok(())
}
