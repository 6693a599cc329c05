use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "pulsefield", version, about = "Audio-reactive procedural color-field visualizer (terminal preview)")]
pub struct Config {
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, value_enum, default_value_t = Quality::Balanced)]
    pub quality: Quality,

    /// Visualizer id to start with (see --list).
    #[arg(long)]
    pub visualizer: Option<String>,

    /// Crossfade length when switching visualizers.
    #[arg(long, default_value_t = 900)]
    pub transition_ms: u32,

    /// Worker threads for per-pixel evaluation (1 = single-threaded).
    #[arg(long, default_value_t = 1)]
    pub threads: usize,

    /// Render at a fixed pixel size instead of following the terminal.
    #[arg(long)]
    pub width: Option<usize>,

    #[arg(long)]
    pub height: Option<usize>,

    /// Seed for the synthetic audio feed.
    #[arg(long, default_value_t = 0xF15D_2026)]
    pub seed: u64,

    #[arg(long, default_value_t = crate::audio::DEFAULT_ANALYSIS_HZ)]
    pub analysis_hz: f32,

    /// Step the quality tier down (and back up) to hold the frame budget.
    #[arg(long, default_value_t = false)]
    pub adaptive_quality: bool,

    #[arg(long, default_value_t = false)]
    pub list: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub post_fx: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,
}

impl Config {
    /// Per-frame crossfade increment for a transition of `transition_ms` at `fps`.
    pub fn transition_rate(&self) -> f32 {
        let frames = (self.transition_ms as f32 / 1000.0) * self.fps.max(1) as f32;
        if frames <= 1.0 { 1.0 } else { 1.0 / frames }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Quality {
    Ultra,
    High,
    Balanced,
    Fast,
}

impl Quality {
    pub fn lower(self) -> Self {
        match self {
            Self::Ultra => Self::High,
            Self::High => Self::Balanced,
            Self::Balanced => Self::Fast,
            Self::Fast => Self::Fast,
        }
    }

    pub fn higher(self) -> Self {
        match self {
            Self::Fast => Self::Balanced,
            Self::Balanced => Self::High,
            Self::High => Self::Ultra,
            Self::Ultra => Self::Ultra,
        }
    }

    /// Multiplier applied to every generator's iteration caps.
    pub fn detail(self) -> f32 {
        match self {
            Self::Ultra => 1.5,
            Self::High => 1.25,
            Self::Balanced => 1.0,
            Self::Fast => 0.6,
        }
    }

    /// Scale a base cap by this tier, never below `floor`.
    pub fn cap(self, base: u32, floor: u32) -> u32 {
        ((base as f32 * self.detail()).round() as u32).max(floor)
    }

    /// 0 for `Fast` up to 3 for `Ultra`.
    pub fn rank(self) -> u8 {
        match self {
            Self::Fast => 0,
            Self::Balanced => 1,
            Self::High => 2,
            Self::Ultra => 3,
        }
    }

    pub const fn all() -> [Self; 4] {
        [Self::Ultra, Self::High, Self::Balanced, Self::Fast]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ultra => "ultra",
            Self::High => "high",
            Self::Balanced => "balanced",
            Self::Fast => "fast",
        }
    }
}
