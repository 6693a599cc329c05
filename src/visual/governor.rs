use crate::config::Quality;
use tracing::debug;

/// Moves the quality tier to hold a frame-time target. Only the iteration
/// caps change with the tier; the algorithms stay the same.
#[derive(Debug, Clone)]
pub struct QualityGovernor {
    ceiling: Quality,
    quality: Quality,
    adaptive: bool,
    ema_ms: f32,
    cooldown: u32,
}

/// Frames to wait after a change before judging the new tier.
const COOLDOWN_FRAMES: u32 = 30;

impl QualityGovernor {
    pub fn new(ceiling: Quality, adaptive: bool) -> Self {
        Self {
            ceiling,
            quality: ceiling,
            adaptive,
            ema_ms: 0.0,
            cooldown: 0,
        }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn average_ms(&self) -> f32 {
        self.ema_ms
    }

    pub fn update(&mut self, frame_ms: f32, target_ms: f32) -> Quality {
        if !self.adaptive || !frame_ms.is_finite() {
            return self.quality;
        }
        self.ema_ms = if self.ema_ms == 0.0 {
            frame_ms
        } else {
            self.ema_ms * 0.9 + frame_ms * 0.1
        };
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return self.quality;
        }

        let before = self.quality;
        if self.ema_ms > target_ms * 1.2 {
            self.quality = self.quality.lower();
        } else if self.ema_ms < target_ms * 0.7 && self.quality.rank() < self.ceiling.rank() {
            self.quality = self.quality.higher();
        }
        if self.quality != before {
            debug!(from = before.label(), to = self.quality.label(), ema_ms = self.ema_ms, "quality tier change");
            self.cooldown = COOLDOWN_FRAMES;
            self.ema_ms = 0.0;
        }
        self.quality
    }
}
