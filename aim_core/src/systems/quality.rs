//! Adaptive effect quality.
//!
//! Frame times go into a fixed ring. Every full window the average is compared
//! against the frame budget with separate demote and promote thresholds, and a
//! tier change needs several consecutive windows on the same side plus an
//! elapsed cooldown since the last change.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::params::Params;

/// Effect-density tier, ordered lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectTier {
    Low,
    Medium,
    High,
    Ultra,
}

impl EffectTier {
    /// Multiplier applied to particle emission counts
    pub fn particle_scale(self) -> f32 {
        match self {
            EffectTier::Low => 0.0,
            EffectTier::Medium => 0.3,
            EffectTier::High => 0.6,
            EffectTier::Ultra => 1.0,
        }
    }

    pub fn glow(self) -> bool {
        self >= EffectTier::High
    }

    pub fn lower(self) -> Option<Self> {
        match self {
            EffectTier::Low => None,
            EffectTier::Medium => Some(EffectTier::Low),
            EffectTier::High => Some(EffectTier::Medium),
            EffectTier::Ultra => Some(EffectTier::High),
        }
    }

    pub fn higher(self) -> Option<Self> {
        match self {
            EffectTier::Low => Some(EffectTier::Medium),
            EffectTier::Medium => Some(EffectTier::High),
            EffectTier::High => Some(EffectTier::Ultra),
            EffectTier::Ultra => None,
        }
    }
}

/// Controller tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityTuning {
    pub target_fps: f32,
    pub demote_ratio: f32,
    pub promote_ratio: f32,
    pub demote_windows: u32,
    pub promote_windows: u32,
    pub cooldown_ms: f32,
    pub initial_tier: EffectTier,
}

impl Default for QualityTuning {
    fn default() -> Self {
        Self {
            target_fps: Params::TARGET_FPS,
            demote_ratio: Params::DEMOTE_RATIO,
            promote_ratio: Params::PROMOTE_RATIO,
            demote_windows: Params::DEMOTE_WINDOWS,
            promote_windows: Params::PROMOTE_WINDOWS,
            cooldown_ms: Params::QUALITY_COOLDOWN_MS,
            initial_tier: EffectTier::Ultra,
        }
    }
}

impl QualityTuning {
    pub fn budget_ms(&self) -> f32 {
        1000.0 / self.target_fps
    }
}

/// What the renderer reads each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityState {
    pub tier: EffectTier,
    pub average_frame_ms: f32,
    pub last_adjustment_ms: Option<f32>,
    pub pinned: bool,
}

#[derive(Debug, Clone)]
pub struct QualityController {
    tuning: QualityTuning,
    tier: EffectTier,
    ring: [f32; Params::FRAME_WINDOW],
    cursor: usize,
    filled: usize,
    frames_since_eval: usize,
    over_windows: u32,
    under_windows: u32,
    clock_ms: f32, // Accumulated frame time
    last_adjustment_ms: Option<f32>,
    pinned: bool,
}

impl QualityController {
    pub fn new(tuning: QualityTuning) -> Self {
        Self {
            tuning,
            tier: tuning.initial_tier,
            ring: [0.0; Params::FRAME_WINDOW],
            cursor: 0,
            filled: 0,
            frames_since_eval: 0,
            over_windows: 0,
            under_windows: 0,
            clock_ms: 0.0,
            last_adjustment_ms: None,
            pinned: false,
        }
    }

    pub fn tier(&self) -> EffectTier {
        self.tier
    }

    pub fn tuning(&self) -> &QualityTuning {
        &self.tuning
    }

    /// Rolling average over the frames currently in the ring
    pub fn average_frame_ms(&self) -> f32 {
        if self.filled == 0 {
            return 0.0;
        }
        self.ring[..self.filled].iter().sum::<f32>() / self.filled as f32
    }

    pub fn state(&self) -> QualityState {
        QualityState {
            tier: self.tier,
            average_frame_ms: self.average_frame_ms(),
            last_adjustment_ms: self.last_adjustment_ms,
            pinned: self.pinned,
        }
    }

    /// Record one frame's elapsed time. Returns the new tier if it changed.
    pub fn on_frame_complete(&mut self, elapsed_ms: f32) -> Option<EffectTier> {
        let elapsed_ms = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0)
        } else {
            0.0
        };
        self.clock_ms += elapsed_ms;
        self.ring[self.cursor] = elapsed_ms;
        self.cursor = (self.cursor + 1) % Params::FRAME_WINDOW;
        self.filled = (self.filled + 1).min(Params::FRAME_WINDOW);
        self.frames_since_eval += 1;

        if self.frames_since_eval < Params::FRAME_WINDOW {
            return None;
        }
        self.frames_since_eval = 0;
        self.evaluate_window()
    }

    fn evaluate_window(&mut self) -> Option<EffectTier> {
        let average = self.average_frame_ms();
        let budget = self.tuning.budget_ms();

        if average > budget * self.tuning.demote_ratio {
            self.over_windows += 1;
            self.under_windows = 0;
        } else if average < budget * self.tuning.promote_ratio {
            self.under_windows += 1;
            self.over_windows = 0;
        } else {
            // Inside the hysteresis band
            self.over_windows = 0;
            self.under_windows = 0;
        }

        if self.pinned || !self.cooled_down() {
            return None;
        }

        let next = if self.over_windows >= self.tuning.demote_windows {
            self.tier.lower()
        } else if self.under_windows >= self.tuning.promote_windows {
            self.tier.higher()
        } else {
            None
        }?;

        debug!(
            "Effect tier {:?} -> {:?} (avg {:.2} ms, budget {:.2} ms)",
            self.tier, next, average, budget
        );
        self.tier = next;
        self.last_adjustment_ms = Some(self.clock_ms);
        self.over_windows = 0;
        self.under_windows = 0;
        Some(next)
    }

    fn cooled_down(&self) -> bool {
        self.last_adjustment_ms
            .map_or(true, |last| self.clock_ms - last >= self.tuning.cooldown_ms)
    }

    /// Fix the tier and stop adapting until [`Self::unpin`]
    pub fn pin(&mut self, tier: EffectTier) {
        self.tier = tier;
        self.pinned = true;
    }

    pub fn unpin(&mut self) {
        self.pinned = false;
        self.over_windows = 0;
        self.under_windows = 0;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }
}

impl Default for QualityController {
    fn default() -> Self {
        Self::new(QualityTuning::default())
    }
}
