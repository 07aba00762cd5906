use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::map::PlayArea;
use crate::params::Params;
use crate::systems::QualityTuning;

/// Session configuration, injected at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub area: PlayArea,
    pub fixed_step_ms: f32,
    pub max_dt_ms: f32,
    pub after_effect_ms: f32,
    pub crosshair_clearance: f32,
    pub target_separation: f32,
    pub placement_attempts: u32,
    pub particle_capacity: usize,
    pub quality: QualityTuning,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            area: PlayArea::default(),
            fixed_step_ms: Params::FIXED_STEP_MS,
            max_dt_ms: Params::MAX_DT_MS,
            after_effect_ms: Params::AFTER_EFFECT_MS,
            crosshair_clearance: Params::CROSSHAIR_CLEARANCE,
            target_separation: Params::TARGET_SEPARATION,
            placement_attempts: Params::PLACEMENT_ATTEMPTS,
            particle_capacity: Params::PARTICLE_CAPACITY,
            quality: QualityTuning::default(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, SessionError> {
        let config: SessionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SessionError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        };

        positive("area.width", self.area.width)?;
        positive("area.height", self.area.height)?;
        positive("fixed_step_ms", self.fixed_step_ms)?;
        positive("max_dt_ms", self.max_dt_ms)?;
        positive("quality.target_fps", self.quality.target_fps)?;

        if !(self.after_effect_ms.is_finite() && self.after_effect_ms >= 0.0) {
            return Err(SessionError::InvalidConfig(format!(
                "after_effect_ms must be non-negative, got {}",
                self.after_effect_ms
            )));
        }
        if self.crosshair_clearance < 0.0 || self.target_separation < 0.0 {
            return Err(SessionError::InvalidConfig(
                "placement distances must be non-negative".to_string(),
            ));
        }
        if self.placement_attempts == 0 {
            return Err(SessionError::InvalidConfig(
                "placement_attempts must be at least 1".to_string(),
            ));
        }
        if self.particle_capacity == 0 {
            return Err(SessionError::InvalidConfig(
                "particle_capacity must be at least 1".to_string(),
            ));
        }

        let q = &self.quality;
        if q.promote_ratio >= q.demote_ratio {
            return Err(SessionError::InvalidConfig(format!(
                "quality promote_ratio {} must be below demote_ratio {}",
                q.promote_ratio, q.demote_ratio
            )));
        }
        if q.demote_windows == 0 || q.promote_windows == 0 {
            return Err(SessionError::InvalidConfig(
                "quality window counts must be at least 1".to_string(),
            ));
        }
        if q.cooldown_ms < 0.0 {
            return Err(SessionError::InvalidConfig(
                "quality cooldown_ms must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
