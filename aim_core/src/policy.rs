//! Spawn policies and the built-in game modes.
//!
//! A mode is pure data: one [`SpawnPolicy`] record plus a [`SpawnPattern`] tag
//! that picks how velocities are assigned. The policy is fixed for the whole
//! session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, SessionError};
use crate::map::PlayArea;
use crate::params::Params;

/// Closed float interval used for sampled policy values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeF32 {
    pub min: f32,
    pub max: f32,
}

impl RangeF32 {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, field: &'static str, allow_zero: bool) -> Result<(), PolicyError> {
        let low_ok = if allow_zero {
            self.min >= 0.0
        } else {
            self.min > 0.0
        };
        if !self.min.is_finite() || !self.max.is_finite() || !low_ok || self.min > self.max {
            return Err(PolicyError::InvalidRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// How spawned targets move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpawnPattern {
    /// Targets never move
    Static,
    /// Horizontal strafing, bouncing off the side walls
    Linear,
    /// Uniform random direction, bouncing off every wall
    Reflecting,
    /// Several targets at once, a share of them moving in a random direction
    MultiTarget { moving_chance: f32 },
}

impl SpawnPattern {
    pub fn can_move(&self) -> bool {
        match self {
            SpawnPattern::Static => false,
            SpawnPattern::Linear | SpawnPattern::Reflecting => true,
            SpawnPattern::MultiTarget { moving_chance } => *moving_chance > 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Master,
    Insane,
}

/// Immutable per-mode spawn configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPolicy {
    pub name: String,
    pub duration_ms: f32,
    pub max_concurrent: usize,
    pub radius: RangeF32,
    pub lifetime_ms: RangeF32,
    #[serde(default = "stationary")]
    pub speed: RangeF32, // px/s
    pub spawn_interval_ms: f32,
    pub pattern: SpawnPattern,
    pub difficulty: Difficulty,
    #[serde(default = "default_bonus_chance")]
    pub bonus_chance: f32,
}

fn stationary() -> RangeF32 {
    RangeF32::fixed(0.0)
}

fn default_bonus_chance() -> f32 {
    Params::BONUS_CHANCE
}

impl SpawnPolicy {
    /// Parse a custom mode from TOML
    pub fn from_toml_str(text: &str) -> Result<Self, SessionError> {
        let policy: SpawnPolicy = toml::from_str(text)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reject configurations that cannot drive a session
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_concurrent == 0 {
            return Err(PolicyError::ZeroConcurrent);
        }
        positive("duration_ms", self.duration_ms)?;
        if self.duration_ms > Params::MAX_SESSION_MS {
            return Err(PolicyError::DurationTooLong {
                value: self.duration_ms,
                max: Params::MAX_SESSION_MS,
            });
        }
        positive("spawn_interval_ms", self.spawn_interval_ms)?;
        self.radius.check("radius", false)?;
        self.lifetime_ms.check("lifetime_ms", false)?;
        self.speed.check("speed", true)?;
        probability("bonus_chance", self.bonus_chance)?;

        if let SpawnPattern::MultiTarget { moving_chance } = self.pattern {
            probability("moving_chance", moving_chance)?;
        }
        if self.pattern.can_move() && self.speed.max <= 0.0 {
            return Err(PolicyError::StationaryMovingPattern);
        }
        Ok(())
    }

    /// Reject policies whose largest target cannot be placed in `area`
    pub fn validate_for(&self, area: &PlayArea) -> Result<(), PolicyError> {
        self.validate()?;
        if area.spawn_region(self.radius.max).is_none() {
            return Err(PolicyError::TargetTooLarge {
                radius: self.radius.max,
                width: area.width,
                height: area.height,
            });
        }
        Ok(())
    }

    /// Slots needed so Active plus lingering Hit/Expired targets always fit.
    ///
    /// At most `max_concurrent` are Active, at most `max_concurrent` can resolve
    /// at once, and at most one spawn lands per micro-step or interval while
    /// those linger.
    pub fn target_pool_capacity(&self, after_effect_ms: f32, fixed_step_ms: f32) -> usize {
        let cadence = self.spawn_interval_ms.max(fixed_step_ms);
        let spawns_while_lingering = (after_effect_ms / cadence).ceil().max(0.0) as usize;
        2 * self.max_concurrent + spawns_while_lingering + 1
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), PolicyError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PolicyError::NonPositive { field, value })
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), PolicyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PolicyError::BadProbability { field, value })
    }
}

/// The eight built-in training modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Classic,
    Precision,
    SpeedBlitz,
    Reflexes,
    FlickMaster,
    MultiTrack,
    Sniper,
    Chaos,
}

impl GameMode {
    pub const ALL: [GameMode; 8] = [
        GameMode::Classic,
        GameMode::Precision,
        GameMode::SpeedBlitz,
        GameMode::Reflexes,
        GameMode::FlickMaster,
        GameMode::MultiTrack,
        GameMode::Sniper,
        GameMode::Chaos,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Classic => "Classic",
            GameMode::Precision => "Precision",
            GameMode::SpeedBlitz => "Speed Blitz",
            GameMode::Reflexes => "Reflexes",
            GameMode::FlickMaster => "Flick Master",
            GameMode::MultiTrack => "Multi-Track",
            GameMode::Sniper => "Sniper",
            GameMode::Chaos => "Chaos",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameMode::Classic => "Traditional aim training",
            GameMode::Precision => "Small targets for accuracy",
            GameMode::SpeedBlitz => "Fast-paced target shooting",
            GameMode::Reflexes => "Quick reaction training",
            GameMode::FlickMaster => "Long-range flick shots",
            GameMode::MultiTrack => "Multiple moving targets",
            GameMode::Sniper => "Ultra-precise strafing shots",
            GameMode::Chaos => "Maximum intensity",
        }
    }

    pub fn difficulty(self) -> Difficulty {
        self.policy().difficulty
    }

    pub fn policy(self) -> SpawnPolicy {
        // (duration s, radius, interval ms, max, lifetime ms, pattern, speed, difficulty)
        let (secs, radius, interval, max, lifetime, pattern, speed, difficulty) = match self {
            GameMode::Classic => (
                60.0,
                RangeF32::new(23.0, 27.0),
                500.0,
                1,
                3000.0,
                SpawnPattern::Static,
                stationary(),
                Difficulty::Beginner,
            ),
            GameMode::Precision => (
                60.0,
                RangeF32::new(16.0, 20.0),
                400.0,
                2,
                3500.0,
                SpawnPattern::Static,
                stationary(),
                Difficulty::Intermediate,
            ),
            GameMode::SpeedBlitz => (
                30.0,
                RangeF32::new(32.0, 38.0),
                150.0,
                6,
                1200.0,
                SpawnPattern::Static,
                stationary(),
                Difficulty::Advanced,
            ),
            GameMode::Reflexes => (
                45.0,
                RangeF32::new(20.0, 24.0),
                250.0,
                4,
                2000.0,
                SpawnPattern::Static,
                stationary(),
                Difficulty::Intermediate,
            ),
            GameMode::FlickMaster => (
                60.0,
                RangeF32::new(14.0, 18.0),
                600.0,
                1,
                4000.0,
                SpawnPattern::Static,
                stationary(),
                Difficulty::Expert,
            ),
            GameMode::MultiTrack => (
                45.0,
                RangeF32::new(27.0, 33.0),
                120.0,
                8,
                1500.0,
                SpawnPattern::MultiTarget { moving_chance: 0.3 },
                RangeF32::new(60.0, 150.0),
                Difficulty::Expert,
            ),
            GameMode::Sniper => (
                90.0,
                RangeF32::new(11.0, 13.0),
                800.0,
                1,
                5000.0,
                SpawnPattern::Linear,
                RangeF32::new(40.0, 80.0),
                Difficulty::Master,
            ),
            GameMode::Chaos => (
                40.0,
                RangeF32::new(25.0, 31.0),
                80.0,
                12,
                1000.0,
                SpawnPattern::Reflecting,
                RangeF32::new(80.0, 200.0),
                Difficulty::Insane,
            ),
        };

        SpawnPolicy {
            name: self.name().to_string(),
            duration_ms: secs * 1000.0,
            max_concurrent: max,
            radius,
            lifetime_ms: RangeF32::fixed(lifetime),
            speed,
            spawn_interval_ms: interval,
            pattern,
            difficulty,
            bonus_chance: Params::BONUS_CHANCE,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameMode {
    type Err = SessionError;

    /// Case-insensitive, ignores spaces, dashes and underscores ("speed-blitz" works)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        GameMode::ALL
            .into_iter()
            .find(|mode| normalize(mode.name()) == wanted)
            .ok_or_else(|| SessionError::UnknownMode(s.to_string()))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
