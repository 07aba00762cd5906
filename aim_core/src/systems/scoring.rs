use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::TargetKind;
use crate::params::Params;
use crate::resources::{HitEvent, HitKind};

/// Letter grade, ordered worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    B,
    A,
    S,
    SPlus,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::F => "F",
            Grade::D => "D",
            Grade::C => "C",
            Grade::B => "B",
            Grade::A => "A",
            Grade::S => "S",
            Grade::SPlus => "S+",
        };
        f.write_str(label)
    }
}

/// (grade, minimum accuracy, maximum mean reaction ms), best first
pub const GRADE_TABLE: [(Grade, f32, f32); 6] = [
    (Grade::SPlus, 0.95, 250.0),
    (Grade::S, 0.90, 300.0),
    (Grade::A, 0.80, 400.0),
    (Grade::B, 0.70, 500.0),
    (Grade::C, 0.55, 650.0),
    (Grade::D, 0.40, 800.0),
];

/// First table row both numbers satisfy, F when nothing was hit
pub fn grade_for(accuracy: f32, mean_reaction_ms: Option<f32>) -> Grade {
    let Some(mean) = mean_reaction_ms else {
        return Grade::F;
    };
    GRADE_TABLE
        .iter()
        .find(|(_, min_accuracy, max_reaction)| accuracy >= *min_accuracy && mean <= *max_reaction)
        .map_or(Grade::F, |(grade, _, _)| *grade)
}

/// 1 at or below the fast threshold, falling linearly to the floor at the slow one
pub fn reaction_factor(reaction_ms: f32) -> f32 {
    if reaction_ms <= Params::REACTION_FAST_MS {
        1.0
    } else if reaction_ms >= Params::REACTION_SLOW_MS {
        Params::REACTION_FLOOR
    } else {
        let t = (reaction_ms - Params::REACTION_FAST_MS)
            / (Params::REACTION_SLOW_MS - Params::REACTION_FAST_MS);
        1.0 - t * (1.0 - Params::REACTION_FLOOR)
    }
}

/// 1 at dead center, 0 at the edge
pub fn accuracy_factor(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

pub fn points_for(reaction_ms: f32, distance: f32, radius: f32, kind: TargetKind) -> u64 {
    let blend = Params::REACTION_WEIGHT * reaction_factor(reaction_ms)
        + Params::ACCURACY_WEIGHT * accuracy_factor(distance, radius);
    (Params::BASE_POINTS * kind.multiplier() * blend).round() as u64
}

/// Running score for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreState {
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub hits: u32,
    pub misses: u32,
    pub last_points: u64,
    pub grade: Option<Grade>, // Set when the session ends
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    state: ScoreState,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    /// Apply a resolved shot
    pub fn record(&mut self, shot: &HitEvent) -> &ScoreState {
        match shot.kind {
            HitKind::Hit {
                reaction_ms,
                distance,
                radius,
                target_kind,
                ..
            } => self.record_hit(reaction_ms, distance, radius, target_kind),
            HitKind::Miss => self.record_miss(),
        }
    }

    pub fn record_hit(
        &mut self,
        reaction_ms: f32,
        distance: f32,
        radius: f32,
        kind: TargetKind,
    ) -> &ScoreState {
        let points = points_for(reaction_ms, distance, radius, kind);
        let state = &mut self.state;
        state.score += points;
        state.last_points = points;
        state.hits += 1;
        state.streak += 1;
        state.best_streak = state.best_streak.max(state.streak);
        state
    }

    /// A whiff. Expiry never comes through here.
    pub fn record_miss(&mut self) -> &ScoreState {
        self.state.misses += 1;
        self.state.streak = 0;
        self.state.last_points = 0;
        &self.state
    }

    /// Does the current streak earn a flare
    pub fn streak_milestone(&self) -> bool {
        self.state.streak > 0 && self.state.streak % Params::STREAK_FLARE_EVERY == 0
    }

    /// Compute the end-of-session grade and store it
    pub fn finish(&mut self, accuracy: f32, mean_reaction_ms: Option<f32>) -> Grade {
        let grade = grade_for(accuracy, mean_reaction_ms);
        self.state.grade = Some(grade);
        grade
    }

    pub fn reset(&mut self) {
        self.state = ScoreState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_factor_curve() {
        assert_eq!(reaction_factor(0.0), 1.0);
        assert_eq!(reaction_factor(200.0), 1.0);
        assert!((reaction_factor(600.0) - 0.6).abs() < 1e-6, "Midpoint");
        assert_eq!(reaction_factor(1000.0), 0.2);
        assert_eq!(reaction_factor(5000.0), 0.2, "Floor");
    }

    #[test]
    fn test_reaction_factor_monotonic() {
        let mut last = reaction_factor(0.0);
        for ms in (0..1500).step_by(10) {
            let next = reaction_factor(ms as f32);
            assert!(next <= last, "Slower reactions never score more");
            last = next;
        }
    }

    #[test]
    fn test_accuracy_factor() {
        assert_eq!(accuracy_factor(0.0, 20.0), 1.0);
        assert_eq!(accuracy_factor(10.0, 20.0), 0.5);
        assert_eq!(accuracy_factor(20.0, 20.0), 0.0);
        assert_eq!(accuracy_factor(25.0, 20.0), 0.0);
    }

    #[test]
    fn test_points_for() {
        assert_eq!(points_for(150.0, 0.0, 25.0, TargetKind::Normal), 100);
        assert_eq!(points_for(150.0, 0.0, 25.0, TargetKind::Bonus), 500);
        // rf 0.6, af 0.5 -> 55
        assert_eq!(points_for(600.0, 12.5, 25.0, TargetKind::Normal), 55);
        assert_eq!(points_for(600.0, 12.5, 25.0, TargetKind::Moving), 110);
    }

    #[test]
    fn test_hit_builds_streak() {
        let mut engine = ScoringEngine::new();
        engine.record_hit(100.0, 0.0, 20.0, TargetKind::Normal);
        let state = engine.record_hit(100.0, 0.0, 20.0, TargetKind::Normal);
        assert_eq!(state.streak, 2);
        assert_eq!(state.best_streak, 2);
        assert_eq!(state.score, 200);
    }

    #[test]
    fn test_miss_resets_streak_keeps_best() {
        let mut engine = ScoringEngine::new();
        for _ in 0..3 {
            engine.record_hit(100.0, 0.0, 20.0, TargetKind::Normal);
        }
        let state = engine.record_miss();
        assert_eq!(state.streak, 0, "Miss resets streak");
        assert_eq!(state.best_streak, 3, "Best streak survives");
        assert_eq!(state.score, 300, "Miss costs no points");
        assert_eq!(state.misses, 1);
    }

    #[test]
    fn test_streak_milestone_every_fifth_hit() {
        let mut engine = ScoringEngine::new();
        let milestones: Vec<u32> = (1..=10)
            .filter_map(|n| {
                engine.record_hit(100.0, 0.0, 20.0, TargetKind::Normal);
                engine.streak_milestone().then_some(n)
            })
            .collect();
        assert_eq!(milestones, vec![5, 10]);
    }

    #[test]
    fn test_grade_table() {
        assert_eq!(grade_for(0.97, Some(240.0)), Grade::SPlus);
        assert_eq!(grade_for(0.97, Some(260.0)), Grade::S, "Slow for S+");
        assert_eq!(grade_for(0.85, Some(200.0)), Grade::A, "Inaccurate for S");
        assert_eq!(grade_for(0.72, Some(450.0)), Grade::B);
        assert_eq!(grade_for(0.60, Some(600.0)), Grade::C);
        assert_eq!(grade_for(0.45, Some(790.0)), Grade::D);
        assert_eq!(grade_for(0.30, Some(200.0)), Grade::F);
        assert_eq!(grade_for(1.0, None), Grade::F, "No hits is F");
    }

    #[test]
    fn test_grade_order_and_display() {
        assert!(Grade::F < Grade::D);
        assert!(Grade::S < Grade::SPlus);
        assert_eq!(Grade::SPlus.to_string(), "S+");
    }

    #[test]
    fn test_finish_stores_grade() {
        let mut engine = ScoringEngine::new();
        assert_eq!(engine.state().grade, None);
        engine.finish(0.92, Some(280.0));
        assert_eq!(engine.state().grade, Some(Grade::S));
        engine.reset();
        assert_eq!(*engine.state(), ScoreState::default());
    }
}
