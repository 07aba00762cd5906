use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::pool::{Poolable, SlotHandle};

/// Target identity: the pool slot it occupies
pub type TargetId = SlotHandle;

/// Target lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetState {
    #[default]
    Inactive,
    Active,
    Hit,
    Expired,
}

impl TargetState {
    /// Legal lifecycle edges: Inactive -> Active -> {Hit | Expired} -> Inactive
    pub fn can_transition(self, next: TargetState) -> bool {
        matches!(
            (self, next),
            (TargetState::Inactive, TargetState::Active)
                | (TargetState::Active, TargetState::Hit)
                | (TargetState::Active, TargetState::Expired)
                | (TargetState::Hit, TargetState::Inactive)
                | (TargetState::Expired, TargetState::Inactive)
        )
    }

    /// Resolved targets still hold their slot while the after-effect plays
    pub fn is_resolved(self) -> bool {
        matches!(self, TargetState::Hit | TargetState::Expired)
    }
}

/// Target flavour, decides the point multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetKind {
    #[default]
    Normal,
    Moving,
    Bonus,
}

impl TargetKind {
    pub fn multiplier(self) -> f32 {
        match self {
            TargetKind::Normal => 1.0,
            TargetKind::Moving => 2.0,
            TargetKind::Bonus => 5.0,
        }
    }
}

/// A clickable circle
#[derive(Debug, Clone, Copy, Default)]
pub struct Target {
    pub id: TargetId,
    pub pos: Vec2,
    pub radius: f32,
    pub vel: Vec2, // px/s, zero for static targets
    pub spawn_time: f32,
    pub time_to_live: f32,
    pub kind: TargetKind,
    pub resolved_at: f32, // When it went Hit/Expired
    state: TargetState,
}

impl Target {
    pub fn state(&self) -> TargetState {
        self.state
    }

    /// Move along the lifecycle. Illegal edges are programming errors.
    pub(crate) fn set_state(&mut self, next: TargetState) {
        debug_assert!(
            self.state.can_transition(next),
            "illegal target transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    pub fn is_active(&self) -> bool {
        self.state == TargetState::Active
    }

    /// Does the hit-circle contain `point`
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance_squared(point) <= self.radius * self.radius
    }

    pub fn age(&self, now: f32) -> f32 {
        now - self.spawn_time
    }

    /// Fraction of lifetime used, 0..=1
    pub fn lifetime_ratio(&self, now: f32) -> f32 {
        if self.time_to_live <= 0.0 {
            return 1.0;
        }
        (self.age(now) / self.time_to_live).clamp(0.0, 1.0)
    }
}

impl Poolable for Target {}

/// What a particle belongs to, the renderer picks colour from this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectKind {
    #[default]
    HitBurst,
    MissPuff,
    StreakFlare,
}

/// Short-lived visual particle
#[derive(Debug, Clone, Copy, Default)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2, // px/s
    pub life: f32, // ms remaining
    pub max_life: f32,
    pub size: f32,
    pub kind: EffectKind,
}

impl Particle {
    /// Fade factor, 1 at birth and 0 at death
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

impl Poolable for Particle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_edges() {
        use TargetState::*;
        assert!(Inactive.can_transition(Active));
        assert!(Active.can_transition(Hit));
        assert!(Active.can_transition(Expired));
        assert!(Hit.can_transition(Inactive));
        assert!(Expired.can_transition(Inactive));

        assert!(!Inactive.can_transition(Hit), "Cannot hit an inactive target");
        assert!(!Hit.can_transition(Expired));
        assert!(!Expired.can_transition(Active));
    }

    #[test]
    fn test_contains_includes_edge() {
        let target = Target {
            pos: Vec2::new(100.0, 100.0),
            radius: 10.0,
            ..Default::default()
        };
        assert!(target.contains(Vec2::new(110.0, 100.0)));
        assert!(!target.contains(Vec2::new(110.1, 100.0)));
    }

    #[test]
    fn test_kind_multipliers() {
        assert_eq!(TargetKind::Normal.multiplier(), 1.0);
        assert_eq!(TargetKind::Moving.multiplier(), 2.0);
        assert_eq!(TargetKind::Bonus.multiplier(), 5.0);
    }

    #[test]
    fn test_particle_alpha() {
        let particle = Particle {
            life: 50.0,
            max_life: 100.0,
            ..Default::default()
        };
        assert_eq!(particle.alpha(), 0.5);
        assert_eq!(Particle::default().alpha(), 0.0);
    }
}
