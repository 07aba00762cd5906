use glam::Vec2;
use rand::{Rng, SeedableRng};

use crate::components::{TargetId, TargetKind};
use crate::map::Aabb;
use crate::policy::RangeF32;

/// Time resource for tracking session time (ms)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Time {
    pub dt: f32,  // Length of this step
    pub now: f32, // Session clock at the end of this step
}

impl Time {
    pub fn new(dt: f32, now: f32) -> Self {
        Self { dt, now }
    }

    /// Start of this step
    pub fn start(&self) -> f32 {
        self.now - self.dt
    }
}

impl Default for Time {
    fn default() -> Self {
        Self { dt: 0.0, now: 0.0 }
    }
}

/// Random number generator
#[derive(Debug, Clone)]
pub struct GameRng(pub rand::rngs::StdRng);

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self(rand::rngs::StdRng::seed_from_u64(seed))
    }

    /// Uniform sample from a closed range
    pub fn range(&mut self, range: RangeF32) -> f32 {
        if range.max <= range.min {
            range.min
        } else {
            self.0.gen_range(range.min..=range.max)
        }
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.0.gen::<f32>() < probability
    }

    pub fn unit_direction(&mut self) -> Vec2 {
        let angle = self.0.gen_range(0.0..std::f32::consts::TAU);
        Vec2::from_angle(angle)
    }

    /// Uniform point inside a box
    pub fn point_in(&mut self, region: &Aabb) -> Vec2 {
        Vec2::new(
            self.range(RangeF32::new(region.min.x, region.max.x)),
            self.range(RangeF32::new(region.min.y, region.max.y)),
        )
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Click or trigger pull, resolves a shot
    Trigger,
    /// Crosshair movement only
    Aim,
}

/// One pointer event from the input source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub point: Vec2,
    pub timestamp: f32, // Session clock, ms
    pub kind: InputKind,
}

impl InputEvent {
    pub fn trigger(point: Vec2, timestamp: f32) -> Self {
        Self {
            point,
            timestamp,
            kind: InputKind::Trigger,
        }
    }

    pub fn aim(point: Vec2, timestamp: f32) -> Self {
        Self {
            point,
            timestamp,
            kind: InputKind::Aim,
        }
    }
}

/// Buffered input, handed to the session on each tick
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    pub events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn push_trigger(&mut self, point: Vec2, timestamp: f32) {
        self.push(InputEvent::trigger(point, timestamp));
    }

    pub fn push_aim(&mut self, point: Vec2, timestamp: f32) {
        self.push(InputEvent::aim(point, timestamp));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// How a shot resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitKind {
    Hit {
        target: TargetId,
        reaction_ms: f32,
        distance: f32, // From target center
        radius: f32,
        target_kind: TargetKind,
    },
    Miss,
}

/// A resolved shot. Lives until the end of the tick that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    pub timestamp: f32,
    pub point: Vec2,
    pub kind: HitKind,
}

impl HitEvent {
    pub fn is_hit(&self) -> bool {
        matches!(self.kind, HitKind::Hit { .. })
    }

    pub fn reaction_ms(&self) -> Option<f32> {
        match self.kind {
            HitKind::Hit { reaction_ms, .. } => Some(reaction_ms),
            HitKind::Miss => None,
        }
    }

    /// Distance from center as a fraction of the radius, 0 is dead center
    pub fn normalized_offset(&self) -> Option<f32> {
        match self.kind {
            HitKind::Hit {
                distance, radius, ..
            } if radius > 0.0 => Some((distance / radius).clamp(0.0, 1.0)),
            _ => None,
        }
    }
}

/// Everything that happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    pub shots: Vec<HitEvent>,
    pub spawned: u32,
    pub expired: u32,
    pub recycled: u32,
    pub spawn_skipped: u32,
    pub particles_dropped: u32,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(shots: usize) -> Self {
        Self {
            shots: Vec::with_capacity(shots),
            ..Default::default()
        }
    }

    pub fn hits(&self) -> usize {
        self.shots.iter().filter(|shot| shot.is_hit()).count()
    }

    pub fn misses(&self) -> usize {
        self.shots.len() - self.hits()
    }

    pub fn clear(&mut self) {
        self.shots.clear();
        self.spawned = 0;
        self.expired = 0;
        self.recycled = 0;
        self.spawn_skipped = 0;
        self.particles_dropped = 0;
    }
}
