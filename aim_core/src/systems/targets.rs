//! Target lifecycle and spawning.
//!
//! Inactive -> Active on spawn, Active -> Hit on a shot inside the hit-circle,
//! Active -> Expired when its lifetime runs out, and Hit/Expired -> Inactive
//! once the after-effect budget has played out and the slot goes back to the
//! pool.

use glam::Vec2;
use log::{debug, error};

use crate::components::{Target, TargetId, TargetKind, TargetState};
use crate::config::SessionConfig;
use crate::error::{PoolError, SessionError};
use crate::map::PlayArea;
use crate::policy::{SpawnPattern, SpawnPolicy};
use crate::pool::Pool;
use crate::resources::{GameRng, HitEvent, HitKind, InputEvent, InputKind, Time, TickEvents};

pub struct TargetStateMachine {
    policy: SpawnPolicy,
    area: PlayArea,
    pool: Pool<Target>,
    after_effect_ms: f32,
    crosshair_clearance: f32,
    target_separation: f32,
    placement_attempts: u32,
    crosshair: Vec2, // Last known resting point
    next_spawn_ms: f32,
}

impl TargetStateMachine {
    /// Validate the policy against the play area and pre-warm the target pool
    pub fn new(policy: SpawnPolicy, config: &SessionConfig) -> Result<Self, SessionError> {
        policy.validate_for(&config.area)?;
        let capacity = policy.target_pool_capacity(config.after_effect_ms, config.fixed_step_ms);

        Ok(Self {
            pool: Pool::with_capacity("target", capacity),
            area: config.area,
            after_effect_ms: config.after_effect_ms,
            crosshair_clearance: config.crosshair_clearance,
            target_separation: config.target_separation,
            placement_attempts: config.placement_attempts,
            crosshair: config.area.center(),
            next_spawn_ms: 0.0,
            policy,
        })
    }

    pub fn policy(&self) -> &SpawnPolicy {
        &self.policy
    }

    pub fn pool(&self) -> &Pool<Target> {
        &self.pool
    }

    pub fn crosshair(&self) -> Vec2 {
        self.crosshair
    }

    pub fn set_crosshair(&mut self, point: Vec2) {
        self.crosshair = point;
    }

    pub fn next_spawn_ms(&self) -> f32 {
        self.next_spawn_ms
    }

    pub fn active_count(&self) -> usize {
        self.pool.iter().filter(|(_, t)| t.is_active()).count()
    }

    /// Every non-Inactive target, including ones playing their after-effect
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.pool.iter().map(|(_, target)| target)
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.pool.get(id)
    }

    /// Apply one input event. Aim only moves the crosshair; a trigger resolves a shot.
    pub fn resolve_input(&mut self, event: &InputEvent, events: &mut TickEvents) -> Option<HitEvent> {
        match event.kind {
            InputKind::Aim => {
                self.crosshair = event.point;
                None
            }
            InputKind::Trigger => Some(self.resolve_shot(event.point, event.timestamp, events)),
        }
    }

    /// Resolve a shot at `point`.
    ///
    /// Candidates are Active targets spawned no later than `timestamp` whose
    /// hit-circle contains the point. The smallest radius wins, ties go to the
    /// lowest slot.
    pub fn resolve_shot(&mut self, point: Vec2, timestamp: f32, events: &mut TickEvents) -> HitEvent {
        self.crosshair = point;

        let mut best: Option<(TargetId, f32)> = None;
        for (id, target) in self.pool.iter() {
            if !target.is_active() || target.spawn_time > timestamp || !target.contains(point) {
                continue;
            }
            if best.map_or(true, |(_, radius)| target.radius < radius) {
                best = Some((id, target.radius));
            }
        }

        let kind = match best.and_then(|(id, _)| self.pool.get_mut(id).map(|t| (id, t))) {
            Some((id, target)) => {
                debug_assert!(target.is_active(), "hit resolved against non-active target");
                target.set_state(TargetState::Hit);
                target.resolved_at = timestamp;
                HitKind::Hit {
                    target: id,
                    reaction_ms: timestamp - target.spawn_time,
                    distance: target.pos.distance(point),
                    radius: target.radius,
                    target_kind: target.kind,
                }
            }
            None => HitKind::Miss,
        };

        let shot = HitEvent {
            timestamp,
            point,
            kind,
        };
        events.shots.push(shot);
        shot
    }

    /// Move, expire and recycle targets up to `time.now`
    pub fn advance(&mut self, time: &Time, events: &mut TickEvents) {
        let dt_secs = time.dt / 1000.0;
        let area = self.area;

        for (_, target) in self.pool.iter_mut() {
            if !target.is_active() || target.vel == Vec2::ZERO {
                continue;
            }
            target.pos += target.vel * dt_secs;
            area.reflect(&mut target.pos, &mut target.vel, target.radius);
        }

        for index in 0..self.pool.capacity() {
            let Some(handle) = self.pool.handle_at(index) else {
                continue;
            };
            let Some(target) = self.pool.get_mut(handle) else {
                continue;
            };

            if target.is_active() && target.age(time.now) >= target.time_to_live {
                target.set_state(TargetState::Expired);
                target.resolved_at = time.now;
                events.expired += 1;
            }

            if target.state().is_resolved() && time.now - target.resolved_at >= self.after_effect_ms {
                target.set_state(TargetState::Inactive);
                self.pool.release(handle);
                events.recycled += 1;
            }
        }
    }

    /// Attempt a spawn if one is due and there is room.
    ///
    /// While the board is full the attempt stays due and fires as soon as a
    /// target resolves.
    pub fn spawn_if_due(
        &mut self,
        now: f32,
        rng: &mut GameRng,
        events: &mut TickEvents,
    ) -> Result<Option<TargetId>, SessionError> {
        if now < self.next_spawn_ms || self.active_count() >= self.policy.max_concurrent {
            return Ok(None);
        }
        self.next_spawn_ms = now + self.policy.spawn_interval_ms;

        let spawned = self.spawn(now, rng)?;
        match spawned {
            Some(_) => events.spawned += 1,
            None => {
                events.spawn_skipped += 1;
                debug!(
                    "No valid placement after {} attempts at t={:.1}, skipping spawn",
                    self.placement_attempts, now
                );
            }
        }
        Ok(spawned)
    }

    /// Sample a policy-driven target. Ok(None) if no placement was found.
    pub fn spawn(&mut self, now: f32, rng: &mut GameRng) -> Result<Option<TargetId>, PoolError> {
        let radius = rng.range(self.policy.radius);
        let Some(pos) = self.find_placement(radius, rng) else {
            return Ok(None);
        };

        let vel = match self.policy.pattern {
            SpawnPattern::Static => Vec2::ZERO,
            SpawnPattern::Linear => {
                let sign = if rng.chance(0.5) { 1.0 } else { -1.0 };
                Vec2::new(sign * rng.range(self.policy.speed), 0.0)
            }
            SpawnPattern::Reflecting => rng.unit_direction() * rng.range(self.policy.speed),
            SpawnPattern::MultiTarget { moving_chance } => {
                if rng.chance(moving_chance) {
                    rng.unit_direction() * rng.range(self.policy.speed)
                } else {
                    Vec2::ZERO
                }
            }
        };
        let kind = if rng.chance(self.policy.bonus_chance) {
            TargetKind::Bonus
        } else if vel != Vec2::ZERO {
            TargetKind::Moving
        } else {
            TargetKind::Normal
        };
        let time_to_live = rng.range(self.policy.lifetime_ms);

        self.activate(pos, radius, vel, kind, now, time_to_live).map(Some)
    }

    /// Place a static target directly, bypassing policy sampling and placement rules
    pub fn spawn_at(&mut self, pos: Vec2, radius: f32, now: f32) -> Result<TargetId, PoolError> {
        let time_to_live = self.policy.lifetime_ms.min;
        self.activate(pos, radius, Vec2::ZERO, TargetKind::Normal, now, time_to_live)
    }

    fn activate(
        &mut self,
        pos: Vec2,
        radius: f32,
        vel: Vec2,
        kind: TargetKind,
        now: f32,
        time_to_live: f32,
    ) -> Result<TargetId, PoolError> {
        let id = self.pool.acquire().map_err(|err| {
            error!("{err}; target pool is undersized for mode '{}'", self.policy.name);
            err
        })?;

        if let Some(target) = self.pool.get_mut(id) {
            target.id = id;
            target.pos = pos;
            target.radius = radius;
            target.vel = vel;
            target.kind = kind;
            target.spawn_time = now;
            target.time_to_live = time_to_live;
            target.set_state(TargetState::Active);
        }
        Ok(id)
    }

    fn find_placement(&self, radius: f32, rng: &mut GameRng) -> Option<Vec2> {
        let region = self.area.spawn_region(radius)?;
        (0..self.placement_attempts)
            .map(|_| rng.point_in(&region))
            .find(|&candidate| self.placement_is_clear(candidate, radius))
    }

    fn placement_is_clear(&self, candidate: Vec2, radius: f32) -> bool {
        if candidate.distance(self.crosshair) < radius + self.crosshair_clearance {
            return false;
        }
        self.pool
            .iter()
            .filter(|(_, other)| other.is_active())
            .all(|(_, other)| {
                candidate.distance(other.pos) >= radius + other.radius + self.target_separation
            })
    }

    /// Release every slot and rewind the spawn schedule
    pub fn reset(&mut self) {
        self.pool.release_all();
        self.crosshair = self.area.center();
        self.next_spawn_ms = 0.0;
    }
}
