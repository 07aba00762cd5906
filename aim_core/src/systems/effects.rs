use glam::Vec2;
use log::warn;

use crate::components::{EffectKind, Particle};
use crate::params::Params;
use crate::policy::RangeF32;
use crate::pool::Pool;
use crate::resources::{GameRng, TickEvents};
use crate::systems::quality::EffectTier;

const HIT_SPEED: RangeF32 = RangeF32::new(60.0, 240.0);
const MISS_SPEED: RangeF32 = RangeF32::new(30.0, 90.0);
const FLARE_SPEED: RangeF32 = RangeF32::new(120.0, 300.0);
const PARTICLE_SIZE: RangeF32 = RangeF32::new(2.0, 5.0);

/// Pooled hit/miss/streak particles
pub struct EffectSystem {
    pool: Pool<Particle>,
}

impl EffectSystem {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: Pool::with_capacity("particle", capacity),
        }
    }

    pub fn pool(&self) -> &Pool<Particle> {
        &self.pool
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter().map(|(_, particle)| particle)
    }

    pub fn active_count(&self) -> usize {
        self.pool.in_use_count()
    }

    pub fn emit_hit(
        &mut self,
        origin: Vec2,
        tier: EffectTier,
        rng: &mut GameRng,
        events: &mut TickEvents,
    ) -> u32 {
        let count = scaled(Params::HIT_BURST, tier);
        self.emit(EffectKind::HitBurst, origin, count, rng, events)
    }

    pub fn emit_miss(
        &mut self,
        origin: Vec2,
        tier: EffectTier,
        rng: &mut GameRng,
        events: &mut TickEvents,
    ) -> u32 {
        let count = scaled(Params::MISS_PUFF, tier);
        self.emit(EffectKind::MissPuff, origin, count, rng, events)
    }

    /// Flare for a streak milestone, bigger for longer streaks
    pub fn emit_streak(
        &mut self,
        origin: Vec2,
        streak: u32,
        tier: EffectTier,
        rng: &mut GameRng,
        events: &mut TickEvents,
    ) -> u32 {
        let count = scaled(2 * (streak / Params::STREAK_FLARE_EVERY), tier);
        self.emit(EffectKind::StreakFlare, origin, count, rng, events)
    }

    /// Emit up to `count` particles. A full pool truncates the burst.
    fn emit(
        &mut self,
        kind: EffectKind,
        origin: Vec2,
        count: u32,
        rng: &mut GameRng,
        events: &mut TickEvents,
    ) -> u32 {
        let (speed, life) = match kind {
            EffectKind::HitBurst => (HIT_SPEED, Params::HIT_PARTICLE_LIFE_MS),
            EffectKind::MissPuff => (MISS_SPEED, Params::MISS_PARTICLE_LIFE_MS),
            EffectKind::StreakFlare => (FLARE_SPEED, Params::STREAK_PARTICLE_LIFE_MS),
        };

        for emitted in 0..count {
            let handle = match self.pool.acquire() {
                Ok(handle) => handle,
                Err(err) => {
                    let dropped = count - emitted;
                    warn!("{err}, dropping {dropped} {kind:?} particles");
                    events.particles_dropped += dropped;
                    return emitted;
                }
            };
            if let Some(particle) = self.pool.get_mut(handle) {
                particle.pos = origin;
                particle.vel = rng.unit_direction() * rng.range(speed);
                particle.life = life;
                particle.max_life = life;
                particle.size = rng.range(PARTICLE_SIZE);
                particle.kind = kind;
            }
        }
        count
    }

    /// Move, slow and age particles by `dt_ms`, releasing the dead ones
    pub fn update(&mut self, dt_ms: f32) {
        let drag = Params::PARTICLE_DRAG.powf(dt_ms * Params::TARGET_FPS / 1000.0);
        let dt_secs = dt_ms / 1000.0;

        for index in 0..self.pool.capacity() {
            let Some(handle) = self.pool.handle_at(index) else {
                continue;
            };
            let Some(particle) = self.pool.get_mut(handle) else {
                continue;
            };
            particle.pos += particle.vel * dt_secs;
            particle.vel *= drag;
            particle.life -= dt_ms;
            if particle.life <= 0.0 {
                self.pool.release(handle);
            }
        }
    }

    pub fn reset(&mut self) {
        self.pool.release_all();
    }
}

fn scaled(base: u32, tier: EffectTier) -> u32 {
    (base as f32 * tier.particle_scale()).round() as u32
}
