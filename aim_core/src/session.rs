//! The fixed-tick session driver.
//!
//! Each tick polls input, then walks the clock forward in fixed micro-steps.
//! Inside a micro-step shots resolve first, then motion, expiry, recycling,
//! spawning and particles, so a target hit in its final frame still counts.
//! After the micro-steps the frame time goes to the quality controller and the
//! renderer gets a read-only view of the result.

use glam::Vec2;
use log::{debug, info, trace};

use crate::components::{Particle, Target};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::fsm::{SessionAction, SessionFsm, SessionPhase};
use crate::policy::{GameMode, SpawnPolicy};
use crate::resources::{GameRng, HitEvent, InputEvent, InputQueue, Time, TickEvents};
use crate::systems::{
    grade_for, AnalyticsAccumulator, AnalyticsSnapshot, EffectSystem, EffectTier, ModeRecord,
    QualityController, QualityState, ScoreState, ScoringEngine, TargetStateMachine,
};

const HEARTBEAT_TICKS: u64 = 60;

// Abstract input for testing and headless drivers
pub trait InputSource {
    /// Append every event produced since the last poll
    fn poll(&mut self, out: &mut Vec<InputEvent>);
}

impl InputSource for InputQueue {
    fn poll(&mut self, out: &mut Vec<InputEvent>) {
        out.append(&mut self.events);
    }
}

// Abstract renderer; it only ever sees a read-only frame
pub trait Renderer {
    fn frame_ready(&mut self, frame: &FrameView<'_>);
}

/// What the renderer may read after a tick
pub struct FrameView<'a> {
    pub now_ms: f32,
    pub remaining_ms: f32,
    pub phase: SessionPhase,
    pub crosshair: Vec2,
    pub quality: QualityState,
    pub score: &'a ScoreState,
    pub events: &'a TickEvents,
    targets: &'a TargetStateMachine,
    effects: &'a EffectSystem,
}

impl<'a> FrameView<'a> {
    /// Active targets plus ones still playing their after-effect
    pub fn targets(&self) -> impl Iterator<Item = &'a Target> {
        self.targets.targets()
    }

    pub fn active_targets(&self) -> impl Iterator<Item = &'a Target> {
        self.targets.targets().filter(|target| target.is_active())
    }

    pub fn particles(&self) -> impl Iterator<Item = &'a Particle> {
        self.effects.particles()
    }

    pub fn tier(&self) -> EffectTier {
        self.quality.tier
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Session still running
    Running,
    /// Duration reached on this tick
    Finished,
    /// Not playing; input was discarded and nothing advanced
    Idle,
}

/// Everything persistence needs once a session is over
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub mode: String,
    pub analytics: AnalyticsSnapshot,
    pub score: ScoreState,
    pub elapsed_ms: f32,
    pub aborted: bool,
    pub hits_per_second: f32,
}

impl SessionOutcome {
    pub fn into_parts(self) -> (AnalyticsSnapshot, ScoreState) {
        (self.analytics, self.score)
    }
}

pub struct SessionLoop {
    config: SessionConfig,
    seed: u64,
    fsm: SessionFsm,
    time: Time,
    rng: GameRng,
    targets: TargetStateMachine,
    scoring: ScoringEngine,
    analytics: AnalyticsAccumulator,
    quality: QualityController,
    effects: EffectSystem,
    pending: Vec<(u64, InputEvent)>, // Sorted by (timestamp, arrival)
    polled: Vec<InputEvent>,
    next_seq: u64,
    events: TickEvents,
    tick_count: u64,
    outcome: Option<SessionOutcome>,
}

impl SessionLoop {
    /// Build a session. Configuration faults surface here, before any tick runs.
    pub fn new(
        policy: SpawnPolicy,
        config: SessionConfig,
        seed: u64,
        prior: ModeRecord,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let targets = TargetStateMachine::new(policy, &config)?;
        let input_capacity = 64;

        Ok(Self {
            seed,
            fsm: SessionFsm::new(),
            time: Time::default(),
            rng: GameRng::new(seed),
            targets,
            scoring: ScoringEngine::new(),
            analytics: AnalyticsAccumulator::new(config.area, prior),
            quality: QualityController::new(config.quality),
            effects: EffectSystem::new(config.particle_capacity),
            pending: Vec::with_capacity(input_capacity),
            polled: Vec::with_capacity(input_capacity),
            next_seq: 0,
            events: TickEvents::with_capacity(input_capacity),
            tick_count: 0,
            outcome: None,
            config,
        })
    }

    /// Built-in mode with the default configuration and no prior record
    pub fn for_mode(mode: GameMode, seed: u64) -> Result<Self, SessionError> {
        Self::new(mode.policy(), SessionConfig::default(), seed, ModeRecord::default())
    }

    pub fn phase(&self) -> SessionPhase {
        self.fsm.phase()
    }

    pub fn policy(&self) -> &SpawnPolicy {
        self.targets.policy()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn now_ms(&self) -> f32 {
        self.time.now
    }

    pub fn remaining_ms(&self) -> f32 {
        (self.policy().duration_ms - self.time.now).max(0.0)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn score(&self) -> &ScoreState {
        self.scoring.state()
    }

    /// Safe to call at any time, does not disturb accumulation
    pub fn analytics(&self) -> AnalyticsSnapshot {
        self.analytics.snapshot()
    }

    pub fn quality(&self) -> QualityState {
        self.quality.state()
    }

    pub fn targets(&self) -> &TargetStateMachine {
        &self.targets
    }

    pub fn effects(&self) -> &EffectSystem {
        &self.effects
    }

    pub fn active_count(&self) -> usize {
        self.targets.active_count()
    }

    /// What happened during the last tick
    pub fn last_events(&self) -> &TickEvents {
        &self.events
    }

    /// Input received but timestamped past the last tick
    pub fn pending_input(&self) -> usize {
        self.pending.len()
    }

    pub fn pin_quality(&mut self, tier: EffectTier) {
        self.quality.pin(tier);
    }

    pub fn unpin_quality(&mut self) {
        self.quality.unpin();
    }

    pub fn frame_view(&self) -> FrameView<'_> {
        FrameView {
            now_ms: self.time.now,
            remaining_ms: self.remaining_ms(),
            phase: self.fsm.phase(),
            crosshair: self.targets.crosshair(),
            quality: self.quality.state(),
            score: self.scoring.state(),
            events: &self.events,
            targets: &self.targets,
            effects: &self.effects,
        }
    }

    fn act(&mut self, action: SessionAction) -> Result<(), SessionError> {
        let result = self.fsm.transition(action);
        if result.success() {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                phase: result.from_phase(),
                action,
            })
        }
    }

    /// Ready -> Playing. The clock starts at 0 and the first spawn is attempted immediately.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.act(SessionAction::Start)?;
        self.time = Time::default();
        self.events.clear();

        info!(
            "Session started: mode='{}', seed={}, target pool={}, particle pool={}",
            self.policy().name,
            self.seed,
            self.targets.pool().capacity(),
            self.effects.pool().capacity()
        );

        self.targets
            .spawn_if_due(0.0, &mut self.rng, &mut self.events)?;
        Ok(())
    }

    /// Advance the session by `dt_ms` of game time.
    ///
    /// `frame_ms` is the wall time the previous frame took and only feeds the
    /// quality controller.
    pub fn tick(
        &mut self,
        dt_ms: f32,
        frame_ms: f32,
        input: &mut dyn InputSource,
        renderer: &mut dyn Renderer,
    ) -> Result<TickStatus, SessionError> {
        self.events.clear();
        self.polled.clear();
        input.poll(&mut self.polled);

        if !self.fsm.is_playing() {
            self.polled.clear();
            self.pending.clear();
            return Ok(TickStatus::Idle);
        }

        for event in self.polled.drain(..) {
            // A non-finite timestamp would slip past every ordering check
            if !event.timestamp.is_finite() || !event.point.is_finite() {
                debug!("Dropping malformed input: {:?}", event);
                continue;
            }
            self.pending.push((self.next_seq, event));
            self.next_seq += 1;
        }
        self.pending.sort_unstable_by(|(seq_a, a), (seq_b, b)| {
            a.timestamp
                .total_cmp(&b.timestamp)
                .then(seq_a.cmp(seq_b))
        });

        // Clamp dt to prevent large jumps, and never run past the end
        let dt = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        let end = (self.time.now + dt.min(self.config.max_dt_ms)).min(self.policy().duration_ms);
        let dt = end - self.time.now;

        // Fixed micro-steps, the last one ends exactly at `end`
        let mut cursor = 0;
        let mut t0 = self.time.now;
        while t0 < end {
            let t1 = if end - t0 <= self.config.fixed_step_ms {
                end
            } else {
                t0 + self.config.fixed_step_ms
            };
            let step_time = Time::new(t1 - t0, t1);

            // 1. Resolve input up to the end of this step. A target spawned at t1
            // is not on screen yet, so a click stamped exactly t1 cannot hit it.
            while let Some((_, event)) = self.pending.get(cursor).copied() {
                if event.timestamp > t1 {
                    break;
                }
                cursor += 1;
                if let Some(shot) = self.targets.resolve_input(&event, &mut self.events) {
                    self.apply_shot(&shot);
                }
            }

            // 2. Move, expire and recycle targets
            let expired_before = self.events.expired;
            self.targets.advance(&step_time, &mut self.events);
            self.analytics
                .observe_expiry(self.events.expired - expired_before);

            // 3. Spawn
            self.targets
                .spawn_if_due(t1, &mut self.rng, &mut self.events)?;

            // 4. Particles
            self.effects.update(step_time.dt);

            t0 = t1;
        }
        self.pending.drain(..cursor);
        self.time = Time::new(dt, end);

        self.quality.on_frame_complete(frame_ms);

        self.tick_count += 1;
        if self.tick_count % HEARTBEAT_TICKS == 0 {
            trace!(
                "Session running, tick={}, now={:.1}, active={}, tier={:?}",
                self.tick_count,
                self.time.now,
                self.targets.active_count(),
                self.quality.tier()
            );
        }

        renderer.frame_ready(&self.frame_view());

        if self.time.now >= self.policy().duration_ms {
            self.act(SessionAction::TimeUp)?;
            self.pending.clear();
            let snapshot = self.analytics.snapshot();
            info!(
                "Session finished: mode='{}', score={}, grade={}, accuracy={:.1}%",
                self.policy().name,
                self.scoring.state().score,
                grade_for(snapshot.accuracy, snapshot.mean_reaction_ms),
                snapshot.accuracy_percent()
            );
            return Ok(TickStatus::Finished);
        }
        Ok(TickStatus::Running)
    }

    /// Feed one shot to scoring, analytics and effects
    fn apply_shot(&mut self, shot: &HitEvent) {
        let tier = self.quality.tier();
        self.scoring.record(shot);
        self.analytics.observe(shot);

        if shot.is_hit() {
            self.effects
                .emit_hit(shot.point, tier, &mut self.rng, &mut self.events);
            if self.scoring.streak_milestone() {
                let streak = self.scoring.state().streak;
                self.effects
                    .emit_streak(shot.point, streak, tier, &mut self.rng, &mut self.events);
            }
        } else {
            self.effects
                .emit_miss(shot.point, tier, &mut self.rng, &mut self.events);
        }
    }

    /// Stop early. Every pooled slot is released and pending input dropped.
    pub fn abort(&mut self) -> Result<(), SessionError> {
        self.act(SessionAction::Abort)?;
        self.targets.reset();
        self.effects.reset();
        self.pending.clear();

        let snapshot = self.analytics.snapshot();
        info!(
            "Session aborted at {:.0} ms: mode='{}', score={}, grade={}, accuracy={:.1}%",
            self.time.now,
            self.policy().name,
            self.scoring.state().score,
            grade_for(snapshot.accuracy, snapshot.mean_reaction_ms),
            snapshot.accuracy_percent()
        );
        Ok(())
    }

    /// Grade the session and hand the results over.
    ///
    /// Only completed sessions count towards the mode record. Calling this
    /// again returns the same outcome.
    pub fn finalize(&mut self) -> Result<SessionOutcome, SessionError> {
        self.act(SessionAction::Finalize)?;
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }

        let aborted = self.fsm.phase() == SessionPhase::Aborted;
        let accuracy = self.analytics.accuracy();
        let mean = self.analytics.mean_reaction_ms();
        self.scoring.finish(accuracy, mean);

        let analytics = if aborted {
            self.analytics.snapshot()
        } else {
            self.analytics.finalize(self.scoring.state())
        };
        self.targets.reset();
        self.effects.reset();

        let elapsed_ms = self.time.now;
        let hits_per_second = if elapsed_ms > 0.0 {
            analytics.hits as f32 / (elapsed_ms / 1000.0)
        } else {
            0.0
        };

        let outcome = SessionOutcome {
            mode: self.policy().name.clone(),
            analytics,
            score: *self.scoring.state(),
            elapsed_ms,
            aborted,
            hits_per_second,
        };
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Finished/Aborted -> Ready with a clean slate. The mode record carries forward.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if !self.fsm.can_transition(SessionAction::Restart) {
            return Err(SessionError::InvalidPhase {
                phase: self.fsm.phase(),
                action: SessionAction::Restart,
            });
        }
        let prior = self.finalize()?.analytics.mode_record;
        self.act(SessionAction::Restart)?;

        self.time = Time::default();
        self.rng = GameRng::new(self.seed);
        self.targets.reset();
        self.scoring.reset();
        self.analytics.reset(prior);
        self.quality.reset();
        self.effects.reset();
        self.events.clear();
        self.pending.clear();
        self.polled.clear();
        self.next_seq = 0;
        self.tick_count = 0;
        self.outcome = None;
        Ok(())
    }
}
