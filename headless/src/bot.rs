//! Scripted player for headless runs.
//!
//! The bot watches each finished frame the way a renderer would, locks onto the
//! nearest active target, and queues an aim plus a trigger once its reaction
//! delay has elapsed. The queued input is handed back to the session on the
//! next tick.

use aim_core::{FrameView, InputQueue, RangeF32, Renderer, TargetId};
use clap::ValueEnum;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Skill {
    Novice,
    Average,
    Pro,
}

/// How a skill level plays
#[derive(Debug, Clone, Copy)]
struct Profile {
    reaction_ms: RangeF32,
    jitter: f32, // Max aim error as a fraction of the target radius
    whiff_chance: f32,
}

impl Skill {
    fn profile(self) -> Profile {
        match self {
            Skill::Novice => Profile {
                reaction_ms: RangeF32::new(450.0, 800.0),
                jitter: 0.95,
                whiff_chance: 0.15,
            },
            Skill::Average => Profile {
                reaction_ms: RangeF32::new(280.0, 500.0),
                jitter: 0.6,
                whiff_chance: 0.07,
            },
            Skill::Pro => Profile {
                reaction_ms: RangeF32::new(170.0, 300.0),
                jitter: 0.35,
                whiff_chance: 0.02,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Engagement {
    target: TargetId,
    fire_at: f32,
}

pub struct Bot {
    profile: Profile,
    rng: StdRng,
    step_ms: f32,
    engagement: Option<Engagement>,
    queue: InputQueue,
    shots_fired: u32,
}

impl Bot {
    pub fn new(skill: Skill, seed: u64, step_ms: f32) -> Self {
        Self {
            profile: skill.profile(),
            // Offset so the bot never mirrors the session's own stream
            rng: StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15),
            step_ms,
            engagement: None,
            queue: InputQueue::with_capacity(8),
            shots_fired: 0,
        }
    }

    /// Input queued since the last call
    pub fn take_input(&mut self) -> InputQueue {
        std::mem::take(&mut self.queue)
    }

    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    fn reaction_delay(&mut self) -> f32 {
        let range = self.profile.reaction_ms;
        self.rng.gen_range(range.min..=range.max)
    }

    /// Random point in a disc, denser towards the centre
    fn aim_error(&mut self, radius: f32) -> Vec2 {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = if self.rng.gen::<f32>() < self.profile.whiff_chance {
            radius * self.rng.gen_range(1.3f32..2.5)
        } else {
            radius * self.profile.jitter * self.rng.gen::<f32>()
        };
        Vec2::from_angle(angle) * distance
    }
}

impl Renderer for Bot {
    fn frame_ready(&mut self, frame: &FrameView<'_>) {
        // Drop the lock if the target was hit or timed out
        let locked = self.engagement.and_then(|engagement| {
            frame
                .active_targets()
                .find(|target| target.id == engagement.target)
                .map(|target| (engagement, *target))
        });

        let (engagement, target) = match locked {
            Some(locked) => locked,
            None => {
                let crosshair = frame.crosshair;
                let nearest = frame.active_targets().min_by(|a, b| {
                    a.pos
                        .distance_squared(crosshair)
                        .total_cmp(&b.pos.distance_squared(crosshair))
                });
                let Some(target) = nearest.copied() else {
                    self.engagement = None;
                    return;
                };
                let engagement = Engagement {
                    target: target.id,
                    fire_at: frame.now_ms + self.reaction_delay(),
                };
                (engagement, target)
            }
        };

        // Only fire once the shot lands inside the next tick
        if engagement.fire_at > frame.now_ms + self.step_ms {
            self.engagement = Some(engagement);
            return;
        }

        let fire_at = engagement.fire_at.max(frame.now_ms);
        let lead = target.vel * ((fire_at - frame.now_ms) / 1000.0);
        let point = target.pos + lead + self.aim_error(target.radius);

        self.queue.push_aim(point, fire_at);
        self.queue.push_trigger(point, fire_at);
        self.shots_fired += 1;

        // A missed target stays locked for a quicker follow-up
        self.engagement = Some(Engagement {
            target: target.id,
            fire_at: fire_at + self.reaction_delay() * 0.5,
        });
    }
}
