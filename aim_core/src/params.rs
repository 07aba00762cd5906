/// Session tuning parameters for the aim trainer
#[derive(Debug, Clone, Copy)]
pub struct Params;

impl Params {
    // Play area (px)
    pub const PLAY_WIDTH: f32 = 1280.0;
    pub const PLAY_HEIGHT: f32 = 720.0;

    // Clock (ms)
    pub const FIXED_STEP_MS: f32 = 1000.0 / 120.0; // 120 Hz micro-steps
    pub const MAX_DT_MS: f32 = 100.0; // Clamp to prevent large jumps
    pub const AFTER_EFFECT_MS: f32 = 150.0; // Hit/expired targets linger this long
    pub const MAX_SESSION_MS: f32 = 3_600_000.0; // One hour

    // Spawn placement
    pub const CROSSHAIR_CLEARANCE: f32 = 20.0;
    pub const TARGET_SEPARATION: f32 = 25.0;
    pub const PLACEMENT_ATTEMPTS: u32 = 30;
    pub const BONUS_CHANCE: f32 = 0.1;

    // Scoring curve
    pub const BASE_POINTS: f32 = 100.0;
    pub const REACTION_FAST_MS: f32 = 200.0; // Full reaction credit at or below
    pub const REACTION_SLOW_MS: f32 = 1000.0; // Floor reached at or above
    pub const REACTION_FLOOR: f32 = 0.2;
    pub const REACTION_WEIGHT: f32 = 0.5;
    pub const ACCURACY_WEIGHT: f32 = 0.5;
    pub const STREAK_FLARE_EVERY: u32 = 5;

    // Analytics
    pub const HEAT_GRID: usize = 10; // 10x10 cells
    pub const REACTION_BUCKETS: usize = 10;
    pub const REACTION_BUCKET_MS: f32 = 100.0;

    // Adaptive quality
    pub const TARGET_FPS: f32 = 60.0;
    pub const FRAME_WINDOW: usize = 30;
    pub const DEMOTE_RATIO: f32 = 1.10;
    pub const PROMOTE_RATIO: f32 = 0.80;
    pub const DEMOTE_WINDOWS: u32 = 2;
    pub const PROMOTE_WINDOWS: u32 = 4;
    pub const QUALITY_COOLDOWN_MS: f32 = 3000.0;

    // Particles
    pub const PARTICLE_CAPACITY: usize = 512;
    pub const HIT_BURST: u32 = 15;
    pub const MISS_PUFF: u32 = 5;
    pub const PARTICLE_DRAG: f32 = 0.98; // Per 60 Hz frame
    pub const HIT_PARTICLE_LIFE_MS: f32 = 660.0;
    pub const MISS_PARTICLE_LIFE_MS: f32 = 330.0;
    pub const STREAK_PARTICLE_LIFE_MS: f32 = 1000.0;
}
