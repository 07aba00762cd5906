//! Streaming session statistics.
//!
//! Nothing here keeps raw events: reaction times go through a Welford
//! accumulator, positions into fixed grids, so memory does not grow with the
//! length of a session.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::map::PlayArea;
use crate::params::Params;
use crate::resources::{HitEvent, HitKind};
use crate::systems::scoring::ScoreState;

/// Welford mean/variance with min and max
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f32) {
        let value = value as f64;
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f32> {
        (self.count > 0).then_some(self.mean as f32)
    }

    /// Population variance
    pub fn variance(&self) -> Option<f32> {
        (self.count > 0).then_some((self.m2 / self.count as f64) as f32)
    }

    pub fn std_dev(&self) -> Option<f32> {
        self.variance().map(f32::sqrt)
    }

    pub fn min(&self) -> Option<f32> {
        (self.count > 0).then_some(self.min as f32)
    }

    pub fn max(&self) -> Option<f32> {
        (self.count > 0).then_some(self.max as f32)
    }
}

const CELLS: usize = Params::HEAT_GRID * Params::HEAT_GRID;

/// Fixed square histogram over the play area, row-major from the top-left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatGrid {
    cells: [u32; CELLS],
}

impl HeatGrid {
    pub fn new() -> Self {
        Self { cells: [0; CELLS] }
    }

    pub fn record(&mut self, area: &PlayArea, point: Vec2) {
        let cell = area.cell_of(point, Params::HEAT_GRID);
        self.cells[cell] += 1;
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn get(&self, column: usize, row: usize) -> Option<u32> {
        if column >= Params::HEAT_GRID || row >= Params::HEAT_GRID {
            return None;
        }
        Some(self.cells[row * Params::HEAT_GRID + column])
    }

    pub fn total(&self) -> u32 {
        self.cells.iter().sum()
    }

    /// (column, row) of the busiest cell, None on an empty grid
    pub fn hottest(&self) -> Option<(usize, usize)> {
        let (index, count) = self
            .cells
            .iter()
            .enumerate()
            .max_by_key(|(index, count)| (**count, std::cmp::Reverse(*index)))?;
        (*count > 0).then_some((index % Params::HEAT_GRID, index / Params::HEAT_GRID))
    }
}

impl Default for HeatGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-mode personal bests, carried between sessions by the caller
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModeRecord {
    pub games_played: u32,
    pub best_score: u64,
    pub best_accuracy: f32,
    pub best_mean_reaction_ms: Option<f32>,
    pub best_streak: u32,
}

impl ModeRecord {
    /// Fold a finished session into the record
    pub fn merge(&mut self, score: &ScoreState, accuracy: f32, mean_reaction_ms: Option<f32>) {
        self.games_played += 1;
        self.best_score = self.best_score.max(score.score);
        self.best_accuracy = self.best_accuracy.max(accuracy);
        self.best_streak = self.best_streak.max(score.best_streak);
        if let Some(mean) = mean_reaction_ms {
            self.best_mean_reaction_ms = Some(
                self.best_mean_reaction_ms
                    .map_or(mean, |best| best.min(mean)),
            );
        }
    }
}

/// Read-only view of the accumulated statistics
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSnapshot {
    pub hits: u32,
    pub misses: u32,
    pub expired: u32,
    pub accuracy: f32, // hits / (hits + misses), 0 with no shots
    pub mean_reaction_ms: Option<f32>,
    pub reaction_variance: Option<f32>,
    pub reaction_std_dev_ms: Option<f32>,
    pub min_reaction_ms: Option<f32>,
    pub max_reaction_ms: Option<f32>,
    pub reaction_histogram: [u32; Params::REACTION_BUCKETS],
    pub mean_offset: Option<f32>,
    pub hit_grid: HeatGrid,
    pub miss_grid: HeatGrid,
    pub mode_record: ModeRecord,
}

impl AnalyticsSnapshot {
    pub fn shots(&self) -> u32 {
        self.hits + self.misses
    }

    pub fn accuracy_percent(&self) -> f32 {
        self.accuracy * 100.0
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsAccumulator {
    area: PlayArea,
    hits: u32,
    misses: u32,
    expired: u32,
    reaction: RunningStats,
    offset_sum: f64,
    histogram: [u32; Params::REACTION_BUCKETS],
    hit_grid: HeatGrid,
    miss_grid: HeatGrid,
    mode_record: ModeRecord,
}

impl AnalyticsAccumulator {
    /// `prior` is the caller's stored record for this mode
    pub fn new(area: PlayArea, prior: ModeRecord) -> Self {
        Self {
            area,
            hits: 0,
            misses: 0,
            expired: 0,
            reaction: RunningStats::default(),
            offset_sum: 0.0,
            histogram: [0; Params::REACTION_BUCKETS],
            hit_grid: HeatGrid::new(),
            miss_grid: HeatGrid::new(),
            mode_record: prior,
        }
    }

    pub fn observe(&mut self, shot: &HitEvent) {
        match shot.kind {
            HitKind::Hit { reaction_ms, .. } => {
                self.hits += 1;
                self.reaction.push(reaction_ms);
                self.histogram[reaction_bucket(reaction_ms)] += 1;
                if let Some(offset) = shot.normalized_offset() {
                    self.offset_sum += offset as f64;
                }
                self.hit_grid.record(&self.area, shot.point);
            }
            HitKind::Miss => {
                self.misses += 1;
                self.miss_grid.record(&self.area, shot.point);
            }
        }
    }

    pub fn observe_expiry(&mut self, count: u32) {
        self.expired += count;
    }

    pub fn accuracy(&self) -> f32 {
        let shots = self.hits + self.misses;
        if shots == 0 {
            0.0
        } else {
            self.hits as f32 / shots as f32
        }
    }

    pub fn mean_reaction_ms(&self) -> Option<f32> {
        self.reaction.mean()
    }

    pub fn mode_record(&self) -> &ModeRecord {
        &self.mode_record
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            hits: self.hits,
            misses: self.misses,
            expired: self.expired,
            accuracy: self.accuracy(),
            mean_reaction_ms: self.reaction.mean(),
            reaction_variance: self.reaction.variance(),
            reaction_std_dev_ms: self.reaction.std_dev(),
            min_reaction_ms: self.reaction.min(),
            max_reaction_ms: self.reaction.max(),
            reaction_histogram: self.histogram,
            mean_offset: (self.hits > 0).then(|| (self.offset_sum / self.hits as f64) as f32),
            hit_grid: self.hit_grid.clone(),
            miss_grid: self.miss_grid.clone(),
            mode_record: self.mode_record,
        }
    }

    /// Merge this session into the mode record and take the final snapshot
    pub fn finalize(&mut self, score: &ScoreState) -> AnalyticsSnapshot {
        let accuracy = self.accuracy();
        let mean = self.reaction.mean();
        self.mode_record.merge(score, accuracy, mean);
        self.snapshot()
    }

    /// Start over, seeding the mode record with `prior`
    pub fn reset(&mut self, prior: ModeRecord) {
        *self = Self::new(self.area, prior);
    }
}

/// 100 ms buckets, the last one open-ended
fn reaction_bucket(reaction_ms: f32) -> usize {
    let bucket = (reaction_ms.max(0.0) / Params::REACTION_BUCKET_MS) as usize;
    bucket.min(Params::REACTION_BUCKETS - 1)
}
