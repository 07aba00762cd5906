//! Persisted form of a finished session
//!
//! Uses postcard for compact binary serialization. The caller decides where
//! the bytes go.

use aim_core::{Grade, ModeRecord, SessionOutcome};
use postcard::{from_bytes, take_from_bytes, to_allocvec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bumped whenever the field layout changes
pub const RECORD_VERSION: u16 = 1;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record encoding failed: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("unsupported record version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub version: u16, // Must stay the first field
    pub mode: String,
    pub aborted: bool,
    pub elapsed_ms: f32,
    pub score: u64,
    pub best_streak: u32,
    pub grade: Grade,
    pub hits: u32,
    pub misses: u32,
    pub expired: u32,
    pub accuracy: f32,
    pub mean_reaction_ms: Option<f32>,
    pub reaction_std_dev_ms: Option<f32>,
    pub hits_per_second: f32,
    pub hit_grid: Vec<u32>, // Row-major 10x10
    pub mode_record: ModeRecord,
}

impl SessionRecord {
    pub fn from_outcome(outcome: &SessionOutcome) -> Self {
        let analytics = &outcome.analytics;
        Self {
            version: RECORD_VERSION,
            mode: outcome.mode.clone(),
            aborted: outcome.aborted,
            elapsed_ms: outcome.elapsed_ms,
            score: outcome.score.score,
            best_streak: outcome.score.best_streak,
            grade: outcome.score.grade.unwrap_or(Grade::F),
            hits: analytics.hits,
            misses: analytics.misses,
            expired: analytics.expired,
            accuracy: analytics.accuracy,
            mean_reaction_ms: analytics.mean_reaction_ms,
            reaction_std_dev_ms: analytics.reaction_std_dev_ms,
            hits_per_second: outcome.hits_per_second,
            hit_grid: analytics.hit_grid.cells().to_vec(),
            mode_record: analytics.mode_record,
        }
    }

    /// Serialize record to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        Ok(to_allocvec(self)?)
    }

    /// Deserialize record from bytes, rejecting other versions before decoding the body
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        let (version, _) = take_from_bytes::<u16>(bytes)?;
        if version != RECORD_VERSION {
            return Err(RecordError::UnsupportedVersion {
                found: version,
                expected: RECORD_VERSION,
            });
        }
        Ok(from_bytes(bytes)?)
    }
}

impl From<&SessionOutcome> for SessionRecord {
    fn from(outcome: &SessionOutcome) -> Self {
        Self::from_outcome(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aim_core::{
        FrameView, GameMode, InputQueue, ModeRecord, RangeF32, Renderer, SessionConfig,
        SessionLoop, SessionPhase,
    };
    use glam::Vec2;

    struct NullRenderer;

    impl Renderer for NullRenderer {
        fn frame_ready(&mut self, _frame: &FrameView<'_>) {}
    }

    fn finished_outcome() -> SessionOutcome {
        let mut policy = GameMode::Classic.policy();
        policy.duration_ms = 3000.0;
        policy.bonus_chance = 0.0;
        policy.radius = RangeF32::fixed(25.0);

        let mut session =
            SessionLoop::new(policy, SessionConfig::default(), 12345, ModeRecord::default())
                .expect("Valid policy");
        session.start().expect("Start from Ready");

        let target = *session.targets().targets().next().expect("First target");
        let mut input = InputQueue::new();
        input.push_trigger(target.pos, 250.0);
        input.push_trigger(Vec2::new(1.0, 1.0), 400.0);

        while session.phase() == SessionPhase::Playing {
            session
                .tick(1000.0 / 60.0, 1000.0 / 60.0, &mut input, &mut NullRenderer)
                .expect("Tick should succeed");
        }
        session.finalize().expect("Finalize after finish")
    }

    #[test]
    fn test_record_serialization() {
        let outcome = finished_outcome();
        let record = SessionRecord::from(&outcome);
        assert_eq!(record.hits, 1);
        assert_eq!(record.misses, 1);
        assert_eq!(record.hit_grid.len(), 100);
        assert_eq!(record.mode_record.games_played, 1);

        let bytes = record.to_bytes().expect("Serialization should succeed");
        let decoded = SessionRecord::from_bytes(&bytes).expect("Deserialization should succeed");
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut record = SessionRecord::from(&finished_outcome());
        record.version = RECORD_VERSION + 1;
        let bytes = record.to_bytes().expect("Serialization should succeed");

        match SessionRecord::from_bytes(&bytes) {
            Err(RecordError::UnsupportedVersion { found, expected }) => {
                assert_eq!(found, RECORD_VERSION + 1);
                assert_eq!(expected, RECORD_VERSION);
            }
            other => panic!("Expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let bytes = SessionRecord::from(&finished_outcome())
            .to_bytes()
            .expect("Serialization should succeed");
        assert!(matches!(
            SessionRecord::from_bytes(&bytes[..bytes.len() / 2]),
            Err(RecordError::Encoding(_))
        ));
    }
}
