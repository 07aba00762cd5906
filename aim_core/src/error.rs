//! Error types for session construction and the running loop.
//!
//! Configuration faults are caught before the first tick. Pool exhaustion is a
//! sizing fault and surfaces as [`SessionError::PoolExhausted`]. Frame-budget
//! overruns are not errors at all; the quality controller absorbs them.

use thiserror::Error;

use crate::fsm::{SessionAction, SessionPhase};

/// A [`crate::SpawnPolicy`] that cannot drive a session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("max concurrent targets must be at least 1")]
    ZeroConcurrent,

    #[error("{field} range is invalid: min {min}, max {max}")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must be a probability in [0, 1], got {value}")]
    BadProbability { field: &'static str, value: f32 },

    #[error("session duration {value} ms exceeds the {max} ms limit")]
    DurationTooLong { value: f32, max: f32 },

    #[error("moving spawn pattern needs a positive max speed")]
    StationaryMovingPattern,

    #[error("target radius {radius} does not fit a {width}x{height} play area")]
    TargetTooLarge { radius: f32, width: f32, height: f32 },
}

/// Pool acquisition failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("{pool} pool exhausted (capacity {capacity})")]
    Exhausted { pool: &'static str, capacity: usize },
}

/// Top-level error for the session engine.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid spawn policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("unknown game mode: {0}")]
    UnknownMode(String),

    #[error("{pool} pool exhausted (capacity {capacity}); pool is undersized for this mode")]
    PoolExhausted { pool: &'static str, capacity: usize },

    #[error("cannot {action:?} while session is {phase:?}")]
    InvalidPhase {
        phase: SessionPhase,
        action: SessionAction,
    },
}

impl From<PoolError> for SessionError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted { pool, capacity } => Self::PoolExhausted { pool, capacity },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_converts_to_session_error() {
        let err: SessionError = PoolError::Exhausted {
            pool: "target",
            capacity: 4,
        }
        .into();
        assert!(matches!(
            err,
            SessionError::PoolExhausted {
                pool: "target",
                capacity: 4
            }
        ));
    }

    #[test]
    fn test_policy_error_message_names_field() {
        let err = PolicyError::InvalidRange {
            field: "radius",
            min: 10.0,
            max: 5.0,
        };
        assert!(err.to_string().contains("radius"));
    }
}
