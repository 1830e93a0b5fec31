//! Error noise suppression
//!
//! Sustained failures (throttling, a revoked role) would print the same
//! message on every refresh. [`ErrorTracker`] surfaces a failure the first
//! time its signature is seen and stays quiet for immediate repeats, until
//! a different failure comes along.

use super::errors::ClassifiedError;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

pub const AUTH_BANNER: &str = "AWS Authentication Error";

/// A failure ready for human-facing output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TrackedError {
    pub message: String,
    pub authentication: bool,
}

#[derive(Debug, Default)]
struct TrackerState {
    last_signature: Option<String>,
    /// Consecutive repeats of `last_signature` since it was first surfaced
    repeats: u32,
}

/// Deduplicates surfaced errors. Safe to share between tasks.
#[derive(Debug, Default)]
pub struct ErrorTracker {
    state: Mutex<TrackerState>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the error to surface, or `None` if it repeats the last one
    pub fn track(&self, err: &ClassifiedError) -> Option<TrackedError> {
        let signature = signature(err);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.last_signature.as_deref() == Some(signature.as_str()) {
            state.repeats = state.repeats.saturating_add(1);
            tracing::debug!("Suppressed repeated error ({} repeats)", state.repeats);
            return None;
        }

        state.last_signature = Some(signature);
        state.repeats = 0;
        drop(state);

        Some(decorate(err))
    }

    /// How many repeats of the current signature have been suppressed
    pub fn suppressed(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .repeats
    }

    /// Forget the last signature, e.g. after a fully successful cycle
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = TrackerState::default();
    }
}

/// Deduplication key: the normalized message text
fn signature(err: &ClassifiedError) -> String {
    err.to_string()
}

fn decorate(err: &ClassifiedError) -> TrackedError {
    match err {
        ClassifiedError::Authentication { message, hint, .. } => TrackedError {
            message: format!("{}: {}\n{}", AUTH_BANNER, hint, message),
            authentication: true,
        },
        other => TrackedError {
            message: other.to_string(),
            authentication: false,
        },
    }
}
