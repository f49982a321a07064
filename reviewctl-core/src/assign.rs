//! Reviewer assignment engine
//!
//! Pure selection logic over a candidate pool supplied by the caller:
//! - Initial assignment picks up to [`MAX_REVIEWERS`] distinct teammates
//! - Reassignment picks exactly one replacement, or fails with [`NoCandidate`]
//!
//! Randomness comes from an injected [`RandomSource`] so tests can pin
//! the draws. Every draw is uniform over the eligible set at call time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::User;

/// Maximum number of reviewers on a pull request
pub const MAX_REVIEWERS: usize = 2;

/// No eligible user is left to draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no eligible candidate")]
pub struct NoCandidate;

/// Thread-safe source of uniform indices.
pub trait RandomSource: Send + Sync {
    /// Return an index uniformly distributed in `0..upper`.
    ///
    /// Callers guarantee `upper > 0`.
    fn below(&self, upper: usize) -> usize;
}

/// `StdRng` seeded once from the system clock, shared behind a mutex.
pub struct ClockSeededRng {
    rng: Mutex<StdRng>,
}

impl ClockSeededRng {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(nanos)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for ClockSeededRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ClockSeededRng {
    fn below(&self, upper: usize) -> usize {
        // A panic while holding the lock cannot leave the RNG in a bad state
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..upper)
    }
}

/// Picks reviewers from candidate pools.
#[derive(Clone)]
pub struct AssignmentEngine {
    source: Arc<dyn RandomSource>,
}

impl AssignmentEngine {
    pub fn new(source: impl RandomSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Engine backed by [`ClockSeededRng`].
    pub fn from_clock() -> Self {
        Self::new(ClockSeededRng::new())
    }

    /// Choose reviewers for a new pull request.
    ///
    /// Eligible: active members of `candidates` other than the author.
    /// Returns `min(eligible, MAX_REVIEWERS)` distinct user IDs; an empty
    /// result is valid.
    pub fn pick_initial(&self, author_id: &str, candidates: &[User]) -> Vec<String> {
        let mut pool = eligible(candidates, &[author_id]);
        let mut picked = Vec::with_capacity(MAX_REVIEWERS);

        while picked.len() < MAX_REVIEWERS {
            match self.draw(&mut pool) {
                Some(id) => picked.push(id),
                None => break,
            }
        }

        tracing::debug!(
            author = author_id,
            eligible = picked.len() + pool.len(),
            picked = ?picked,
            "initial reviewers selected"
        );
        picked
    }

    /// Choose one replacement for `departing` on a pull request by
    /// `author_id` whose current reviewers are `current`.
    ///
    /// Eligible: active members of `candidates` other than the author, the
    /// departing reviewer and any current reviewer.
    pub fn pick_replacement(
        &self,
        author_id: &str,
        departing: &str,
        current: &[String],
        candidates: &[User],
    ) -> Result<String, NoCandidate> {
        let exclude: Vec<&str> = [author_id, departing]
            .into_iter()
            .chain(current.iter().map(String::as_str))
            .collect();
        let replacement = self.pick_excluding(&exclude, candidates)?;
        tracing::debug!(departing, replacement = %replacement, "replacement reviewer selected");
        Ok(replacement)
    }

    /// Choose one active candidate whose ID is not in `exclude`.
    fn pick_excluding(&self, exclude: &[&str], candidates: &[User]) -> Result<String, NoCandidate> {
        let mut pool = eligible(candidates, exclude);
        self.draw(&mut pool).ok_or(NoCandidate)
    }

    /// Remove and return one uniformly chosen entry.
    fn draw(&self, pool: &mut Vec<&User>) -> Option<String> {
        if pool.is_empty() {
            return None;
        }
        let idx = self.source.below(pool.len());
        Some(pool.swap_remove(idx).user_id.clone())
    }
}

/// Active, non-excluded candidates with duplicate IDs collapsed.
fn eligible<'a>(candidates: &'a [User], exclude: &[&str]) -> Vec<&'a User> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|u| u.is_active && !exclude.contains(&u.user_id.as_str()))
        .filter(|u| seen.insert(u.user_id.as_str()))
        .collect()
}
