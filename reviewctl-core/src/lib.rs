//! reviewctl-core: domain model and reviewer assignment
//!
//! Holds the types shared by the server and CLI crates:
//! - Teams, users and pull requests as they are stored and serialized
//! - Validated identifiers for request input
//! - The assignment engine that picks reviewers from a candidate pool

pub mod assign;
pub mod model;

pub use assign::{AssignmentEngine, ClockSeededRng, NoCandidate, RandomSource, MAX_REVIEWERS};
pub use model::{
    PrId, PrStatus, PullRequest, PullRequestShort, Team, TeamMember, TeamName, User, UserId,
    UserReviews, ValidationError,
};
