//! Domain models
//!
//! Entities carry plain `String` identifiers as read from storage.
//! Request input goes through the validated identifier types in [`ids`].

pub mod ids;
pub mod pull_request;
pub mod team;
pub mod validation;

pub use ids::{check_length, PrId, TeamName, UserId, MAX_IDENTIFIER_LEN};
pub use pull_request::{PrStatus, PullRequest, PullRequestShort, UserReviews};
pub use team::{Team, TeamMember, User};
pub use validation::ValidationError;
