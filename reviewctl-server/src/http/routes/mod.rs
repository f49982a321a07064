//! Route handlers organized by resource

pub mod health;
pub mod pull_requests;
pub mod teams;
pub mod users;
