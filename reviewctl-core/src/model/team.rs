//! Teams and users

use serde::{Deserialize, Serialize};

/// A user as listed inside a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// A team and its current members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

/// A user with its team membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl Team {
    /// Expand members into users belonging to this team.
    pub fn users(&self) -> impl Iterator<Item = User> + '_ {
        self.members.iter().map(|m| User {
            user_id: m.user_id.clone(),
            username: m.username.clone(),
            team_name: self.team_name.clone(),
            is_active: m.is_active,
        })
    }
}

impl From<User> for TeamMember {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            username: u.username,
            is_active: u.is_active,
        }
    }
}
