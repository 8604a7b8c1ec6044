//! Users and teams.

use serde::{Deserialize, Serialize};

/// A person who can author or be assigned tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub user_id: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub cognito_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<u64>,
}

/// A team with denormalised owner and manager names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: u64,
    pub team_name: String,
    #[serde(default)]
    pub product_owner_username: Option<String>,
    #[serde(default)]
    pub project_manager_username: Option<String>,
}

/// Find a user by id in a directory listing.
pub fn find_user(users: &[User], user_id: u64) -> Option<&User> {
    users.iter().find(|u| u.user_id == Some(user_id))
}
