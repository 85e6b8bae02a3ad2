use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as they see themselves. The password hash never leaves the db crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// What anyone, signed in or not, may see about a user. No email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub username: String,
    pub like_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub messages: usize,
    pub followers: usize,
    pub following: usize,
    pub likes: usize,
}
