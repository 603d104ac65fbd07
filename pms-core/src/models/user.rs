use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access level of a dashboard user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar")]
pub enum Role {
    #[sqlx(rename = "admin")]
    Admin,
    #[default]
    #[sqlx(rename = "user")]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// User model representing an authorized account.
///
/// Stored in the user collection; authentication itself is delegated to the
/// identity provider, so no credential material is kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store key of the record
    pub doc_id: Uuid,

    /// User's email address, matched against the authenticated principal
    pub email: String,

    /// Display name
    pub username: String,

    pub role: Role,

    /// Avatar URL supplied by the identity provider
    pub photo_url: Option<String>,

    /// Timestamp when the user was created
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Invitation request (admin only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteUser {
    pub email: String,
}
