//! Profile model (application identity layered on an auth identity)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a profile in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular member
    #[default]
    User,
    /// Administrator
    Admin,
    /// Moderator
    Moderator,
}

impl UserRole {
    /// Get role as string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
        }
    }
}

/// A user profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Same id as the authentication identity
    pub id: Uuid,
    /// Unique username
    pub username: String,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated
    pub updated_at: DateTime<Utc>,
    /// Number of completed exchanges
    #[serde(default)]
    pub total_exchanges: Option<i32>,
    /// Average rating (1-5)
    #[serde(default)]
    pub rating: Option<f64>,
    /// Short biography
    #[serde(default)]
    pub bio: Option<String>,
    /// Preferred genres
    #[serde(default)]
    pub preferences: Option<Vec<String>>,
    /// Role in the system
    #[serde(default)]
    pub role: Option<UserRole>,
    /// Whether e-mail notifications are wanted
    #[serde(default)]
    pub email_notifications: Option<bool>,
    /// Last activity timestamp
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

impl Profile {
    /// Create a fresh profile for an identity
    pub fn new(id: Uuid, username: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: username.to_string(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
            total_exchanges: None,
            rating: None,
            bio: None,
            preferences: None,
            role: None,
            email_notifications: None,
            last_active: None,
        }
    }

    /// "Member since" label for the profile view
    pub fn member_since(&self) -> String {
        self.created_at.format("%b %d, %Y").to_string()
    }
}

/// Row inserted right after sign-up
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    /// Auth identity id
    pub id: Uuid,
    /// Chosen username
    pub username: String,
}

/// Partial profile update (only set fields are sent)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// Apply this update to a profile in place
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(username) = &self.username {
            profile.username.clone_from(username);
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = if avatar_url.is_empty() {
                None
            } else {
                Some(avatar_url.clone())
            };
        }
        if let Some(bio) = &self.bio {
            profile.bio = Some(bio.clone());
        }
        profile.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_with_missing_optionals() {
        let json = r#"{
            "id": "5f1d7a36-3c55-4b55-9a6e-0d2b7f0f6c11",
            "username": "reader",
            "created_at": "2024-03-01T10:00:00+00:00",
            "updated_at": "2024-03-01T10:00:00+00:00"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.username, "reader");
        assert!(profile.avatar_url.is_none());
        assert!(profile.role.is_none());
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = ProfileUpdate {
            username: Some("new-name".to_string()),
            ..ProfileUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "username": "new-name" }));
    }

    #[test]
    fn test_update_clears_empty_avatar() {
        let mut profile = Profile::new(Uuid::new_v4(), "reader");
        profile.avatar_url = Some("https://example.com/a.png".to_string());
        ProfileUpdate {
            avatar_url: Some(String::new()),
            ..ProfileUpdate::default()
        }
        .apply_to(&mut profile);
        assert!(profile.avatar_url.is_none());
    }
}
