//! Profile access
//!
//! The profile record is owned by the profile screen; the feed only needs its
//! avatar. `StoredProfile` reads it from the same store the feed uses.

use kv_store::{Storage, StorageKey};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::DEFAULT_AVATAR_HANDLE;
use crate::model::AvatarRef;

/// Source of the signed-in user's current avatar
#[async_trait::async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Current avatar; falls back to a default rather than failing
    async fn load_avatar(&self) -> AvatarRef;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Professor,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "avatar_or_default")]
    pub avatar: AvatarRef,
    pub faculty: String,
    pub group: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
    pub about: String,
    pub role: Role,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: "1".to_string(),
            name: "Campus Student".to_string(),
            avatar: AvatarRef::local(DEFAULT_AVATAR_HANDLE),
            faculty: String::new(),
            group: String::new(),
            email: String::new(),
            phone: String::new(),
            birth_date: String::new(),
            about: String::new(),
            role: Role::Student,
        }
    }
}

fn avatar_or_default<'de, D>(deserializer: D) -> Result<AvatarRef, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(AvatarRef::from_value(&raw).unwrap_or_else(|| AvatarRef::local(DEFAULT_AVATAR_HANDLE)))
}

/// Profile record kept in the key-value store
#[derive(Clone)]
pub struct StoredProfile {
    storage: Storage,
    key: String,
    default_profile: UserProfile,
}

impl StoredProfile {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            key: StorageKey::user_profile(),
            default_profile: UserProfile::default(),
        }
    }

    pub fn with_default(mut self, profile: UserProfile) -> Self {
        self.default_profile = profile;
        self
    }

    /// Stored profile, or the default one when nothing usable is stored
    pub async fn load(&self) -> UserProfile {
        self.storage
            .load(&self.key, self.default_profile.clone())
            .await
    }

    /// First-run bootstrap: persist the default profile when none exists
    pub async fn ensure(&self) -> UserProfile {
        match self.storage.try_load::<UserProfile>(&self.key).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                let saved = self.storage.save(&self.key, &self.default_profile).await;
                info!(saved, "Profile initialized with default avatar");
                self.default_profile.clone()
            }
            Err(e) => {
                warn!(error = %e, "Profile unreadable, using default without overwriting");
                self.default_profile.clone()
            }
        }
    }

    /// Replace the avatar on the stored profile
    pub async fn set_avatar(&self, avatar: AvatarRef) -> bool {
        let mut profile = self.load().await;
        profile.avatar = avatar;
        self.storage.save(&self.key, &profile).await
    }
}

#[async_trait::async_trait]
impl ProfileProvider for StoredProfile {
    async fn load_avatar(&self) -> AvatarRef {
        self.load().await.avatar
    }
}
