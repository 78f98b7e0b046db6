//! Feed configuration

use kv_store::StorageKey;

use crate::model::{AvatarRef, LocalUser};

/// Bundled avatar shown until the user picks one
pub const DEFAULT_AVATAR_HANDLE: &str = "avatar-default";
/// Bundled avatar for third-party posts that arrive without one
pub const PLACEHOLDER_AVATAR_HANDLE: &str = "avatar-placeholder";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Identity that owns locally composed posts
    pub local_user: LocalUser,
    /// Avatar used for new posts before the profile has been read
    pub default_avatar: AvatarRef,
    /// Avatar given to other authors' posts that have none
    pub placeholder_avatar: AvatarRef,
    /// Storage key of the cached post list
    pub posts_key: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            local_user: LocalUser::new("local-user", "Me"),
            default_avatar: AvatarRef::local(DEFAULT_AVATAR_HANDLE),
            placeholder_avatar: AvatarRef::local(PLACEHOLDER_AVATAR_HANDLE),
            posts_key: StorageKey::posts(),
        }
    }
}

impl FeedConfig {
    /// Load feed configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let local_user = LocalUser::new(
            std::env::var("FEED_LOCAL_USER_ID")
                .unwrap_or_else(|_| defaults.local_user.id.to_string()),
            std::env::var("FEED_LOCAL_DISPLAY_NAME")
                .unwrap_or_else(|_| defaults.local_user.display_name.clone()),
        );

        Self {
            local_user,
            default_avatar: std::env::var("FEED_DEFAULT_AVATAR")
                .ok()
                .and_then(|v| avatar_setting(&v))
                .unwrap_or(defaults.default_avatar),
            placeholder_avatar: std::env::var("FEED_PLACEHOLDER_AVATAR")
                .ok()
                .and_then(|v| avatar_setting(&v))
                .unwrap_or(defaults.placeholder_avatar),
            posts_key: defaults.posts_key,
        }
    }
}

/// `scheme://…` values are image URIs, anything else names a bundled asset
pub fn avatar_setting(value: &str) -> Option<AvatarRef> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else if value.contains("://") {
        Some(AvatarRef::remote(value))
    } else {
        Some(AvatarRef::local(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_setting() {
        assert_eq!(
            avatar_setting("https://cdn/me.png"),
            Some(AvatarRef::remote("https://cdn/me.png"))
        );
        assert_eq!(
            avatar_setting(" avatar-default "),
            Some(AvatarRef::local("avatar-default"))
        );
        assert_eq!(avatar_setting("  "), None);
    }

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.posts_key, "v1:posts:feed");
        assert_eq!(config.local_user.id.as_str(), "local-user");
        assert_ne!(config.default_avatar, config.placeholder_avatar);
    }
}
