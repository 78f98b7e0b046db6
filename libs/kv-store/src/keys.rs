//! Storage key schema
//!
//! Every component addresses the store through these builders.
//! Key format: v{VERSION}:{entity}:{name}

/// Storage schema version - increment when a persisted shape changes incompatibly
pub const STORAGE_VERSION: u32 = 1;

/// Storage key builder
pub struct StorageKey;

impl StorageKey {
    /// Locally cached feed posts
    /// Format: v1:posts:feed
    pub fn posts() -> String {
        format!("v{}:posts:feed", STORAGE_VERSION)
    }

    /// Signed-in user's profile record
    /// Format: v1:user:profile
    pub fn user_profile() -> String {
        format!("v{}:user:profile", STORAGE_VERSION)
    }

    /// Extract entity type from key
    pub fn entity_type(key: &str) -> Option<&str> {
        // Format: v{N}:{entity}:...
        let mut parts = key.split(':');
        match (parts.next(), parts.next()) {
            (Some(_), Some(entity)) => Some(entity),
            _ => None,
        }
    }
}
