//! Local post cache for the campus feed
//!
//! - `PostCacheManager`: the feed screen's source of truth, persisted write-through
//! - Merge-by-id reconciliation of overlapping reads and mutations
//! - Avatar denormalization onto the local user's posts
//! - Stable newest-first ordering with missing timestamps sorted last

mod config;
mod error;
mod manager;
pub mod model;
mod profile;
mod reconcile;
mod sort;
mod state;
mod write_through;

pub use config::{avatar_setting, FeedConfig, DEFAULT_AVATAR_HANDLE, PLACEHOLDER_AVATAR_HANDLE};
pub use error::{FeedError, FeedResult};
pub use manager::PostCacheManager;
pub use model::{AuthorId, AvatarRef, LocalUser, Post};
pub use profile::{ProfileProvider, Role, StoredProfile, UserProfile};
pub use reconcile::reconcile_avatars;
pub use sort::sort_posts_by_date;
