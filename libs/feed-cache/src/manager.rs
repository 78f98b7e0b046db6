//! Post cache manager
//!
//! Owns the feed shown on the posts screen: the sorted in-memory list, its
//! write-through copy in the key-value store, and the local user's avatar
//! denormalized onto their own posts.
//!
//! Load paths (mount, pull-to-refresh, avatar propagation) may overlap with
//! user mutations. Mutations change memory synchronously and stage the new
//! snapshot before any I/O; reads are folded back in with
//! [`FeedState::merge_fresh`] so a slow read never clobbers newer posts.
//! After a failed write the store is behind memory; reads are then merged
//! without dropping anything and the in-memory list is written again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use kv_store::Storage;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::model::{AvatarRef, Post};
use crate::profile::ProfileProvider;
use crate::reconcile::reconcile_avatars;
use crate::state::FeedState;
use crate::write_through::WriteThrough;

/// One read of the stored feed
struct FreshRead {
    /// Mutation generation observed before the read started
    generation: u64,
    /// Whether the last write landed; a stale store never replaces memory
    durable: bool,
    /// `None` when the read failed
    posts: Option<Vec<Post>>,
}

impl FreshRead {
    /// Fold the read into `state` and hand back the list as stored
    fn apply(self, state: &mut FeedState) -> Option<Vec<Post>> {
        let posts = self.posts?;
        if self.durable {
            state.merge_fresh(posts.clone(), self.generation);
        } else {
            state.merge_stale(posts.clone());
        }
        Some(posts)
    }
}

/// Shared handle to the feed; clones refer to the same feed
#[derive(Clone)]
pub struct PostCacheManager {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Storage,
    profile: Arc<dyn ProfileProvider>,
    config: FeedConfig,
    state: Mutex<FeedState>,
    writer: WriteThrough,
    published: watch::Sender<Vec<Post>>,
    alive: AtomicBool,
    reconciliation: Mutex<Option<JoinHandle<()>>>,
}

impl PostCacheManager {
    pub fn new(storage: Storage, profile: Arc<dyn ProfileProvider>, config: FeedConfig) -> Self {
        let (published, _) = watch::channel(Vec::new());
        let writer = WriteThrough::new(storage.clone(), config.posts_key.clone());
        let state = FeedState::new(config.default_avatar.clone());

        Self {
            inner: Arc::new(Inner {
                storage,
                profile,
                config,
                state: Mutex::new(state),
                writer,
                published,
                alive: AtomicBool::new(true),
                reconciliation: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    /// Snapshot of the current sorted feed
    pub fn posts(&self) -> Vec<Post> {
        self.inner.state.lock().posts().to_vec()
    }

    /// Receiver that observes every published feed
    pub fn subscribe(&self) -> watch::Receiver<Vec<Post>> {
        self.inner.published.subscribe()
    }

    /// Avatar stamped onto posts composed right now
    pub fn current_avatar(&self) -> AvatarRef {
        self.inner.state.lock().current_avatar().clone()
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::Acquire)
    }

    /// Detach from the screen. Reads still in flight are discarded and no
    /// further state is published.
    pub fn shutdown(&self) {
        if self.inner.alive.swap(false, Ordering::AcqRel) {
            info!("Feed detached");
        }
    }

    /// Load the cached feed and publish it, then reconcile avatars with the
    /// profile on a background task (see [`settle`](Self::settle)).
    pub async fn initialize(&self) -> Vec<Post> {
        let posts = self.reload().await;
        info!(posts = posts.len(), "Feed loaded");
        self.spawn_reconciliation();
        posts
    }

    /// Wait for the background reconciliation started by `initialize`
    pub async fn settle(&self) {
        let handle = self.inner.reconciliation.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Avatar reconciliation task failed");
            }
        }
    }

    /// Re-read profile and posts, re-apply the avatar, and republish
    pub async fn refresh(&self) -> Vec<Post> {
        self.reconcile_with_profile().await;
        let posts = self.reload().await;
        debug!(posts = posts.len(), "Feed refreshed");
        posts
    }

    /// Compose a post as the local user
    pub async fn create_post(&self, content: &str, image: Option<String>) -> FeedResult<Post> {
        let image = image
            .map(|uri| uri.trim().to_string())
            .filter(|uri| !uri.is_empty());
        if content.trim().is_empty() && image.is_none() {
            debug!("Rejected empty post");
            return Err(FeedError::EmptyPost);
        }

        let post = {
            let mut state = self.inner.state.lock();
            if !self.is_alive() {
                return Err(FeedError::Closed);
            }
            let post = Post::compose(
                &self.inner.config.local_user,
                content,
                image,
                state.current_avatar().clone(),
                Utc::now(),
            );
            state.insert(post.clone());
            self.commit(&state);
            post
        };

        info!(post_id = %post.id, has_image = post.image.is_some(), "Post created");
        self.inner.writer.drain().await;
        Ok(post)
    }

    /// Add one like; unknown ids are ignored
    pub async fn like_post(&self, id: &str) -> bool {
        let liked = {
            let mut state = self.inner.state.lock();
            let liked = self.is_alive() && state.like(id);
            if liked {
                self.commit(&state);
            }
            liked
        };

        if liked {
            self.inner.writer.drain().await;
        } else {
            debug!(post_id = %id, "Like ignored");
        }
        liked
    }

    /// Remove a post; the caller has already confirmed. Unknown ids are ignored.
    pub async fn delete_post(&self, id: &str) -> bool {
        let removed = {
            let mut state = self.inner.state.lock();
            let removed = self.is_alive() && state.remove(id);
            if removed {
                self.commit(&state);
            }
            removed
        };

        if removed {
            info!(post_id = %id, "Post deleted");
            self.inner.writer.drain().await;
        } else {
            debug!(post_id = %id, "Delete ignored");
        }
        removed
    }

    /// Make `current` the local user's avatar on every cached post they wrote
    /// and fill missing avatars on other posts with the placeholder.
    pub async fn reconcile_avatars(&self, current: AvatarRef) -> Vec<Post> {
        {
            let mut state = self.inner.state.lock();
            if !self.is_alive() {
                return state.posts().to_vec();
            }
            state.set_current_avatar(current.clone());
        }

        let read = self.read_fresh().await;

        let (snapshot, changed) = {
            let mut state = self.inner.state.lock();
            if !self.is_alive() {
                return state.posts().to_vec();
            }
            read.apply(&mut state);
            let config = &self.inner.config;
            let changed = reconcile_avatars(
                state.posts_mut(),
                &config.local_user.id,
                &current,
                &config.placeholder_avatar,
            );
            self.commit(&state);
            (state.posts().to_vec(), changed)
        };

        debug!(changed, avatar = %current, "Avatars reconciled");
        self.inner.writer.drain().await;
        snapshot
    }

    async fn reconcile_with_profile(&self) -> Vec<Post> {
        let avatar = self.inner.profile.load_avatar().await;
        self.reconcile_avatars(avatar).await
    }

    fn spawn_reconciliation(&self) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            this.reconcile_with_profile().await;
        });
        // A superseded pass keeps running detached; its merge is still safe.
        *self.inner.reconciliation.lock() = Some(handle);
    }

    /// Read the stored feed and fold it into memory
    async fn reload(&self) -> Vec<Post> {
        if !self.is_alive() {
            return self.posts();
        }

        let read = self.read_fresh().await;

        let (snapshot, persist) = {
            let mut state = self.inner.state.lock();
            if !self.is_alive() {
                return state.posts().to_vec();
            }
            // a stale store gets the in-memory list again as a retry
            let persist = match read.apply(&mut state) {
                Some(stored) => state.posts() != stored.as_slice(),
                None => false,
            };
            if persist {
                self.commit(&state);
            } else {
                self.publish(state.posts().to_vec());
            }
            (state.posts().to_vec(), persist)
        };

        if persist {
            self.inner.writer.drain().await;
        }
        snapshot
    }

    /// Capture the generation, flush staged writes, then read the store
    async fn read_fresh(&self) -> FreshRead {
        let generation = self.inner.state.lock().generation();
        let durable = self.inner.writer.flush().await;

        let key = &self.inner.config.posts_key;
        let posts = match self.inner.storage.try_load::<Vec<Post>>(key).await {
            Ok(posts) => Some(posts.unwrap_or_default()),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached feed unreadable, keeping in-memory feed");
                None
            }
        };
        if !durable && posts.is_some() {
            debug!(key = %key, "Store is behind memory, merging without dropping unsaved posts");
        }

        FreshRead {
            generation,
            durable,
            posts,
        }
    }

    /// Stage the current list for persistence and publish it
    fn commit(&self, state: &FeedState) {
        let snapshot = state.posts().to_vec();
        self.inner.writer.stage(snapshot.clone());
        self.publish(snapshot);
    }

    fn publish(&self, posts: Vec<Post>) {
        if self.is_alive() {
            self.inner.published.send_replace(posts);
        }
    }
}
