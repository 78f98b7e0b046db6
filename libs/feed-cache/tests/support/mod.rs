#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use feed_cache::{AuthorId, AvatarRef, FeedConfig, Post, PostCacheManager, StoredProfile};
use kv_store::{KvBackend, KvError, KvResult, MemoryBackend, Storage, StorageKey};
use tokio::sync::Notify;

pub const LOCAL_USER: &str = "local-user";

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap()
}

pub fn post(id: &str, author: &str, minute: Option<u32>, avatar: Option<AvatarRef>) -> Post {
    Post {
        id: id.to_string(),
        author_id: AuthorId::new(author),
        author: author.to_string(),
        content: format!("post {}", id),
        image: None,
        avatar,
        created_at: minute.map(at),
        likes: 0,
        comments: 0,
        views: None,
    }
}

pub fn ids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.id.clone()).collect()
}

pub async fn stored_posts(storage: &Storage) -> Vec<Post> {
    storage.load(&StorageKey::posts(), Vec::new()).await
}

pub fn manager_over(storage: &Storage) -> PostCacheManager {
    PostCacheManager::new(
        storage.clone(),
        Arc::new(StoredProfile::new(storage.clone())),
        FeedConfig::default(),
    )
}

/// Counts writes that reach the store
#[derive(Default)]
pub struct CountingBackend {
    inner: MemoryBackend,
    pub writes: AtomicUsize,
}

impl CountingBackend {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvBackend for CountingBackend {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> KvResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        self.inner.del(key).await
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        self.inner.exists(key).await
    }
}

/// Every operation fails
pub struct FailingBackend;

fn unavailable() -> KvError {
    KvError::Io(std::io::Error::other("storage unavailable"))
}

#[async_trait]
impl KvBackend for FailingBackend {
    async fn get(&self, _key: &str) -> KvResult<Option<String>> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: String) -> KvResult<()> {
        Err(unavailable())
    }

    async fn del(&self, _key: &str) -> KvResult<()> {
        Err(unavailable())
    }

    async fn exists(&self, _key: &str) -> KvResult<bool> {
        Err(unavailable())
    }
}

/// Holds the next read of the post list open until released. The value is
/// captured when the read starts, so writes made while it is held are not
/// visible to it.
#[derive(Default)]
pub struct GatedBackend {
    inner: MemoryBackend,
    armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedBackend {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl KvBackend for GatedBackend {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let value = self.inner.get(key).await;
        if key == StorageKey::posts() && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        value
    }

    async fn set(&self, key: &str, value: String) -> KvResult<()> {
        self.inner.set(key, value).await
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        self.inner.del(key).await
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        self.inner.exists(key).await
    }
}

/// Reads always work; writes fail while `fail_writes` is set
#[derive(Default)]
pub struct FlakyWriteBackend {
    inner: MemoryBackend,
    fail_writes: AtomicBool,
}

impl FlakyWriteBackend {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KvBackend for FlakyWriteBackend {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> KvResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.set(key, value).await
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.del(key).await
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        self.inner.exists(key).await
    }
}
