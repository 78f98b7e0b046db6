//! In-memory feed state
//!
//! Every mutation bumps `generation` and stamps the affected id in `touched`.
//! A fresh read of the store is tagged with the generation observed before it
//! started, which lets `merge_fresh` tell posts the read could not have seen
//! apart from posts that disappeared from the store.

use std::collections::{HashMap, HashSet};

use crate::model::{AvatarRef, Post};
use crate::sort::sort_in_place;

#[derive(Debug)]
pub(crate) struct FeedState {
    posts: Vec<Post>,
    current_avatar: AvatarRef,
    generation: u64,
    touched: HashMap<String, u64>,
    tombstones: HashSet<String>,
}

impl FeedState {
    pub(crate) fn new(current_avatar: AvatarRef) -> Self {
        Self {
            posts: Vec::new(),
            current_avatar,
            generation: 0,
            touched: HashMap::new(),
            tombstones: HashSet::new(),
        }
    }

    pub(crate) fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub(crate) fn posts_mut(&mut self) -> &mut [Post] {
        &mut self.posts
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn current_avatar(&self) -> &AvatarRef {
        &self.current_avatar
    }

    pub(crate) fn set_current_avatar(&mut self, avatar: AvatarRef) {
        self.current_avatar = avatar;
    }

    fn touch(&mut self, id: &str) {
        self.generation += 1;
        self.touched.insert(id.to_string(), self.generation);
    }

    /// Add a newly created post at the head, then re-sort in case the clock
    /// moved backwards relative to the current head.
    pub(crate) fn insert(&mut self, post: Post) {
        self.touch(&post.id);
        self.posts.insert(0, post);
        sort_in_place(&mut self.posts);
    }

    pub(crate) fn like(&mut self, id: &str) -> bool {
        let Some(post) = self.posts.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        post.likes = post.likes.saturating_add(1);
        self.touch(id);
        true
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != id);
        if self.posts.len() == before {
            return false;
        }
        self.touch(id);
        self.tombstones.insert(id.to_string());
        sort_in_place(&mut self.posts);
        true
    }

    /// Fold a fresh read of the store into memory.
    ///
    /// With no mutation since `read_generation` the read is adopted as is.
    /// Otherwise ids held in memory keep their in-memory version, ids only in
    /// the read are adopted unless deleted here, and ids only in memory survive
    /// when they were touched after the read started.
    pub(crate) fn merge_fresh(&mut self, fresh: Vec<Post>, read_generation: u64) {
        if self.generation == read_generation {
            self.posts = fresh;
            self.touched.clear();
            self.tombstones.clear();
            sort_in_place(&mut self.posts);
        } else {
            self.merge_by_id(fresh, Some(read_generation));
        }
    }

    /// Fold in a read taken while the store is missing a write. Memory is
    /// newer than anything the read holds, so every in-memory post survives.
    pub(crate) fn merge_stale(&mut self, fresh: Vec<Post>) {
        self.merge_by_id(fresh, None);
    }

    /// `touched_after: None` keeps every memory-only post
    fn merge_by_id(&mut self, fresh: Vec<Post>, touched_after: Option<u64>) {
        let fresh_ids: HashSet<String> = fresh.iter().map(|p| p.id.clone()).collect();
        let mut memory: HashMap<String, Post> = self
            .posts
            .drain(..)
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut merged = Vec::with_capacity(fresh.len() + memory.len());
        for post in fresh {
            if self.tombstones.contains(&post.id) {
                continue;
            }
            match memory.remove(&post.id) {
                Some(local) => merged.push(local),
                None => merged.push(post),
            }
        }
        for (id, post) in memory {
            let keep = match touched_after {
                None => true,
                Some(read_generation) => self
                    .touched
                    .get(&id)
                    .is_some_and(|generation| *generation > read_generation),
            };
            if keep && !fresh_ids.contains(&id) {
                merged.push(post);
            }
        }
        self.posts = merged;
        sort_in_place(&mut self.posts);
    }
}
