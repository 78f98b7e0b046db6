//! Feed error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Neither text nor an image was supplied
    #[error("Post rejected: add some text or an image")]
    EmptyPost,

    /// The owning screen went away; no further state changes are accepted
    #[error("Feed is closed")]
    Closed,
}

pub type FeedResult<T> = Result<T, FeedError>;
