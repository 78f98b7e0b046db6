//! Chronological ordering of feed posts

use crate::model::Post;

/// Return a copy of `posts` ordered newest first.
///
/// Posts without a creation time sort as the Unix epoch. The sort is stable,
/// so posts with equal timestamps keep their relative input order and the
/// function is idempotent.
pub fn sort_posts_by_date(posts: &[Post]) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sort_in_place(&mut sorted);
    sorted
}

pub(crate) fn sort_in_place(posts: &mut [Post]) {
    posts.sort_by_key(|post| std::cmp::Reverse(post.effective_created_at()));
}
