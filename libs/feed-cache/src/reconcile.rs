//! Avatar denormalization
//!
//! The local user's avatar is an account property: every post they authored
//! shows the current profile picture. Other authors keep whatever avatar was
//! captured with the post; a missing one gets the placeholder.

use crate::model::{AuthorId, AvatarRef, Post};

/// Rewrite avatars in place and return how many posts changed
pub fn reconcile_avatars(
    posts: &mut [Post],
    local_user: &AuthorId,
    current: &AvatarRef,
    placeholder: &AvatarRef,
) -> usize {
    let mut changed = 0;
    for post in posts.iter_mut() {
        let wanted = if &post.author_id == local_user {
            current
        } else {
            match post.avatar {
                Some(_) => continue,
                None => placeholder,
            }
        };
        if post.avatar.as_ref() != Some(wanted) {
            post.avatar = Some(wanted.clone());
            changed += 1;
        }
    }
    changed
}
