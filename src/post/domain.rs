//! Core post domain types and the post store interface.

use std::future::Future;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{UserID, store::StoreErrorKind};

/// Database identifier for a post.
pub type PostId = i64;

/// A user mentioned in a post.
///
/// Tags are created when a user is picked from the suggestions and removed
/// as a whole, they are never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTag {
    /// A unique ID generated when the tag is added to the form.
    pub tag_id: String,
    /// The tagged user.
    pub uid: UserID,
    pub first_name: String,
    pub last_name: String,
}

impl UserTag {
    /// The tagged user's first and last name separated by a space.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// The URI of the post's photo.
    pub photo: String,
    /// A unique, URL-safe identifier derived from the title.
    pub slug: String,
    pub description: String,
    pub author_id: UserID,
    /// The tagged users in the order they were added.
    pub tagged_users: Vec<UserTag>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// The data needed to create a post.
///
/// The store assigns the ID and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub photo: String,
    pub slug: String,
    pub description: String,
    pub author_id: UserID,
    pub tagged_users: Vec<UserTag>,
}

/// What the store reports back after creating a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedPost {
    pub id: PostId,
    pub created_at: OffsetDateTime,
}

/// Persistent storage for posts ordered from newest to oldest.
pub trait PostStore: Clone + Send + Sync + 'static {
    /// Save a new post.
    fn create_post(
        &self,
        post: NewPost,
    ) -> impl Future<Output = Result<CreatedPost, StoreErrorKind>> + Send;

    /// Get up to `page_size` posts, newest first, that come strictly after
    /// the post `cursor`, or from the newest post if `cursor` is `None`.
    ///
    /// A page shorter than `page_size` means there are no older posts.
    fn query_posts(
        &self,
        cursor: Option<PostId>,
        page_size: usize,
    ) -> impl Future<Output = Result<Vec<Post>, StoreErrorKind>> + Send;
}
