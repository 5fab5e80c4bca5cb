//! Posts, their slugs and tagged users, and the pages for writing them.

mod create;
mod db;
mod domain;
mod slug;
mod tagging;

pub use create::{
    CREATE_POST_FAILED_MESSAGE, CreatePostState, create_post_endpoint, get_new_post_page,
    submit_post,
};
pub use db::{
    SqlitePostStore, count_posts, create_post_table, get_post, get_posts_page, insert_post,
};
pub use domain::{CreatedPost, NewPost, Post, PostId, PostStore, UserTag};
pub use slug::{derive_slug, generate_slug, slugify};
pub use tagging::{
    TagList, TagOutcome, TaggingState, edit_tags_endpoint, get_tag_suggestions, suggest_users,
};

#[cfg(test)]
pub(crate) use db::test_db;
