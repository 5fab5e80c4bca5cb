//! The feed of posts, read one page at a time as the user scrolls.

mod loader;
mod page;
mod sessions;
mod state;

pub use loader::{FeedLoader, LoadOutcome};
pub use page::{FeedPageState, get_feed_page, get_more_posts};
pub use sessions::{FeedId, FeedSessions};
pub use state::{
    FETCH_FAILED_MESSAGE, FeedAction, FeedState, FeedStatus, FetchRequest, POSTS_PER_PAGE,
};

#[cfg(test)]
pub(crate) use loader::fake_post_store;
#[cfg(test)]
pub(crate) use state::test_posts;
