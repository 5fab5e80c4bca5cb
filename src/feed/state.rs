//! The feed state machine.
//!
//! [FeedState::apply] is the only way the feed changes. It decides whether a
//! page should be fetched and merges the results, while the caller performs
//! the actual fetch.

use crate::post::{Post, PostId};

/// The number of posts requested per page.
pub const POSTS_PER_PAGE: usize = 10;

/// The message shown when a page could not be fetched.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch posts.";

/// Progress of the most recent fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    /// Nothing has been fetched since the last reset.
    #[default]
    Idle,
    /// The first page is being fetched.
    Loading,
    /// The last fetch succeeded.
    Succeeded,
    /// The last fetch failed.
    Failed,
}

/// Something that happened to the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAction {
    /// The user scrolled near the end of the list, or the feed was opened.
    LoadMoreRequested,
    /// A fetch started for `generation` returned `page`.
    PageLoaded { generation: u64, page: Vec<Post> },
    /// A fetch started for `generation` failed.
    PageFailed { generation: u64, message: String },
    /// The feed was opened again and should start from the newest post.
    Reset,
}

/// A page fetch the caller should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// Fetch posts older than this post, or the newest posts if `None`.
    pub cursor: Option<PostId>,
    pub page_size: usize,
    /// The generation to report the results under.
    pub generation: u64,
}

/// The posts loaded so far and the flags that control further loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    /// The loaded posts, newest first. Only ever appended to between resets.
    pub posts: Vec<Post>,
    /// The last post of the most recently fetched non-empty page.
    pub last_cursor: Option<PostId>,
    /// Whether the last page was full, i.e. older posts may exist.
    pub has_more: bool,
    /// Whether a page after the first is being fetched.
    pub loading_more: bool,
    pub status: FeedStatus,
    pub error_message: Option<String>,
    /// Incremented on every reset so that results of fetches started before
    /// the reset can be told apart.
    pub generation: u64,
    pub page_size: usize,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(POSTS_PER_PAGE)
    }
}

impl FeedState {
    /// Create an empty feed that fetches `page_size` posts at a time.
    ///
    /// A `page_size` of zero is raised to one, since an empty page would end
    /// the feed before it starts.
    pub fn new(page_size: usize) -> Self {
        Self {
            posts: Vec::new(),
            last_cursor: None,
            has_more: true,
            loading_more: false,
            status: FeedStatus::Idle,
            error_message: None,
            generation: 0,
            page_size: page_size.max(1),
        }
    }

    /// Whether a fetch is currently in flight.
    pub fn is_fetching(&self) -> bool {
        self.loading_more || self.status == FeedStatus::Loading
    }

    /// Update the feed in response to `action`.
    ///
    /// Returns the fetch to perform when the action starts one. The in-flight
    /// flags are set before returning, so a second request made before the
    /// fetch completes returns `None`.
    pub fn apply(&mut self, action: FeedAction) -> Option<FetchRequest> {
        match action {
            FeedAction::LoadMoreRequested => self.request_page(),
            FeedAction::PageLoaded { generation, page } => {
                if generation != self.generation {
                    tracing::debug!(
                        "Discarding page of {} posts from generation {generation}, current is {}",
                        page.len(),
                        self.generation
                    );
                    return None;
                }

                if let Some(last_post) = page.last() {
                    self.last_cursor = Some(last_post.id);
                }

                self.has_more = page.len() == self.page_size;
                self.posts.extend(page);
                self.loading_more = false;
                self.status = FeedStatus::Succeeded;
                self.error_message = None;

                None
            }
            FeedAction::PageFailed {
                generation,
                message,
            } => {
                if generation != self.generation {
                    tracing::debug!("Discarding failed fetch from generation {generation}");
                    return None;
                }

                self.status = FeedStatus::Failed;
                self.error_message = Some(message);
                self.loading_more = false;

                None
            }
            FeedAction::Reset => {
                self.posts.clear();
                self.last_cursor = None;
                self.has_more = true;
                self.loading_more = false;
                self.status = FeedStatus::Idle;
                self.error_message = None;
                self.generation += 1;

                None
            }
        }
    }

    fn request_page(&mut self) -> Option<FetchRequest> {
        if !self.has_more || self.is_fetching() {
            return None;
        }

        match self.last_cursor {
            None => self.status = FeedStatus::Loading,
            Some(_) => self.loading_more = true,
        }

        Some(FetchRequest {
            cursor: self.last_cursor,
            page_size: self.page_size,
            generation: self.generation,
        })
    }
}


#[cfg(test)]
mod feed_state_tests {
    use super::{
        FeedAction, FeedState, FeedStatus, FetchRequest, POSTS_PER_PAGE, test_posts::make_posts,
    };

    fn loaded(state: &FeedState, first_id: i64, count: usize) -> FeedAction {
        FeedAction::PageLoaded {
            generation: state.generation,
            page: make_posts(first_id, count),
        }
    }

    #[test]
    fn new_feed_starts_empty_with_more_to_load() {
        let state = FeedState::default();

        assert!(state.posts.is_empty());
        assert_eq!(state.last_cursor, None);
        assert!(state.has_more);
        assert!(!state.loading_more);
        assert_eq!(state.status, FeedStatus::Idle);
        assert_eq!(state.page_size, POSTS_PER_PAGE);
    }

    #[test]
    fn zero_page_size_fetches_one_post_at_a_time() {
        let mut state = FeedState::new(0);

        let request = state.apply(FeedAction::LoadMoreRequested);

        assert_eq!(request.map(|request| request.page_size), Some(1));
    }

    #[test]
    fn first_request_fetches_from_the_start() {
        let mut state = FeedState::default();

        let request = state.apply(FeedAction::LoadMoreRequested);

        assert_eq!(
            request,
            Some(FetchRequest {
                cursor: None,
                page_size: 10,
                generation: 0
            })
        );
        assert_eq!(state.status, FeedStatus::Loading);
        assert!(!state.loading_more);
    }

    #[test]
    fn second_request_while_fetching_is_suppressed() {
        let mut state = FeedState::default();
        state.apply(FeedAction::LoadMoreRequested);

        assert_eq!(state.apply(FeedAction::LoadMoreRequested), None);

        let page = loaded(&state, 100, 10);
        state.apply(page);
        assert!(state.apply(FeedAction::LoadMoreRequested).is_some());
        assert!(state.loading_more);
        assert_eq!(state.apply(FeedAction::LoadMoreRequested), None);
    }

    #[test]
    fn later_requests_start_after_the_last_post() {
        let mut state = FeedState::default();
        state.apply(FeedAction::LoadMoreRequested);
        let page = loaded(&state, 100, 10);
        state.apply(page);

        let request = state.apply(FeedAction::LoadMoreRequested);

        assert_eq!(request.map(|request| request.cursor), Some(Some(91)));
    }

    #[test]
    fn three_pages_of_ten_ten_four() {
        let mut state = FeedState::default();

        for (first_id, count) in [(100, 10), (90, 10), (80, 4)] {
            assert!(state.apply(FeedAction::LoadMoreRequested).is_some());
            let page = loaded(&state, first_id, count);
            state.apply(page);
        }

        assert_eq!(state.posts.len(), 24);
        assert!(!state.has_more);
        assert_eq!(state.last_cursor, Some(77));
        assert_eq!(state.apply(FeedAction::LoadMoreRequested), None);
    }

    #[test]
    fn posts_keep_server_order() {
        let mut state = FeedState::default();
        state.apply(FeedAction::LoadMoreRequested);
        let page = loaded(&state, 20, 10);
        state.apply(page);
        state.apply(FeedAction::LoadMoreRequested);
        let page = loaded(&state, 10, 10);
        state.apply(page);

        let ids: Vec<i64> = state.posts.iter().map(|post| post.id).collect();
        let want: Vec<i64> = (1..=20).rev().collect();
        assert_eq!(ids, want);
    }

    #[test]
    fn empty_page_keeps_cursor_and_stops_loading() {
        let mut state = FeedState::default();
        state.apply(FeedAction::LoadMoreRequested);
        let page = loaded(&state, 100, 10);
        state.apply(page);
        state.apply(FeedAction::LoadMoreRequested);
        let page = loaded(&state, 90, 0);
        state.apply(page);

        assert_eq!(state.last_cursor, Some(91));
        assert!(!state.has_more);
        assert!(!state.loading_more);
    }

    #[test]
    fn empty_store_has_no_cursor() {
        let mut state = FeedState::default();
        state.apply(FeedAction::LoadMoreRequested);
        let page = loaded(&state, 0, 0);
        state.apply(page);

        assert_eq!(state.last_cursor, None);
        assert!(!state.has_more);
        assert_eq!(state.status, FeedStatus::Succeeded);
    }

    #[test]
    fn failure_keeps_loaded_posts() {
        let mut state = FeedState::default();
        state.apply(FeedAction::LoadMoreRequested);
        let page = loaded(&state, 100, 10);
        state.apply(page);
        state.apply(FeedAction::LoadMoreRequested);

        state.apply(FeedAction::PageFailed {
            generation: state.generation,
            message: "Failed to fetch posts.".to_owned(),
        });

        assert_eq!(state.posts.len(), 10);
        assert_eq!(state.status, FeedStatus::Failed);
        assert_eq!(state.error_message.as_deref(), Some("Failed to fetch posts."));
        assert!(!state.loading_more);
        assert_eq!(
            state.apply(FeedAction::LoadMoreRequested).map(|request| request.cursor),
            Some(Some(91)),
            "want the user to be able to retry from the same cursor"
        );
    }

    #[test]
    fn reset_clears_posts_and_cursor() {
        let mut state = FeedState::default();
        state.apply(FeedAction::LoadMoreRequested);
        let page = loaded(&state, 100, 4);
        state.apply(page);

        state.apply(FeedAction::Reset);

        assert!(state.posts.is_empty());
        assert_eq!(state.last_cursor, None);
        assert!(state.has_more);
        assert_eq!(state.error_message, None);
        assert_eq!(state.generation, 1);
    }

    #[test]
    fn results_from_before_a_reset_are_discarded() {
        let mut state = FeedState::default();
        let stale = state.apply(FeedAction::LoadMoreRequested).unwrap();
        state.apply(FeedAction::Reset);
        let fresh = state.apply(FeedAction::LoadMoreRequested).unwrap();

        state.apply(FeedAction::PageLoaded {
            generation: stale.generation,
            page: make_posts(100, 10),
        });
        assert!(state.posts.is_empty());
        assert_eq!(state.status, FeedStatus::Loading);

        state.apply(FeedAction::PageLoaded {
            generation: fresh.generation,
            page: make_posts(50, 3),
        });
        assert_eq!(state.posts.len(), 3);
    }
}
