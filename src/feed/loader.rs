//! Drives the feed state machine against a post store.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    Error,
    feed::state::{FETCH_FAILED_MESSAGE, FeedAction, FeedState, FetchRequest},
    post::{Post, PostStore},
};

/// The result of asking the feed for more posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No fetch was made, either because one is already in flight or because
    /// there are no more posts.
    Suppressed,
    /// A page was fetched and appended to the feed.
    Loaded {
        /// The posts that were just appended.
        page: Vec<Post>,
        /// Whether older posts may still exist.
        has_more: bool,
    },
    /// The fetch failed. Posts loaded earlier are kept.
    Failed { message: String },
    /// The feed was reset while the fetch was in flight, so the results were
    /// thrown away.
    Discarded,
}

/// A feed owned by one viewer.
///
/// Cloning the loader gives another handle to the same feed. The state lock
/// is never held while waiting on the store, and the in-flight flags are set
/// before the fetch starts, so overlapping calls to [FeedLoader::load_more]
/// issue at most one fetch.
#[derive(Debug, Clone)]
pub struct FeedLoader<S> {
    state: Arc<Mutex<FeedState>>,
    store: S,
}

impl<S: PostStore> FeedLoader<S> {
    /// Create an empty feed that reads `page_size` posts at a time from `store`.
    pub fn new(store: S, page_size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState::new(page_size))),
            store,
        }
    }

    /// Fetch the next page if the feed has more posts and no fetch is in
    /// flight.
    ///
    /// # Errors
    ///
    /// Returns [Error::StateLockError] if the feed state lock is poisoned.
    /// Store failures are not errors, they are reported as
    /// [LoadOutcome::Failed].
    pub async fn load_more(&self) -> Result<LoadOutcome, Error> {
        let request = self.dispatch(FeedAction::LoadMoreRequested)?;

        let Some(FetchRequest {
            cursor,
            page_size,
            generation,
        }) = request
        else {
            tracing::debug!("Load more suppressed");
            return Ok(LoadOutcome::Suppressed);
        };

        tracing::debug!("Fetching {page_size} posts after {cursor:?}");

        match self.store.query_posts(cursor, page_size).await {
            Ok(page) => {
                let mut state = self.lock()?;

                if state.generation != generation {
                    state.apply(FeedAction::PageLoaded { generation, page });
                    return Ok(LoadOutcome::Discarded);
                }

                state.apply(FeedAction::PageLoaded {
                    generation,
                    page: page.clone(),
                });

                Ok(LoadOutcome::Loaded {
                    page,
                    has_more: state.has_more,
                })
            }
            Err(error) => {
                tracing::error!("Could not fetch posts after {cursor:?}: {error:?}");

                let mut state = self.lock()?;

                if state.generation != generation {
                    return Ok(LoadOutcome::Discarded);
                }

                let message = FETCH_FAILED_MESSAGE.to_owned();
                state.apply(FeedAction::PageFailed {
                    generation,
                    message: message.clone(),
                });

                Ok(LoadOutcome::Failed { message })
            }
        }
    }

    /// Clear the feed so the next load starts from the newest post.
    ///
    /// # Errors
    ///
    /// Returns [Error::StateLockError] if the feed state lock is poisoned.
    pub fn reset(&self) -> Result<(), Error> {
        self.dispatch(FeedAction::Reset).map(|_| ())
    }

    /// A copy of the current feed state.
    ///
    /// # Errors
    ///
    /// Returns [Error::StateLockError] if the feed state lock is poisoned.
    pub fn snapshot(&self) -> Result<FeedState, Error> {
        self.lock().map(|state| state.clone())
    }

    fn dispatch(&self, action: FeedAction) -> Result<Option<FetchRequest>, Error> {
        Ok(self.lock()?.apply(action))
    }

    fn lock(&self) -> Result<MutexGuard<'_, FeedState>, Error> {
        self.state.lock().map_err(|error| {
            tracing::error!("Could not acquire the feed state lock: {error}");
            Error::StateLockError
        })
    }
}

#[cfg(test)]
pub(crate) mod fake_post_store {
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use time::OffsetDateTime;
    use tokio::sync::Notify;

    use crate::{
        post::{CreatedPost, NewPost, Post, PostId, PostStore},
        store::StoreErrorKind,
    };

    /// A post store that returns canned pages and counts queries.
    ///
    /// When `gate` is set, every query waits for a notification before
    /// returning so tests can overlap calls.
    #[derive(Clone, Default)]
    pub(crate) struct FakePostStore {
        pub(crate) pages: Arc<Mutex<VecDeque<Result<Vec<Post>, StoreErrorKind>>>>,
        pub(crate) cursors: Arc<Mutex<Vec<Option<PostId>>>>,
        pub(crate) query_count: Arc<AtomicUsize>,
        pub(crate) created: Arc<Mutex<Vec<NewPost>>>,
        pub(crate) create_result: Option<StoreErrorKind>,
        pub(crate) gate: Option<Arc<Notify>>,
    }

    impl FakePostStore {
        pub(crate) fn with_pages(pages: Vec<Result<Vec<Post>, StoreErrorKind>>) -> Self {
            Self {
                pages: Arc::new(Mutex::new(pages.into())),
                ..Default::default()
            }
        }

        pub(crate) fn queries(&self) -> usize {
            self.query_count.load(Ordering::SeqCst)
        }
    }

    impl PostStore for FakePostStore {
        async fn create_post(&self, post: NewPost) -> Result<CreatedPost, StoreErrorKind> {
            if let Some(error) = self.create_result {
                return Err(error);
            }

            let mut created = self.created.lock().unwrap();
            created.push(post);

            Ok(CreatedPost {
                id: created.len() as PostId,
                created_at: OffsetDateTime::now_utc(),
            })
        }

        async fn query_posts(
            &self,
            cursor: Option<PostId>,
            _page_size: usize,
        ) -> Result<Vec<Post>, StoreErrorKind> {
            self.query_count.fetch_add(1, Ordering::SeqCst);
            self.cursors.lock().unwrap().push(cursor);

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}
