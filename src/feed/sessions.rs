//! Keeps the open feeds of signed-in users.
//!
//! Every visit to the feed page opens a new feed with its own ID. The ID is
//! sent back with each request for more posts, so two tabs of the same user
//! scroll independently.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::{Error, UserID, feed::FeedLoader, post::PostStore};

/// Identifies one open feed, i.e. one visit to the feed page.
pub type FeedId = Uuid;

/// How many feeds one user may have open before the least recently used is
/// dropped.
pub const MAX_FEEDS_PER_USER: usize = 8;

/// Feeds that have not been scrolled for this long are dropped.
pub const FEED_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct OpenFeed<S> {
    owner: UserID,
    loader: FeedLoader<S>,
    last_used: Instant,
}

/// The open feeds of every signed-in user.
#[derive(Debug, Clone)]
pub struct FeedSessions<S> {
    feeds: Arc<Mutex<HashMap<FeedId, OpenFeed<S>>>>,
    store: S,
    page_size: usize,
    max_per_user: usize,
    idle_timeout: Duration,
}

impl<S: PostStore> FeedSessions<S> {
    /// Create an empty registry whose feeds read `page_size` posts at a time
    /// from `store`.
    pub fn new(store: S, page_size: usize) -> Self {
        Self::with_limits(store, page_size, MAX_FEEDS_PER_USER, FEED_IDLE_TIMEOUT)
    }

    /// Like [FeedSessions::new], but with custom eviction limits.
    ///
    /// `max_per_user` is raised to one if zero.
    pub fn with_limits(
        store: S,
        page_size: usize,
        max_per_user: usize,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            feeds: Arc::new(Mutex::new(HashMap::new())),
            store,
            page_size,
            max_per_user: max_per_user.max(1),
            idle_timeout,
        }
    }

    /// Open a new, empty feed for `user_id`.
    ///
    /// Idle feeds are dropped first. If the user is still at the limit of
    /// open feeds, their least recently used feed is dropped as well.
    ///
    /// # Errors
    ///
    /// Returns [Error::StateLockError] if a lock is poisoned.
    pub fn open(&self, user_id: UserID) -> Result<(FeedId, FeedLoader<S>), Error> {
        let mut feeds = self.lock()?;
        let now = Instant::now();

        let idle: Vec<FeedId> = feeds
            .iter()
            .filter(|(_, feed)| now.duration_since(feed.last_used) >= self.idle_timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in idle {
            tracing::debug!("Dropping idle feed {id}");
            close(&mut feeds, id)?;
        }

        loop {
            let mut owned: Vec<(&FeedId, &OpenFeed<S>)> = feeds
                .iter()
                .filter(|(_, feed)| feed.owner == user_id)
                .collect();

            if owned.len() < self.max_per_user {
                break;
            }

            owned.sort_by_key(|(_, feed)| feed.last_used);
            let oldest = *owned[0].0;
            tracing::debug!("User {user_id} has too many feeds open, dropping {oldest}");
            close(&mut feeds, oldest)?;
        }

        let id = Uuid::new_v4();
        let loader = FeedLoader::new(self.store.clone(), self.page_size);
        feeds.insert(
            id,
            OpenFeed {
                owner: user_id,
                loader: loader.clone(),
                last_used: now,
            },
        );
        tracing::debug!("Opened feed {id} for user {user_id}, {} open", feeds.len());

        Ok((id, loader))
    }

    /// The feed `feed_id` if it is still open and belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::StateLockError] if the registry lock is poisoned.
    pub fn get(&self, user_id: UserID, feed_id: FeedId) -> Result<Option<FeedLoader<S>>, Error> {
        let mut feeds = self.lock()?;

        match feeds.get_mut(&feed_id) {
            Some(feed) if feed.owner == user_id => {
                feed.last_used = Instant::now();
                Ok(Some(feed.loader.clone()))
            }
            Some(_) => {
                tracing::warn!("User {user_id} asked for feed {feed_id} owned by another user");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Drop every feed of `user_id`, e.g. when they log out.
    ///
    /// # Errors
    ///
    /// Returns [Error::StateLockError] if a lock is poisoned.
    pub fn remove_user(&self, user_id: UserID) -> Result<(), Error> {
        let mut feeds = self.lock()?;
        let owned: Vec<FeedId> = feeds
            .iter()
            .filter(|(_, feed)| feed.owner == user_id)
            .map(|(id, _)| *id)
            .collect();

        for id in owned {
            close(&mut feeds, id)?;
        }

        Ok(())
    }

    #[cfg(test)]
    fn open_count(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<FeedId, OpenFeed<S>>>, Error> {
        self.feeds.lock().map_err(|error| {
            tracing::error!("Could not acquire the feed registry lock: {error}");
            Error::StateLockError
        })
    }
}

/// Remove a feed and reset it so a fetch still in flight is discarded.
fn close<S: PostStore>(
    feeds: &mut HashMap<FeedId, OpenFeed<S>>,
    feed_id: FeedId,
) -> Result<(), Error> {
    match feeds.remove(&feed_id) {
        Some(feed) => feed.loader.reset(),
        None => Ok(()),
    }
}
