//! The feed page and the endpoint that appends the next page of posts.
//!
//! The feed ends with a sentinel element that htmx fetches from
//! [endpoints::MORE_POSTS_API] when it scrolls into view. The response
//! replaces the sentinel with the new posts followed by a new sentinel, so
//! posts already on the page are never re-rendered.
//!
//! Each visit to the feed page opens its own feed, and the sentinel carries
//! that feed's ID in its URL.

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::{
    OffsetDateTime, UtcOffset,
    format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{
    AppState, Error, UserID, endpoints,
    feed::{FeedId, FeedSessions, FeedState, FeedStatus, LoadOutcome},
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TAG_BADGE_STYLE,
        base, loading_spinner,
    },
    navigation::NavBar,
    post::{Post, PostStore, SqlitePostStore},
    timezone::get_local_offset,
};

const POST_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day] [month repr:short] [year], [hour]:[minute]");

/// The state needed for the feed.
#[derive(Debug, Clone)]
pub struct FeedPageState<S = SqlitePostStore> {
    pub feed_sessions: FeedSessions<S>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for FeedPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            feed_sessions: state.feed_sessions.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display a newly opened feed starting from the newest post.
pub async fn get_feed_page<S: PostStore>(
    State(state): State<FeedPageState<S>>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let (feed_id, feed) = match state.feed_sessions.open(user_id) {
        Ok(opened) => opened,
        Err(error) => return error.into_response(),
    };

    if let Err(error) = feed.load_more().await {
        return error.into_response();
    }

    let snapshot = match feed.snapshot() {
        Ok(snapshot) => snapshot,
        Err(error) => return error.into_response(),
    };

    let nav_bar = NavBar::new(endpoints::FEED_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div id="feed" class="w-full max-w-xl space-y-6"
            {
                @for post in &snapshot.posts {
                    (post_card(post, local_offset))
                }

                (feed_tail(&snapshot, feed_id))
            }
        }
    };

    base("Feed", &content).into_response()
}

/// The query string of [get_more_posts].
#[derive(Debug, Deserialize)]
pub struct MorePostsQuery {
    feed: Option<String>,
}

/// Fetch the next page of the feed named in the query string.
///
/// Responds with the new posts and a sentinel for the page after, or with a
/// message and a retry button if the fetch failed. When no fetch was made,
/// because one is in flight, the feed has ended or the feed was closed, the
/// response is `204 No Content` so htmx leaves the page alone. A feed that
/// is not open, e.g. after a restart, is replaced with a link to reload.
pub async fn get_more_posts<S: PostStore>(
    State(state): State<FeedPageState<S>>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MorePostsQuery>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let Some(feed_id) = query
        .feed
        .as_deref()
        .and_then(|feed| FeedId::parse_str(feed).ok())
    else {
        tracing::warn!("Request for more posts without a valid feed ID: {query:?}");
        return feed_expired().into_response();
    };

    let feed = match state.feed_sessions.get(user_id, feed_id) {
        Ok(Some(feed)) => feed,
        Ok(None) => {
            tracing::debug!("Feed {feed_id} is not open");
            return feed_expired().into_response();
        }
        Err(error) => return error.into_alert_response(),
    };
    let outcome = feed.load_more().await;

    match outcome {
        Ok(LoadOutcome::Loaded { page, has_more }) => html! {
            @for post in &page {
                (post_card(post, local_offset))
            }

            @if has_more {
                (sentinel(feed_id))
            } @else {
                (end_of_feed())
            }
        }
        .into_response(),
        Ok(LoadOutcome::Failed { message }) => fetch_failed(&message, feed_id).into_response(),
        Ok(LoadOutcome::Suppressed) | Ok(LoadOutcome::Discarded) => {
            StatusCode::NO_CONTENT.into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn feed_tail(state: &FeedState, feed_id: FeedId) -> Markup {
    match (state.status, &state.error_message) {
        (FeedStatus::Failed, Some(message)) => fetch_failed(message, feed_id),
        _ if state.has_more => sentinel(feed_id),
        _ if state.posts.is_empty() => html! {
            p id="feed-empty" class="text-center text-gray-500 dark:text-gray-400"
            {
                "No posts yet."
            }
        },
        _ => end_of_feed(),
    }
}

fn sentinel(feed_id: FeedId) -> Markup {
    html! {
        div
            id="feed-sentinel"
            hx-get=(endpoints::more_posts_url(feed_id))
            hx-trigger="revealed"
            hx-swap="outerHTML"
            class="flex justify-center py-4 text-gray-500"
        {
            (loading_spinner())
        }
    }
}

fn end_of_feed() -> Markup {
    html! {
        p id="feed-end" class="text-center text-gray-500 dark:text-gray-400"
        {
            "You're all caught up."
        }
    }
}

fn feed_expired() -> Markup {
    html! {
        p id="feed-expired" class="text-center text-gray-500 dark:text-gray-400"
        {
            "This feed is out of date. "
            a href=(endpoints::FEED_VIEW) class=(LINK_STYLE) { "Reload" }
        }
    }
}

fn fetch_failed(message: &str, feed_id: FeedId) -> Markup {
    html! {
        div id="feed-error" role="alert" class="flex flex-col items-center gap-2 py-4"
        {
            p class="text-red-500" { (message) }

            button
                type="button"
                class=(BUTTON_SECONDARY_STYLE)
                hx-get=(endpoints::more_posts_url(feed_id))
                hx-target="#feed-error"
                hx-swap="outerHTML"
            {
                "Retry"
            }
        }
    }
}

fn post_card(post: &Post, local_offset: UtcOffset) -> Markup {
    let created_at = format_date(post.created_at, local_offset);

    html! {
        article id=(format!("post-{}", post.id)) class=(CARD_STYLE) data-slug=(post.slug)
        {
            img src=(post.photo) alt=(post.title) class="w-full rounded-t-lg object-cover";

            div class="p-4 space-y-2"
            {
                h2 class="text-lg font-semibold text-gray-900 dark:text-white" { (post.title) }

                time
                    datetime=(post.created_at.unix_timestamp())
                    class="block text-sm text-gray-500 dark:text-gray-400"
                {
                    (created_at)
                }

                @if !post.description.is_empty() {
                    p class="text-gray-700 dark:text-gray-300 whitespace-pre-line"
                    {
                        (post.description)
                    }
                }

                @if !post.tagged_users.is_empty() {
                    div class="flex flex-wrap gap-2"
                    {
                        @for tag in &post.tagged_users {
                            span class=(TAG_BADGE_STYLE) { (tag.display_name()) }
                        }
                    }
                }
            }
        }
    }
}

fn format_date(date_time: OffsetDateTime, local_offset: UtcOffset) -> String {
    let date_time = date_time.to_offset(local_offset);

    date_time
        .format(POST_DATE_FORMAT)
        .unwrap_or_else(|_| date_time.date().to_string())
}
