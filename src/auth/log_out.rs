//! Log-out route handler that ends the session and redirects users.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    AppState,
    auth::{
        Authenticator, SqliteAuthenticator,
        cookie::{get_session_from_cookies, invalidate_session_cookie},
    },
    endpoints,
    feed::FeedSessions,
    post::SqlitePostStore,
};

/// The state needed to log a user out.
#[derive(Debug, Clone)]
pub struct LogOutState<A = SqliteAuthenticator> {
    pub cookie_key: Key,
    pub authenticator: A,
    pub feed_sessions: FeedSessions<SqlitePostStore>,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            authenticator: SqliteAuthenticator::new(
                state.db_connection.clone(),
                state.password_hash_cost,
            ),
            feed_sessions: state.feed_sessions.clone(),
        }
    }
}

impl<A> FromRef<LogOutState<A>> for Key {
    fn from_ref(state: &LogOutState<A>) -> Self {
        state.cookie_key.clone()
    }
}

/// Sign the user out, close their feeds, invalidate the session cookie and
/// redirect the client to the log-in page.
///
/// Requests without a valid session are still sent to the log-in page.
pub async fn get_log_out<A: Authenticator>(
    State(state): State<LogOutState<A>>,
    jar: PrivateCookieJar,
) -> Response {
    if let Ok(session) = get_session_from_cookies(&jar) {
        state.authenticator.sign_out(session.user_id).await;

        if let Err(error) = state.feed_sessions.remove_user(session.user_id) {
            tracing::error!("Could not close the feeds of user {}: {error}", session.user_id);
        }

        tracing::info!("User {} logged out", session.user_id);
    }

    let jar = invalidate_session_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}

#[cfg(test)]
mod log_out_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        extract::State,
        http::{Response, StatusCode, header::SET_COOKIE},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use rusqlite::Connection;
    use time::{OffsetDateTime, UtcOffset};

    use crate::{
        UserID,
        app_state::create_cookie_key,
        auth::{
            cookie::{COOKIE_SESSION, DEFAULT_COOKIE_DURATION, set_session_cookie},
            service::fake_authenticator::FakeAuthenticator,
        },
        endpoints,
        feed::FeedSessions,
        post::{SqlitePostStore, create_post_table},
        profile::test_profile,
    };

    use super::{LogOutState, get_log_out};

    fn get_state() -> LogOutState<FakeAuthenticator> {
        let connection = Connection::open_in_memory().unwrap();
        create_post_table(&connection).unwrap();
        let store = SqlitePostStore::new(Arc::new(Mutex::new(connection)));

        LogOutState {
            cookie_key: create_cookie_key("42"),
            authenticator: FakeAuthenticator::answering(Ok(UserID::new(1))),
            feed_sessions: FeedSessions::new(store, 10),
        }
    }

    #[tokio::test]
    async fn log_out_signs_out_and_invalidates_session() {
        let state = get_state();
        let jar = set_session_cookie(
            PrivateCookieJar::new(state.cookie_key.clone()),
            &test_profile(UserID::new(1)),
            DEFAULT_COOKIE_DURATION,
            UtcOffset::UTC,
        )
        .unwrap();
        let signed_out = state.authenticator.signed_out.clone();

        let response = get_log_out(State(state), jar).await;

        assert_redirect(&response, endpoints::LOG_IN_VIEW);
        assert_cookie_expired(&response);
        assert_eq!(*signed_out.lock().unwrap(), vec![UserID::new(1)]);
    }

    #[tokio::test]
    async fn log_out_closes_the_users_feeds() {
        let state = get_state();
        let (feed_id, _) = state.feed_sessions.open(UserID::new(1)).unwrap();
        let feed_sessions = state.feed_sessions.clone();
        let jar = set_session_cookie(
            PrivateCookieJar::new(state.cookie_key.clone()),
            &test_profile(UserID::new(1)),
            DEFAULT_COOKIE_DURATION,
            UtcOffset::UTC,
        )
        .unwrap();

        get_log_out(State(state), jar).await;

        assert!(feed_sessions.get(UserID::new(1), feed_id).unwrap().is_none());
    }

    #[tokio::test]
    async fn log_out_without_session_still_redirects() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        let signed_out = state.authenticator.signed_out.clone();

        let response = get_log_out(State(state), jar).await;

        assert_redirect(&response, endpoints::LOG_IN_VIEW);
        assert!(signed_out.lock().unwrap().is_empty());
    }

    #[track_caller]
    fn assert_redirect(response: &Response<Body>, want_location: &str) {
        let redirect_location = response.headers().get("location").unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect_location, want_location);
    }

    #[track_caller]
    fn assert_cookie_expired(response: &Response<Body>) {
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|header| Cookie::parse(header.to_str().unwrap().to_owned()).ok())
            .find(|cookie| cookie.name() == COOKIE_SESSION)
            .expect("want session cookie to be set");

        assert_eq!(
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH),
            "got expires {:?}, want {:?}",
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH),
        );
    }
}
