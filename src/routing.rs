//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use axum_extra::extract::PrivateCookieJar;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        SqliteAuthenticator, auth_guard, auth_guard_hx, get_log_in_page, get_log_out,
        get_register_page, get_session_from_cookies, post_log_in, register_user,
    },
    endpoints,
    feed::{get_feed_page, get_more_posts},
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    post::{
        SqlitePostStore, create_post_endpoint, edit_tags_endpoint, get_new_post_page,
        get_tag_suggestions,
    },
    profile::{get_profile_page, update_profile_endpoint},
    validation::validate_field_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out::<SqliteAuthenticator>))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::VALIDATE_FIELD_API, post(validate_field_endpoint))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(
            endpoints::FEED_VIEW,
            get(get_feed_page::<SqlitePostStore>),
        )
        .route(endpoints::NEW_POST_VIEW, get(get_new_post_page))
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes are requested by HTMX and need the HX-REDIRECT header for auth redirects to work.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::MORE_POSTS_API,
                get(get_more_posts::<SqlitePostStore>),
            )
            .route(endpoints::POSTS_API, post(create_post_endpoint))
            .route(endpoints::PROFILE_API, put(update_profile_endpoint))
            .route(endpoints::TAG_SUGGESTIONS_API, get(get_tag_suggestions))
            .route(endpoints::POST_TAGS_API, post(edit_tags_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the feed when signed in, otherwise to the log-in page.
async fn get_index_page(jar: PrivateCookieJar) -> Redirect {
    match get_session_from_cookies(&jar) {
        Ok(_) => Redirect::to(endpoints::FEED_VIEW),
        Err(_) => Redirect::to(endpoints::LOG_IN_VIEW),
    }
}
