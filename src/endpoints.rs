//! The API endpoints URIs.
//!
//! For the field validation endpoint, use [validate_field_url]. Requests for
//! more posts name the feed they belong to, see [more_posts_url].

/// The root route which redirects to the feed or log in page.
pub const ROOT: &str = "/";
/// The feed of posts, newest first.
pub const FEED_VIEW: &str = "/posts";
/// The page for writing a new post.
pub const NEW_POST_VIEW: &str = "/posts/new";
/// The signed-in user's profile.
pub const PROFILE_VIEW: &str = "/profile";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to update the signed-in user's profile.
pub const PROFILE_API: &str = "/api/profile";
/// The route to create posts.
pub const POSTS_API: &str = "/api/posts";
/// The route that returns the next page of the feed.
pub const MORE_POSTS_API: &str = "/api/posts/more";
/// The route that lists users matching a tagging query.
pub const TAG_SUGGESTIONS_API: &str = "/api/posts/tags/suggestions";
/// The route that adds or removes a tagged user from the new post form.
pub const POST_TAGS_API: &str = "/api/posts/tags";
/// The route that checks one field of a form.
pub const VALIDATE_FIELD_API: &str = "/api/validate/{form}/{field}";

/// The URL that checks `field_name` of the form `form_name`.
pub fn validate_field_url(form_name: &str, field_name: &str) -> String {
    format!("/api/validate/{form_name}/{field_name}")
}

/// The URL that fetches the next page of the feed `feed_id`.
pub fn more_posts_url(feed_id: impl std::fmt::Display) -> String {
    format!("{MORE_POSTS_API}?feed={feed_id}")
}
