//! Where to send the user after they log in.
//!
//! Only same-site paths are accepted as redirect targets, and never the
//! log-in page itself.

use axum::{extract::Request, http::Uri};
use tracing::{error, warn};

use crate::endpoints;

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map_or(redirect_url, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW
}

/// The path and query of `raw_url` if it is a safe place to redirect to.
///
/// Absolute URLs are refused unless `allow_absolute` is set, in which case
/// only their path and query are kept.
fn safe_path_and_query(raw_url: &str, allow_absolute: bool) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if !allow_absolute && (uri.scheme().is_some() || uri.authority().is_some()) {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// Check a redirect URL submitted by the client.
///
/// Returns `None` for URLs that point to another site or back to log in.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    safe_path_and_query(raw_url, false)
}

/// The log-in page URL that will send the user back to where `request` was
/// going.
///
/// For `/api` requests made by htmx the page the user was on is used
/// instead, taken from the `HX-Current-URL` header.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(error) => {
            error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    let redirect_url = safe_path_and_query(current_url, true);
    if redirect_url.is_none() {
        warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}
