//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bodies longer than this many characters are cut short in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Form fields whose values never reach the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];
const REDACTED_VALUE: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in submitted forms are replaced with asterisks.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let body_text = String::from_utf8_lossy(&body_bytes);
    if is_form(&parts) {
        log_request(&parts, &redact_form(&body_text));
    } else {
        log_request(&parts, &body_text);
    }

    let response = next
        .run(Request::from_parts(parts, Body::from(body_bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, axum::Error> {
    to_bytes(body, usize::MAX).await
}

fn is_form(parts: &request::Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Replace the values of password fields in a URL encoded form.
///
/// Text that is not a valid form is returned as a placeholder rather than
/// risking a password in the logs.
fn redact_form(form_text: &str) -> String {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(form_text) {
        Ok(pairs) => pairs,
        Err(_) => return "<unreadable form>".to_owned(),
    };

    let redacted: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(key, value)| {
            if REDACTED_FIELDS.contains(&key.as_str()) {
                (key, REDACTED_VALUE.to_owned())
            } else {
                (key, value)
            }
        })
        .collect();

    serde_urlencoded::to_string(redacted).unwrap_or_else(|_| "<unreadable form>".to_owned())
}

/// The first [LOG_BODY_LENGTH_LIMIT] characters of `body`, or `None` if it
/// is short enough to log whole.
fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

fn log_request(parts: &request::Parts, body: &str) {
    match truncate(body) {
        Some(head) => {
            tracing::info!("Received request: {parts:#?}\nbody: {head}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {parts:#?}\nbody: {body:?}"),
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    match truncate(body) {
        Some(head) => {
            tracing::info!("Sending response: {parts:#?}\nbody: {head}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {parts:#?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod redact_form_tests {
    use super::{LOG_BODY_LENGTH_LIMIT, redact_form, truncate};

    #[test]
    fn hides_both_passwords() {
        let form = "email=a%40b.com&password=Secret1!&confirm_password=Secret1!";

        let redacted = redact_form(form);

        assert_eq!(
            redacted,
            "email=a%40b.com&password=********&confirm_password=********"
        );
    }

    #[test]
    fn leaves_other_fields_alone() {
        assert_eq!(redact_form("title=Hi&tag=1%3A2"), "title=Hi&tag=1%3A2");
    }

    #[test]
    fn short_body_is_not_truncated() {
        assert_eq!(truncate("hello"), None);
    }

    #[test]
    fn truncates_on_character_boundary() {
        let body = "é".repeat(LOG_BODY_LENGTH_LIMIT + 1);

        let head = truncate(&body).unwrap();

        assert_eq!(head.chars().count(), LOG_BODY_LENGTH_LIMIT);
    }
}
