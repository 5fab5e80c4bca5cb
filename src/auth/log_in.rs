//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The cookie and middleware modules handle the lower level session logic.

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        AuthErrorKind, Authenticator, SqliteAuthenticator,
        cookie::{invalidate_session_cookie, set_session_cookie},
        redirect::normalize_redirect_url,
    },
    endpoints,
    html::{base, form_field, form_message, link, log_in_register, submit_button},
    internal_server_error::get_internal_server_error_redirect,
    profile::{Profile, ProfileStore, SqliteProfileStore},
    store::StoreErrorKind,
    timezone::get_local_offset,
    validation::{
        FormAction, FormErrors, FormModel, LOG_IN_FORM_NAME, LogInField, LogInForm, SubmitError,
    },
};

/// How long the session should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which sessions are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub authenticator: SqliteAuthenticator,
    pub profile_store: SqliteProfileStore,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            authenticator: SqliteAuthenticator::new(
                state.db_connection.clone(),
                state.password_hash_cost,
            ),
            profile_store: SqliteProfileStore::new(state.db_connection.clone()),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// The raw data entered by the user in the log-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct LogInData {
    pub email: String,
    pub password: String,

    /// Whether to extend the initial session duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set.
    /// See the [MDN docs] on checkbox values.
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    ///
    /// [MDN docs]: https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// Check the log-in form, then the credentials, then fetch the user's
/// profile for their session.
///
/// # Errors
///
/// Returns [SubmitError::Invalid] if a field is invalid, in which case the
/// authenticator is not called. Returns [SubmitError::Rejected] with the
/// message for the [AuthErrorKind] if the credentials are refused or the
/// user has no profile.
pub async fn submit_log_in<A, P>(
    authenticator: &A,
    profile_store: &P,
    form: LogInForm,
) -> Result<Profile, SubmitError<LogInField>>
where
    A: Authenticator,
    P: ProfileStore,
{
    let model = FormModel::new(form).reduce(FormAction::SubmitAttempted);

    if !model.is_valid() {
        return Err(SubmitError::Invalid(model.errors));
    }

    let rejected = |kind: AuthErrorKind| SubmitError::Rejected(kind.user_message().to_owned());

    let user_id = authenticator
        .sign_in(&model.values.email, &model.values.password)
        .await
        .map_err(rejected)?;

    profile_store
        .get_profile(user_id)
        .await
        .map_err(|error| match error {
            StoreErrorKind::NotFound => rejected(AuthErrorKind::UserNotFound),
            StoreErrorKind::Unavailable => rejected(AuthErrorKind::NetworkFailure),
            StoreErrorKind::Unknown => rejected(AuthErrorKind::Unknown),
        })
}

fn log_in_form(
    email: &str,
    errors: &FormErrors<LogInField>,
    message: Option<&str>,
    redirect_url: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (form_message(message))

            (form_field(LOG_IN_FORM_NAME, LogInField::Email, email, errors.get(LogInField::Email)))
            (form_field(LOG_IN_FORM_NAME, LogInField::Password, "", errors.get(LogInField::Password)))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            (submit_button("Log in"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                (link(endpoints::REGISTER_VIEW, "Register here"))
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    let redirect_url = raw_url.and_then(normalize_redirect_url);

    if let (None, Some(raw_url)) = (&redirect_url, raw_url) {
        tracing::warn!("Invalid redirect URL from {source}: {raw_url}");
    }

    redirect_url
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let form = log_in_form("", &FormErrors::default(), None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &form);

    base("Log In", &content).into_response()
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the session cookie is set and the client is redirected to the feed
/// (or the page they were trying to reach).
/// Otherwise, the form is returned with the field errors or the message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(data.redirect_url.as_deref(), "log-in form");
    let form = LogInForm {
        email: data.email,
        password: data.password,
    };
    let email = form.email.clone();

    let profile = match submit_log_in(&state.authenticator, &state.profile_store, form).await {
        Ok(profile) => profile,
        Err(SubmitError::Invalid(errors)) => {
            return log_in_form(&email, &errors, None, redirect_url.as_deref()).into_response();
        }
        Err(SubmitError::Rejected(message)) => {
            tracing::info!("Log in refused for {email}: {message}");
            return log_in_form(
                &email,
                &FormErrors::default(),
                Some(&message),
                redirect_url.as_deref(),
            )
            .into_response();
        }
    };

    let cookie_duration = if data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let redirect_url = redirect_url.unwrap_or_else(|| endpoints::FEED_VIEW.to_owned());

    match set_session_cookie(jar.clone(), &profile, cookie_duration, local_offset) {
        Ok(updated_jar) => {
            tracing::info!("User {} logged in", profile.user_id);
            (StatusCode::SEE_OTHER, HxRedirect(redirect_url), updated_jar).into_response()
        }
        Err(error) => {
            tracing::error!("Error setting session cookie: {error}");
            (
                invalidate_session_cookie(jar),
                get_internal_server_error_redirect(),
            )
                .into_response()
        }
    }
}
