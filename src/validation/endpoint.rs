//! Checks one field of a form while the user is typing.

use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;
use serde::de::DeserializeOwned;

use crate::{
    html::{field_error, field_error_oob},
    not_found::get_404_not_found_response,
    validation::{
        FieldName, FormAction, FormModel, FormSchema, LogInForm, PostForm, ProfileForm,
        RegistrationForm,
    },
};

/// The name of the registration form in validation URLs and element ids.
pub const REGISTRATION_FORM_NAME: &str = "register";
/// The name of the log-in form in validation URLs and element ids.
pub const LOG_IN_FORM_NAME: &str = "log_in";
/// The name of the profile form in validation URLs and element ids.
pub const PROFILE_FORM_NAME: &str = "profile";
/// The name of the new post form in validation URLs and element ids.
pub const POST_FORM_NAME: &str = "post";

/// Check the field `field` of the form `form` using the whole form in the
/// request body.
///
/// Responds with the field's error element. Fields that depend on `field`
/// and already have a value are checked too and sent as out-of-band swaps.
/// Unknown form or field names get a 404.
pub async fn validate_field_endpoint(
    Path((form, field)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    match form.as_str() {
        REGISTRATION_FORM_NAME => revalidate::<RegistrationForm>(&form, &field, &body),
        LOG_IN_FORM_NAME => revalidate::<LogInForm>(&form, &field, &body),
        PROFILE_FORM_NAME => revalidate::<ProfileForm>(&form, &field, &body),
        POST_FORM_NAME => revalidate::<PostForm>(&form, &field, &body),
        _ => {
            tracing::debug!("Validation requested for unknown form \"{form}\"");
            get_404_not_found_response()
        }
    }
}

fn revalidate<F>(form_name: &str, field_name: &str, body: &[u8]) -> Response
where
    F: FormSchema + DeserializeOwned,
{
    let Some(field) = F::Field::from_name(field_name) else {
        tracing::debug!(
            "Validation requested for unknown field \"{field_name}\" of \"{form_name}\""
        );
        return get_404_not_found_response();
    };

    let values: F = match serde_urlencoded::from_bytes(body) {
        Ok(values) => values,
        Err(error) => {
            tracing::warn!("Could not parse the {form_name} form: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let value = values.value(field).to_owned();
    let model = FormModel::new(values).reduce(FormAction::FieldChanged { field, value });

    html! {
        (field_error(form_name, field.name(), model.errors.get(field)))

        @for &dependent in F::dependents(field) {
            @if !model.values.value(dependent).is_empty() {
                (field_error_oob(form_name, dependent.name(), model.errors.get(dependent)))
            }
        }
    }
    .into_response()
}

#[cfg(test)]
mod validate_field_endpoint_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use scraper::{Html, Selector};

    use crate::endpoints;

    use super::validate_field_endpoint;

    fn get_test_server() -> TestServer {
        let app = Router::new().route(
            endpoints::VALIDATE_FIELD_API,
            post(validate_field_endpoint),
        );

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn error_text(html: &Html, id: &str) -> Option<String> {
        html.select(&Selector::parse(&format!("#{id}")).unwrap())
            .next()
            .map(|element| element.text().collect())
    }

    #[tokio::test]
    async fn short_first_name_reports_error() {
        let server = get_test_server();

        let response = server
            .post("/api/validate/register/first_name")
            .form(&[("first_name", "Al"), ("last_name", "")])
            .await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        assert_eq!(
            error_text(&html, "register-first_name-error").as_deref(),
            Some("First name must be at least 3 characters.")
        );
        assert_eq!(
            error_text(&html, "register-last_name-error"),
            None,
            "only the changed field should be checked"
        );
    }

    #[tokio::test]
    async fn corrected_first_name_clears_error() {
        let server = get_test_server();

        let response = server
            .post("/api/validate/register/first_name")
            .form(&[("first_name", "Alice")])
            .await;

        let html = Html::parse_fragment(&response.text());
        assert_eq!(
            error_text(&html, "register-first_name-error").as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn changing_password_rechecks_confirmation() {
        let server = get_test_server();

        let response = server
            .post("/api/validate/register/password")
            .form(&[("password", "Abcdef1!x"), ("confirm_password", "Abcdef1!")])
            .await;

        let html = Html::parse_fragment(&response.text());
        assert_eq!(
            error_text(&html, "register-password-error").as_deref(),
            Some("")
        );
        assert_eq!(
            error_text(&html, "register-confirm_password-error").as_deref(),
            Some("Passwords do not match.")
        );
    }

    #[tokio::test]
    async fn empty_confirmation_is_not_rechecked() {
        let server = get_test_server();

        let response = server
            .post("/api/validate/register/password")
            .form(&[("password", "Abcdef1!"), ("confirm_password", "")])
            .await;

        let html = Html::parse_fragment(&response.text());
        assert_eq!(error_text(&html, "register-confirm_password-error"), None);
    }

    #[tokio::test]
    async fn log_in_password_only_needs_a_value() {
        let server = get_test_server();

        let response = server
            .post("/api/validate/log_in/password")
            .form(&[("email", "alice@example.com"), ("password", "x")])
            .await;

        let html = Html::parse_fragment(&response.text());
        assert_eq!(error_text(&html, "log_in-password-error").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn unknown_form_or_field_is_not_found() {
        let server = get_test_server();

        server
            .post("/api/validate/checkout/first_name")
            .form(&[("first_name", "Alice")])
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .post("/api/validate/profile/email")
            .form(&[("email", "alice@example.com")])
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
