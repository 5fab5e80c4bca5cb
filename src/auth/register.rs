//! The registration page and the endpoint that creates accounts.

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::OffsetDateTime;

use crate::{
    AppState, UserID,
    auth::{Authenticator, SqliteAuthenticator},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, base, form_field, form_message, link, log_in_register, submit_button,
    },
    image::ImageSelection,
    profile::{Profile, ProfileStore, SqliteProfileStore},
    validation::{
        FormAction, FormModel, FormSchema, REGISTRATION_FORM_NAME, RegistrationField,
        RegistrationForm, SubmitError,
    },
};

/// Shown once an account and its profile have been created.
pub const REGISTRATION_SUCCESS_MESSAGE: &str = "User registered successfully!";

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub authenticator: SqliteAuthenticator,
    pub profile_store: SqliteProfileStore,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            authenticator: SqliteAuthenticator::new(
                state.db_connection.clone(),
                state.password_hash_cost,
            ),
            profile_store: SqliteProfileStore::new(state.db_connection.clone()),
        }
    }
}

/// Check every field of the registration form, then create the account and
/// its profile.
///
/// The profile is only written after the account was created, and nothing
/// is sent if any field is invalid.
///
/// # Errors
///
/// Returns [SubmitError::Invalid] with all field errors for an invalid form,
/// or [SubmitError::Rejected] with the message for the first failure of the
/// authenticator or the profile store.
pub async fn submit_registration<A, P>(
    authenticator: &A,
    profile_store: &P,
    mut form: RegistrationForm,
) -> Result<UserID, SubmitError<RegistrationField>>
where
    A: Authenticator,
    P: ProfileStore,
{
    form.image_uri = ImageSelection::from_input(&form.image_uri).into_uri();
    let model = FormModel::new(form).reduce(FormAction::SubmitAttempted);

    if !model.is_valid() {
        tracing::debug!(
            "Registration form has {} invalid fields",
            model.errors.error_count()
        );
        return Err(SubmitError::Invalid(model.errors));
    }

    let form = model.values;
    let user_id = authenticator
        .create_account(&form.email, &form.password)
        .await
        .map_err(|kind| SubmitError::Rejected(kind.user_message().to_owned()))?;

    let now = OffsetDateTime::now_utc();
    let profile = Profile {
        user_id,
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        mobile_no: form.mobile_no,
        email: form.email.trim().to_lowercase(),
        image: form.image_uri,
        created_at: now,
        updated_at: now,
    };

    profile_store.put_profile(profile).await.map_err(|kind| {
        tracing::error!("Created account {user_id} but could not save its profile: {kind:?}");
        SubmitError::Rejected(kind.user_message().to_owned())
    })?;

    Ok(user_id)
}

fn registration_form(model: &FormModel<RegistrationForm>, message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (form_message(message))

            @for &field in RegistrationForm::FIELDS {
                (form_field(
                    REGISTRATION_FORM_NAME,
                    field,
                    model.values.value(field),
                    model.errors.get(field),
                ))
            }

            (submit_button("Register"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

fn success_modal() -> Markup {
    html! {
        div
            id="registration-success"
            role="dialog"
            aria-modal="true"
            class="fixed inset-0 z-50 flex items-center justify-center bg-gray-900/50"
        {
            div class="p-6 space-y-4 bg-white rounded-lg shadow dark:bg-gray-800"
            {
                p class="text-lg font-semibold text-gray-900 dark:text-white"
                {
                    (REGISTRATION_SUCCESS_MESSAGE)
                }

                a href=(endpoints::LOG_IN_VIEW) class=(BUTTON_PRIMARY_STYLE) { "Go to Login" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form(&FormModel::default(), None);
    let content = log_in_register("Create an account", &form);

    base("Register", &content).into_response()
}

/// Handler for registration requests via the POST method.
///
/// On success the form is cleared and the success dialog is shown.
/// Otherwise the form is returned with the entered values and the errors.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let submitted = form.clone();

    match submit_registration(&state.authenticator, &state.profile_store, form).await {
        Ok(user_id) => {
            tracing::info!("Registered user {user_id}");
            let model = FormModel::new(submitted).reduce(FormAction::Reset);

            html! {
                (registration_form(&model, None))
                (success_modal())
            }
            .into_response()
        }
        Err(SubmitError::Invalid(errors)) => {
            let model = FormModel {
                values: submitted,
                errors,
            };
            registration_form(&model, None).into_response()
        }
        Err(SubmitError::Rejected(message)) => {
            registration_form(&FormModel::new(submitted), Some(&message)).into_response()
        }
    }
}
