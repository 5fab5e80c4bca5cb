//! The profile page and the endpoint that updates the profile.

use axum::{
    Extension, Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserID,
    alert::Alert,
    endpoints,
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, form_field, form_message, link, submit_button,
    },
    navigation::NavBar,
    profile::{Profile, ProfileStore, SqliteProfileStore},
    store::StoreErrorKind,
    validation::{
        FormAction, FormErrors, FormModel, FormSchema, PROFILE_FORM_NAME, ProfileField,
        ProfileForm, SubmitError,
    },
};

/// Shown when a valid profile update could not be saved.
pub const PROFILE_UPDATE_FAILED_MESSAGE: &str = "Failed to update profile";

/// The state needed for the profile page.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub profile_store: SqliteProfileStore,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            profile_store: SqliteProfileStore::new(state.db_connection.clone()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    #[serde(default)]
    pub edit: bool,
}

/// Check `form` and, if every field is valid, save the new names and mobile
/// number to the profile of `user_id`.
///
/// # Errors
///
/// Returns [SubmitError::Invalid] with every field error if the form is not
/// valid, in which case the store is not touched. Returns
/// [SubmitError::Rejected] if the profile could not be read or saved.
pub async fn submit_profile_update<S: ProfileStore>(
    store: &S,
    user_id: UserID,
    form: ProfileForm,
) -> Result<Profile, SubmitError<ProfileField>> {
    let model = FormModel::new(form).reduce(FormAction::SubmitAttempted);

    if !model.is_valid() {
        return Err(SubmitError::Invalid(model.errors));
    }

    let rejected = |error: StoreErrorKind| {
        tracing::error!("Could not update the profile of user {user_id}: {error:?}");
        SubmitError::Rejected(PROFILE_UPDATE_FAILED_MESSAGE.to_owned())
    };

    let form = model.values;
    let mut profile = store.get_profile(user_id).await.map_err(rejected)?;
    profile.first_name = form.first_name.trim().to_owned();
    profile.last_name = form.last_name.trim().to_owned();
    profile.mobile_no = form.mobile_no;
    profile.updated_at = OffsetDateTime::now_utc();

    store.put_profile(profile.clone()).await.map_err(rejected)?;

    Ok(profile)
}

/// Display the signed-in user's profile, or the form for editing it when
/// the query has `edit=true`.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ProfileQuery>,
) -> Response {
    let profile = match state.profile_store.get_profile(user_id).await {
        Ok(profile) => profile,
        Err(StoreErrorKind::NotFound) => return Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not get the profile of user {user_id}: {error:?}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let content = if query.edit {
        let form = ProfileForm {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            mobile_no: profile.mobile_no.clone(),
        };
        profile_form(&profile.email, &form, &FormErrors::default(), None)
    } else {
        profile_view(&profile)
    };

    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(PAGE_CONTAINER_STYLE) { (content) }
    };

    base("Profile", &content).into_response()
}

/// Handler for profile updates via the PUT method.
///
/// A valid update redirects back to the profile. An invalid form is
/// returned with every error shown, and a failed save shows an alert.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let submitted = form.clone();

    match submit_profile_update(&state.profile_store, user_id, form).await {
        Ok(_) => (
            HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(SubmitError::Invalid(errors)) => {
            let email = match state.profile_store.get_profile(user_id).await {
                Ok(profile) => profile.email,
                Err(_) => String::new(),
            };
            profile_form(&email, &submitted, &errors, None).into_response()
        }
        Err(SubmitError::Rejected(message)) => Alert::ErrorSimple { message }.into_response(),
    }
}

fn profile_view(profile: &Profile) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            div class="p-6 space-y-4 sm:p-8"
            {
                img
                    src=(profile.image)
                    alt="Profile image"
                    class="w-24 h-24 rounded-full object-cover";

                h1 class="text-xl font-bold text-gray-900 md:text-2xl dark:text-white"
                {
                    (profile.display_name())
                }

                dl class="text-gray-700 dark:text-gray-300"
                {
                    dt class="font-semibold" { "Email" }
                    dd id="profile-email" { (profile.email) }
                    dt class="font-semibold" { "Mobile number" }
                    dd id="profile-mobile-no" { (profile.mobile_no) }
                }

                p { (link(&format!("{}?edit=true", endpoints::PROFILE_VIEW), "Edit profile")) }
            }
        }
    }
}

fn profile_form(
    email: &str,
    form: &ProfileForm,
    errors: &FormErrors<ProfileField>,
    message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-put=(endpoints::PROFILE_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(format!("{CARD_STYLE} p-6 space-y-4 sm:p-8"))
        {
            (form_message(message))

            div
            {
                label for="profile-email" class=(FORM_LABEL_STYLE) { "Email" }
                input
                    type="email"
                    id="profile-email"
                    value=(email)
                    readonly
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @for &field in ProfileForm::FIELDS {
                (form_field(PROFILE_FORM_NAME, field, form.value(field), errors.get(field)))
            }

            (submit_button("Save"))

            a href=(endpoints::PROFILE_VIEW) class=(BUTTON_SECONDARY_STYLE) { "Cancel" }
        }
    }
}

#[cfg(test)]
mod submit_profile_update_tests {
    use crate::{
        UserID,
        profile::{fake_profile_store::FakeProfileStore, test_profile},
        store::StoreErrorKind,
        validation::{ProfileField, ProfileForm, SubmitError},
    };

    use super::{PROFILE_UPDATE_FAILED_MESSAGE, submit_profile_update};

    fn valid_form() -> ProfileForm {
        ProfileForm {
            first_name: "Alicia".to_owned(),
            last_name: "Smithers".to_owned(),
            mobile_no: "0229876543".to_owned(),
        }
    }

    #[tokio::test]
    async fn saves_valid_update() {
        let user_id = UserID::new(1);
        let store = FakeProfileStore::with_profile(test_profile(user_id));

        let profile = submit_profile_update(&store, user_id, valid_form())
            .await
            .unwrap();

        assert_eq!(profile.first_name, "Alicia");
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(store.stored(user_id), Some(profile));
        assert_eq!(store.put_calls(), 1);
    }

    #[tokio::test]
    async fn reports_every_invalid_field_without_saving() {
        let user_id = UserID::new(1);
        let store = FakeProfileStore::with_profile(test_profile(user_id));
        let form = ProfileForm {
            first_name: "Al".to_owned(),
            mobile_no: "123-456-7890".to_owned(),
            ..valid_form()
        };

        let Err(SubmitError::Invalid(errors)) =
            submit_profile_update(&store, user_id, form).await
        else {
            panic!("want invalid form");
        };

        assert_eq!(errors.error_count(), 2);
        assert_eq!(
            errors.get(ProfileField::FirstName),
            "First name must be at least 3 characters."
        );
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn failed_save_is_rejected() {
        let user_id = UserID::new(1);
        let store = FakeProfileStore {
            put_error: Some(StoreErrorKind::Unavailable),
            ..FakeProfileStore::with_profile(test_profile(user_id))
        };

        let result = submit_profile_update(&store, user_id, valid_form()).await;

        assert_eq!(
            result,
            Err(SubmitError::Rejected(PROFILE_UPDATE_FAILED_MESSAGE.to_owned()))
        );
    }

    #[tokio::test]
    async fn missing_profile_is_rejected() {
        let store = FakeProfileStore::default();

        let result = submit_profile_update(&store, UserID::new(7), valid_form()).await;

        assert_eq!(
            result,
            Err(SubmitError::Rejected(PROFILE_UPDATE_FAILED_MESSAGE.to_owned()))
        );
        assert_eq!(store.put_calls(), 0);
    }
}

#[cfg(test)]
mod profile_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        UserID, endpoints,
        profile::{SqliteProfileStore, create_profile_table, test_profile, upsert_profile},
        test_utils::{
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, must_get_form,
            parse_html_document, parse_html_fragment,
        },
        user::{create_user_table, insert_test_user},
        validation::ProfileForm,
    };

    use super::{
        ProfileQuery, ProfileState, get_profile_page, update_profile_endpoint,
    };

    fn get_state() -> ProfileState {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        create_profile_table(&connection).unwrap();
        insert_test_user(UserID::new(1), &connection);
        upsert_profile(&test_profile(UserID::new(1)), &connection).unwrap();

        ProfileState {
            profile_store: SqliteProfileStore::new(Arc::new(Mutex::new(connection))),
        }
    }

    #[tokio::test]
    async fn shows_profile() {
        let response = get_profile_page(
            State(get_state()),
            Extension(UserID::new(1)),
            Query(ProfileQuery::default()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let email = document
            .select(&Selector::parse("#profile-email").unwrap())
            .next()
            .unwrap();
        assert_eq!(email.text().collect::<String>(), "alice@example.com");
        assert!(
            document
                .select(&Selector::parse("form").unwrap())
                .next()
                .is_none()
        );
    }

    #[tokio::test]
    async fn edit_mode_shows_form_with_read_only_email() {
        let response = get_profile_page(
            State(get_state()),
            Extension(UserID::new(1)),
            Query(ProfileQuery { edit: true }),
        )
        .await;

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::PROFILE_API, "hx-put");
        let email = form
            .select(&Selector::parse("input#profile-email").unwrap())
            .next()
            .unwrap();
        assert!(email.value().attr("readonly").is_some());
        assert!(email.value().attr("name").is_none());
        let first_name = form
            .select(&Selector::parse("input[name=first_name]").unwrap())
            .next()
            .unwrap();
        assert_eq!(first_name.value().attr("value"), Some("Alice"));
    }

    #[tokio::test]
    async fn missing_profile_is_404() {
        let response = get_profile_page(
            State(get_state()),
            Extension(UserID::new(99)),
            Query(ProfileQuery::default()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn valid_update_redirects_to_profile() {
        let state = get_state();
        let form = ProfileForm {
            first_name: "Alicia".to_owned(),
            last_name: "Smith".to_owned(),
            mobile_no: "0211234567".to_owned(),
        };

        let response =
            update_profile_endpoint(State(state), Extension(UserID::new(1)), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::PROFILE_VIEW);
    }

    #[tokio::test]
    async fn invalid_update_shows_errors() {
        let form = ProfileForm {
            first_name: String::new(),
            last_name: "Smith".to_owned(),
            mobile_no: "12345".to_owned(),
        };

        let response =
            update_profile_endpoint(State(get_state()), Extension(UserID::new(1)), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;
        let error_text = |id: &str| {
            fragment
                .select(&Selector::parse(&format!("#{id}")).unwrap())
                .next()
                .unwrap()
                .text()
                .collect::<String>()
        };
        assert_eq!(error_text("profile-first_name-error"), "First name is required.");
        assert_eq!(
            error_text("profile-mobile_no-error"),
            "Mobile number must be 10 digits."
        );
        assert_eq!(error_text("profile-last_name-error"), "");
    }
}
