//! The new post page and the endpoint that publishes posts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID, endpoints,
    html::{CARD_STYLE, PAGE_CONTAINER_STYLE, base, form_field, form_message, submit_button},
    image::ImageSelection,
    navigation::NavBar,
    post::{
        CreatedPost, NewPost, PostStore, SqlitePostStore, UserTag, generate_slug,
        tagging::{TagList, TagOutcome, tag_list_view, tag_search},
    },
    user::get_user_summaries,
    validation::{
        FormAction, FormModel, FormSchema, POST_FORM_NAME, PostField, PostForm, SubmitError,
    },
};

/// Shown when a valid post could not be saved.
pub const CREATE_POST_FAILED_MESSAGE: &str = "Something went wrong while adding the post.";

/// The state needed to write posts.
#[derive(Debug, Clone)]
pub struct CreatePostState {
    pub post_store: SqlitePostStore,
    /// Used to look up the names of tagged users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePostState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            post_store: SqlitePostStore::new(state.db_connection.clone()),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The new post form as submitted, including the hidden tag inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPostSubmission {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tag: Vec<String>,
}

impl NewPostSubmission {
    fn form(&self) -> PostForm {
        PostForm {
            title: self.title.clone(),
            photo: self.photo.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
        }
    }
}

/// Check every field of the post, derive its slug and save it for `author_id`.
///
/// # Errors
///
/// Returns [SubmitError::Invalid] with every field error if the form is not
/// valid, in which case nothing is saved, or [SubmitError::Rejected] if the
/// store refused the post.
pub async fn submit_post<S: PostStore>(
    store: &S,
    author_id: UserID,
    mut form: PostForm,
    tagged_users: Vec<UserTag>,
) -> Result<CreatedPost, SubmitError<PostField>> {
    form.photo = ImageSelection::from_input(&form.photo).into_uri();
    let model = FormModel::new(form).reduce(FormAction::SubmitAttempted);

    if !model.is_valid() {
        tracing::debug!("Post form has {} invalid fields", model.errors.error_count());
        return Err(SubmitError::Invalid(model.errors));
    }

    let form = model.values;
    let post = NewPost {
        slug: generate_slug(&form.title, &form.slug),
        title: form.title.trim().to_owned(),
        photo: form.photo,
        description: form.description,
        author_id,
        tagged_users,
    };

    store.create_post(post).await.map_err(|error| {
        tracing::error!("Could not save the post of user {author_id}: {error:?}");
        SubmitError::Rejected(CREATE_POST_FAILED_MESSAGE.to_owned())
    })
}

fn new_post_form(model: &FormModel<PostForm>, tags: &TagList, message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::POSTS_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class=(format!("{CARD_STYLE} p-6 space-y-4 sm:p-8"))
        {
            h1 class="text-xl font-bold text-gray-900 md:text-2xl dark:text-white" { "New post" }

            (form_message(message))

            @for &field in PostForm::FIELDS {
                (form_field(
                    POST_FORM_NAME,
                    field,
                    model.values.value(field),
                    model.errors.get(field),
                ))
            }

            (tag_search())
            (tag_list_view(tags, TagOutcome::NotTagged))

            (submit_button("Post"))
        }
    }
}

fn new_post_page(form: &Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_POST_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(PAGE_CONTAINER_STYLE) { (form) }
    };

    base("New post", &content)
}

/// Display the page for writing a new post.
pub async fn get_new_post_page() -> Response {
    let form = new_post_form(&FormModel::default(), &TagList::default(), None);

    new_post_page(&form).into_response()
}

/// Handler for new posts via the POST method.
///
/// A saved post sends the client to the feed, where it is shown first. An
/// invalid post is returned with every error, and a failed save keeps the
/// entered values and shows the message above the form.
pub async fn create_post_endpoint(
    State(state): State<CreatePostState>,
    Extension(user_id): Extension<UserID>,
    Form(submission): Form<NewPostSubmission>,
) -> Response {
    let users = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        match get_user_summaries(&connection) {
            Ok(users) => users,
            Err(error) => return error.into_alert_response(),
        }
    };

    let tags = TagList::from_inputs(&submission.tag, &users);
    let form = submission.form();

    let tagged_users = tags.clone().into_tags();

    match submit_post(&state.post_store, user_id, form.clone(), tagged_users).await {
        Ok(created) => {
            tracing::info!("User {user_id} created post {}", created.id);

            (
                HxRedirect(endpoints::FEED_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(SubmitError::Invalid(errors)) => {
            let model = FormModel {
                values: form,
                errors,
            };
            new_post_form(&model, &tags, None).into_response()
        }
        Err(SubmitError::Rejected(message)) => {
            new_post_form(&FormModel::new(form), &tags, Some(&message)).into_response()
        }
    }
}

#[cfg(test)]
mod submit_post_tests {
    use crate::{
        UserID,
        feed::fake_post_store::FakePostStore,
        post::UserTag,
        store::StoreErrorKind,
        validation::{PostField, PostForm, SubmitError},
    };

    use super::{CREATE_POST_FAILED_MESSAGE, submit_post};

    fn valid_form() -> PostForm {
        PostForm {
            title: "Sunset at the Beach".to_owned(),
            photo: "https://example.com/sunset.jpg".to_owned(),
            slug: "golden hour".to_owned(),
            description: "<b>Wow</b>".to_owned(),
        }
    }

    #[tokio::test]
    async fn saves_post_with_derived_slug_and_tags() {
        let store = FakePostStore::default();
        let tags = vec![UserTag {
            tag_id: "t1".to_owned(),
            uid: UserID::new(2),
            first_name: "Bob".to_owned(),
            last_name: "Brown".to_owned(),
        }];

        submit_post(&store, UserID::new(1), valid_form(), tags.clone())
            .await
            .unwrap();

        let created = store.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        let post = &created[0];
        assert!(post.slug.starts_with("sunset-at-the-beach-"));
        assert!(post.slug.ends_with("-golden-hour"));
        assert_eq!(post.description, "<b>Wow</b>");
        assert_eq!(post.author_id, UserID::new(1));
        assert_eq!(post.tagged_users, tags);
    }

    #[tokio::test]
    async fn missing_title_and_photo_are_both_reported() {
        let store = FakePostStore::default();
        let form = PostForm {
            title: " ".to_owned(),
            photo: String::new(),
            ..valid_form()
        };

        let Err(SubmitError::Invalid(errors)) =
            submit_post(&store, UserID::new(1), form, Vec::new()).await
        else {
            panic!("want invalid form");
        };

        assert_eq!(errors.error_count(), 2);
        assert_eq!(errors.get(PostField::Title), "Title is required.");
        assert_eq!(errors.get(PostField::Photo), "Photo is required.");
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_rejected() {
        let store = FakePostStore {
            create_result: Some(StoreErrorKind::Unknown),
            ..FakePostStore::default()
        };

        let result = submit_post(&store, UserID::new(1), valid_form(), Vec::new()).await;

        assert_eq!(
            result.map(|_| ()),
            Err(SubmitError::Rejected(CREATE_POST_FAILED_MESSAGE.to_owned()))
        );
    }

    #[tokio::test]
    async fn same_title_twice_gets_distinct_slugs() {
        let store = FakePostStore::default();

        submit_post(&store, UserID::new(1), valid_form(), Vec::new())
            .await
            .unwrap();
        submit_post(&store, UserID::new(1), valid_form(), Vec::new())
            .await
            .unwrap();

        let created = store.created.lock().unwrap();
        assert_ne!(created[0].slug, created[1].slug);
    }
}

#[cfg(test)]
mod create_post_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        UserID, endpoints,
        post::{SqlitePostStore, create_post_table, get_posts_page},
        profile::{Profile, create_profile_table, test_profile, upsert_profile},
        test_utils::{assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document},
        user::{create_user_table, insert_test_user},
    };

    use super::{CreatePostState, create_post_endpoint, get_new_post_page};

    fn get_test_server() -> (TestServer, Arc<Mutex<Connection>>) {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        create_profile_table(&connection).unwrap();
        create_post_table(&connection).unwrap();
        insert_test_user(UserID::new(1), &connection);
        insert_test_user(UserID::new(2), &connection);
        upsert_profile(&test_profile(UserID::new(1)), &connection).unwrap();
        let bob = Profile {
            first_name: "Bob".to_owned(),
            last_name: "Brown".to_owned(),
            ..test_profile(UserID::new(2))
        };
        upsert_profile(&bob, &connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let state = CreatePostState {
            post_store: SqlitePostStore::new(connection.clone()),
            db_connection: connection.clone(),
        };
        let app = Router::new()
            .route(endpoints::POSTS_API, post(create_post_endpoint))
            .layer(Extension(UserID::new(1)))
            .with_state(state);

        (
            TestServer::try_new(app).expect("Could not create test server."),
            connection,
        )
    }

    #[tokio::test]
    async fn new_post_page_has_form() {
        let document = parse_html_document(get_new_post_page().await).await;

        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::POSTS_API, "hx-post");
        for selector in [
            "input[name=title]",
            "input[name=photo]",
            "input[name=slug]",
            "textarea[name=description]",
            "input#tag-search",
            "#tag-list",
        ] {
            assert!(
                form.select(&Selector::parse(selector).unwrap()).next().is_some(),
                "want {selector}"
            );
        }
    }

    #[tokio::test]
    async fn valid_post_redirects_to_feed() {
        let (server, connection) = get_test_server();

        let response = server
            .post(endpoints::POSTS_API)
            .form(&[
                ("title", "Beach day"),
                ("photo", "https://example.com/beach.jpg"),
                ("slug", ""),
                ("description", "Sun and sand"),
                ("tag", "t1:2"),
            ])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::FEED_VIEW);
        let posts = get_posts_page(None, 10, &connection.lock().unwrap()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Beach day");
        assert_eq!(posts[0].author_id, UserID::new(1));
        assert_eq!(posts[0].tagged_users.len(), 1);
        assert_eq!(posts[0].tagged_users[0].display_name(), "Bob Brown");
    }

    #[tokio::test]
    async fn invalid_post_keeps_values_and_tags() {
        let (server, connection) = get_test_server();

        let response = server
            .post(endpoints::POSTS_API)
            .form(&[
                ("title", ""),
                ("photo", "https://example.com/beach.jpg"),
                ("tag", "t1:2"),
            ])
            .await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        let error = html
            .select(&Selector::parse("#post-title-error").unwrap())
            .next()
            .unwrap();
        assert_eq!(error.text().collect::<String>(), "Title is required.");
        let tag = html
            .select(&Selector::parse("input[name=tag]").unwrap())
            .next()
            .unwrap();
        assert_eq!(tag.value().attr("value"), Some("t1:2"));
        assert!(
            get_posts_page(None, 10, &connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }
}
