//! Tagging users in a post that is being written.
//!
//! The tags of the new post form live in the browser as hidden inputs named
//! `tag`, each holding `"{tag_id}:{uid}"`. Every edit posts the current tags
//! back to the server, which rebuilds the [TagList], applies the change and
//! renders the list again.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState, Error, UserID, endpoints,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, TAG_BADGE_STYLE},
    post::UserTag,
    user::{UserSummary, get_user_summaries},
};

/// The name of the hidden inputs that hold the tagged users.
pub const TAG_INPUT_NAME: &str = "tag";

/// What happened when the tag list was edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// The user was added to the end of the list.
    Added,
    /// The user was already tagged, so the list is unchanged.
    AlreadyTagged,
    /// The tag was taken off the list.
    Removed,
    /// No tag had the given ID, so the list is unchanged.
    NotTagged,
}

/// The users tagged in a post, in the order they were picked.
///
/// A user appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList {
    tags: Vec<UserTag>,
}

impl TagList {
    /// Rebuild a tag list from the values of the hidden `tag` inputs.
    ///
    /// Names are looked up in `users`. Values that cannot be parsed, refer to
    /// unknown users, or repeat a user or tag ID are skipped.
    pub fn from_inputs(values: &[String], users: &[UserSummary]) -> Self {
        let mut list = Self::default();

        for value in values {
            let Some((tag_id, uid)) = parse_tag_input(value) else {
                tracing::warn!("Ignoring malformed tag input {value:?}");
                continue;
            };

            let Some(user) = users.iter().find(|user| user.id == uid) else {
                tracing::warn!("Ignoring tag for unknown user {uid}");
                continue;
            };

            if list.tags.iter().any(|tag| tag.tag_id == tag_id) {
                tracing::warn!("Ignoring repeated tag ID {tag_id:?}");
                continue;
            }

            list.add(user, tag_id.to_owned());
        }

        list
    }

    /// Tag `user` under `tag_id` unless they are already tagged.
    pub fn add(&mut self, user: &UserSummary, tag_id: String) -> TagOutcome {
        if self.contains(user.id) {
            return TagOutcome::AlreadyTagged;
        }

        self.tags.push(UserTag {
            tag_id,
            uid: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        });

        TagOutcome::Added
    }

    /// Remove the tag with `tag_id`.
    pub fn remove(&mut self, tag_id: &str) -> TagOutcome {
        let count = self.tags.len();
        self.tags.retain(|tag| tag.tag_id != tag_id);

        if self.tags.len() < count {
            TagOutcome::Removed
        } else {
            TagOutcome::NotTagged
        }
    }

    /// Whether `uid` is tagged.
    pub fn contains(&self, uid: UserID) -> bool {
        self.tags.iter().any(|tag| tag.uid == uid)
    }

    pub fn tags(&self) -> &[UserTag] {
        &self.tags
    }

    pub fn into_tags(self) -> Vec<UserTag> {
        self.tags
    }
}

/// Create a new, unique tag ID.
pub fn new_tag_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The value of the hidden input for `tag`.
pub fn tag_input_value(tag: &UserTag) -> String {
    format!("{}:{}", tag.tag_id, tag.uid)
}

/// Split a hidden input value into the tag ID and the tagged user.
pub fn parse_tag_input(value: &str) -> Option<(&str, UserID)> {
    let (tag_id, uid) = value.split_once(':')?;

    if tag_id.is_empty() {
        return None;
    }

    let uid = uid.parse().ok()?;

    Some((tag_id, UserID::new(uid)))
}

/// The users whose "first last" name contains `query`, ignoring case.
///
/// An empty or blank query gives no suggestions.
pub fn suggest_users<'a>(users: &'a [UserSummary], query: &str) -> Vec<&'a UserSummary> {
    let query = query.trim().to_lowercase();

    if query.is_empty() {
        return Vec::new();
    }

    users
        .iter()
        .filter(|user| user.display_name().to_lowercase().contains(&query))
        .collect()
}

/// The state needed to edit tags.
#[derive(Debug, Clone)]
pub struct TaggingState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TaggingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

impl TaggingState {
    fn users(&self) -> Result<Vec<UserSummary>, Error> {
        let connection = self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        get_user_summaries(&connection)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub query: String,
}

/// The users to suggest for the text typed into the tagging search box.
pub async fn get_tag_suggestions(
    State(state): State<TaggingState>,
    Query(query): Query<SuggestionQuery>,
) -> Response {
    let users = match state.users() {
        Ok(users) => users,
        Err(error) => return error.into_alert_response(),
    };

    suggestion_list(&suggest_users(&users, &query.query)).into_response()
}

/// Whether a tag edit adds or removes a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagEditAction {
    Add,
    Remove,
}

/// A change to the tags of the new post form along with the current tags.
#[derive(Debug, Deserialize)]
pub struct TagEditForm {
    pub action: TagEditAction,
    /// The user to tag, for [TagEditAction::Add].
    #[serde(default)]
    pub uid: Option<i64>,
    /// The tag to remove, for [TagEditAction::Remove].
    #[serde(default)]
    pub tag_id: Option<String>,
    /// The current tags as hidden input values.
    #[serde(default)]
    pub tag: Vec<String>,
}

/// Add or remove one tag and render the updated tag list.
pub async fn edit_tags_endpoint(
    State(state): State<TaggingState>,
    Form(form): Form<TagEditForm>,
) -> Response {
    let users = match state.users() {
        Ok(users) => users,
        Err(error) => return error.into_alert_response(),
    };

    let mut list = TagList::from_inputs(&form.tag, &users);

    let outcome = match (form.action, form.uid, form.tag_id) {
        (TagEditAction::Add, Some(uid), _) => {
            match users.iter().find(|user| user.id.as_i64() == uid) {
                Some(user) => list.add(user, new_tag_id()),
                None => return Error::NotFound.into_alert_response(),
            }
        }
        (TagEditAction::Remove, _, Some(tag_id)) => list.remove(&tag_id),
        (action, _, _) => {
            tracing::debug!("Tag edit {action:?} is missing its target");
            TagOutcome::NotTagged
        }
    };

    tracing::debug!("Tag edit finished with {outcome:?}");

    tag_list_view(&list, outcome).into_response()
}

/// The tagged users as removable badges backed by hidden inputs.
pub fn tag_list_view(list: &TagList, outcome: TagOutcome) -> Markup {
    html! {
        div id="tag-list" class="flex flex-wrap gap-2"
        {
            @for tag in list.tags() {
                input type="hidden" name=(TAG_INPUT_NAME) value=(tag_input_value(tag));

                span class=(TAG_BADGE_STYLE) data-tag-id=(tag.tag_id)
                {
                    (tag.display_name())

                    button
                        type="button"
                        aria-label=(format!("Remove {}", tag.display_name()))
                        hx-post=(endpoints::POST_TAGS_API)
                        hx-vals=(format!(r#"{{"action": "remove", "tag_id": "{}"}}"#, tag.tag_id))
                        hx-include="#tag-list"
                        hx-target="#tag-list"
                        hx-swap="outerHTML"
                    {
                        "×"
                    }
                }
            }

            @if outcome == TagOutcome::AlreadyTagged {
                p id="tag-message" class="w-full text-sm text-gray-500 dark:text-gray-400"
                {
                    "That user is already tagged."
                }
            }
        }
    }
}

/// The search box for finding users to tag.
pub fn tag_search() -> Markup {
    html! {
        div
        {
            label for="tag-search" class=(FORM_LABEL_STYLE) { "Tag people" }

            input
                type="search"
                id="tag-search"
                name="query"
                placeholder="Start typing a name"
                autocomplete="off"
                class=(FORM_TEXT_INPUT_STYLE)
                hx-get=(endpoints::TAG_SUGGESTIONS_API)
                hx-trigger="input changed delay:300ms, search"
                hx-target="#tag-suggestions"
                hx-swap="outerHTML";

            (suggestion_list(&[]))
        }
    }
}

fn suggestion_list(users: &[&UserSummary]) -> Markup {
    html! {
        ul id="tag-suggestions" class="mt-2 space-y-1"
        {
            @for user in users {
                li
                {
                    button
                        type="button"
                        class=(LINK_STYLE)
                        hx-post=(endpoints::POST_TAGS_API)
                        hx-vals=(format!(r#"{{"action": "add", "uid": "{}"}}"#, user.id))
                        hx-include="#tag-list"
                        hx-target="#tag-list"
                        hx-swap="outerHTML"
                    {
                        (user.display_name())
                    }
                }
            }
        }
    }
}
