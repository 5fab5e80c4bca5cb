//! User profiles: storage, the profile page and profile updates.

mod page;
mod store;

pub use page::{
    PROFILE_UPDATE_FAILED_MESSAGE, ProfileState, get_profile_page, submit_profile_update,
    update_profile_endpoint,
};
pub use store::{
    Profile, ProfileStore, SqliteProfileStore, create_profile_table, get_profile, upsert_profile,
};

#[cfg(test)]
pub(crate) use store::{fake_profile_store, test_profile};
