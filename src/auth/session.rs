//! The session object stored in the `user` cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{UserID, profile::Profile};

mod datetime_format {
    //! Specifies how to serialize a [time::OffsetDateTime] in a custom format that
    //! avoids serialisations with datetimes containing midnight.
    //!
    //! The default serializer for [time::OffsetDateTime] will serialize
    //! "00:00:00.000000" as "0:00:00.0" and the deserializer would error out
    //! because it expects the hours to be two digits, not one.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// Date time format for the session expiry, e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// The signed-in user, as remembered between requests.
///
/// A request with a session that cannot be read is treated as signed out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserID,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Start a session for the owner of `profile` that lasts until `expires_at`.
    pub fn for_profile(profile: &Profile, expires_at: OffsetDateTime) -> Self {
        Self {
            user_id: profile.user_id,
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            expires_at,
        }
    }

    /// Whether the session has run out at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod session_tests {
    use time::{Duration, UtcOffset, macros::datetime};

    use crate::{UserID, auth::session::Session};

    fn session_expiring_at(expires_at: time::OffsetDateTime) -> Session {
        Session {
            user_id: UserID::new(1),
            email: "alice@example.com".to_owned(),
            first_name: "Alice".to_owned(),
            last_name: "Smith".to_owned(),
            expires_at,
        }
    }

    #[test]
    fn serialise_session() {
        let expires_at = datetime!(2025-12-21 03:54:00).assume_offset(UtcOffset::UTC);
        let session = session_expiring_at(expires_at);
        let expected = r#"{"user_id":1,"email":"alice@example.com","first_name":"Alice","last_name":"Smith","expires_at":"2025-12-21 03:54:00.0 +00:00:00"}"#;

        let actual = serde_json::to_string(&session).unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn deserialise_session_with_midnight_expiry() {
        let expires_at = datetime!(2025-12-21 00:00:00).assume_offset(UtcOffset::UTC);
        let expected = session_expiring_at(expires_at);
        let session_string = r#"{"user_id":1,"email":"alice@example.com","first_name":"Alice","last_name":"Smith","expires_at":"2025-12-21 00:00:00.0 +00:00:00"}"#;

        let actual: Session = serde_json::from_str(session_string).unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn garbage_does_not_parse() {
        assert!(serde_json::from_str::<Session>(r#"{"user_id":"#).is_err());
        assert!(serde_json::from_str::<Session>(r#"{"user_id":1}"#).is_err());
    }

    #[test]
    fn expiry_is_inclusive() {
        let expires_at = datetime!(2025-12-21 00:00:00).assume_offset(UtcOffset::UTC);
        let session = session_expiring_at(expires_at);

        assert!(session.is_expired(expires_at));
        assert!(!session.is_expired(expires_at - Duration::seconds(1)));
    }
}
