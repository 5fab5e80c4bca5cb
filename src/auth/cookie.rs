//! Defines functions for storing the session in a private cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{Error, auth::session::Session, profile::Profile};

/// The name of the cookie that holds the serialized session.
pub const COOKIE_SESSION: &str = "user";
/// The default duration for which sessions are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Add the session cookie for the owner of `profile` to the cookie jar,
/// indicating that they are signed in.
///
/// The session expires `duration` from now, expressed in `local_offset`.
///
/// # Errors
///
/// Returns [Error::JSONSerializationError] if the session cannot be serialized.
pub fn set_session_cookie(
    jar: PrivateCookieJar,
    profile: &Profile,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc().to_offset(local_offset) + duration;
    let session = Session::for_profile(profile, expires_at);

    write_session(jar, &session)
}

/// Read the session from the cookie jar.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if there is no session cookie.
/// - [Error::InvalidSession] if the cookie does not hold a session.
/// - [Error::SessionExpired] if the session has run out.
pub fn get_session_from_cookies(jar: &PrivateCookieJar) -> Result<Session, Error> {
    let cookie = jar.get(COOKIE_SESSION).ok_or(Error::CookieMissing)?;
    let session: Session = serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::InvalidSession(error.to_string()))?;

    if session.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::SessionExpired);
    }

    Ok(session)
}

/// Push the session's expiry back to `duration` from now, unless it already
/// expires later than that.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns the errors of [get_session_from_cookies], or
/// [Error::JSONSerializationError] if the updated session cannot be
/// serialized.
pub fn extend_session_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let mut session = get_session_from_cookies(&jar)?;
    let new_expiry = OffsetDateTime::now_utc().to_offset(local_offset) + duration;

    session.expires_at = max(session.expires_at, new_expiry);

    write_session(jar, &session)
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

fn write_session(jar: PrivateCookieJar, session: &Session) -> Result<PrivateCookieJar, Error> {
    let value = serde_json::to_string(session)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_SESSION, value))
            .path("/")
            .expires(session.expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        Error, UserID,
        auth::cookie::{
            COOKIE_SESSION, DEFAULT_COOKIE_DURATION, extend_session_if_needed,
            get_session_from_cookies, invalidate_session_cookie, set_session_cookie,
        },
        profile::test_profile,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    /// Test helper macro to assert that two date times are within one second
    /// of each other. Used instead of a function so that the file and line
    /// number of the caller is included in the error message instead of the
    /// helper.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(1),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[test]
    fn can_set_session_cookie() {
        let profile = test_profile(UserID::new(1));

        let jar = set_session_cookie(get_jar(), &profile, DEFAULT_COOKIE_DURATION, UtcOffset::UTC)
            .unwrap();
        let session = get_session_from_cookies(&jar).unwrap();

        assert_eq!(session.user_id, profile.user_id);
        assert_eq!(session.first_name, profile.first_name);
        assert_date_time_close!(
            session.expires_at,
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION
        );
        let cookie = jar.get(COOKIE_SESSION).unwrap();
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn missing_cookie_is_signed_out() {
        assert_eq!(get_session_from_cookies(&get_jar()), Err(Error::CookieMissing));
    }

    #[test]
    fn unparseable_cookie_is_signed_out() {
        let jar = get_jar().add(Cookie::new(COOKIE_SESSION, "not json"));

        assert!(matches!(
            get_session_from_cookies(&jar),
            Err(Error::InvalidSession(_))
        ));
    }

    #[test]
    fn expired_session_is_signed_out() {
        let profile = test_profile(UserID::new(1));
        let jar =
            set_session_cookie(get_jar(), &profile, Duration::seconds(-5), UtcOffset::UTC).unwrap();

        assert_eq!(get_session_from_cookies(&jar), Err(Error::SessionExpired));
    }

    #[test]
    fn can_extend_session() {
        let profile = test_profile(UserID::new(1));
        let jar =
            set_session_cookie(get_jar(), &profile, Duration::seconds(5), UtcOffset::UTC).unwrap();

        let jar = extend_session_if_needed(jar, Duration::minutes(10), UtcOffset::UTC).unwrap();

        let session = get_session_from_cookies(&jar).unwrap();
        assert_date_time_close!(
            session.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(10)
        );
        assert_date_time_close!(
            jar.get(COOKIE_SESSION).unwrap().expires_datetime().unwrap(),
            session.expires_at
        );
    }

    #[test]
    fn session_duration_does_not_shrink() {
        let profile = test_profile(UserID::new(1));
        let jar =
            set_session_cookie(get_jar(), &profile, Duration::days(7), UtcOffset::UTC).unwrap();
        let want = get_session_from_cookies(&jar).unwrap().expires_at;

        let jar = extend_session_if_needed(jar, Duration::minutes(5), UtcOffset::UTC).unwrap();

        assert_eq!(get_session_from_cookies(&jar).unwrap().expires_at, want);
    }

    #[test]
    fn invalidate_session_cookie_succeeds() {
        let profile = test_profile(UserID::new(1));
        let jar =
            set_session_cookie(get_jar(), &profile, DEFAULT_COOKIE_DURATION, UtcOffset::UTC)
                .unwrap();

        let jar = invalidate_session_cookie(jar);
        let cookie = jar.get(COOKIE_SESSION).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert!(get_session_from_cookies(&jar).is_err());
    }
}
