//! Accounts, sessions and the pages for registering, logging in and logging out.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod service;
mod session;

pub use cookie::{DEFAULT_COOKIE_DURATION, get_session_from_cookies};
pub use log_in::{LogInState, get_log_in_page, post_log_in, submit_log_in};
pub use log_out::{LogOutState, get_log_out};
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{
    REGISTRATION_SUCCESS_MESSAGE, RegistrationState, get_register_page, register_user,
    submit_registration,
};
pub use service::{AuthErrorKind, Authenticator, SqliteAuthenticator};
pub use session::Session;

#[cfg(test)]
pub(crate) use cookie::{COOKIE_SESSION, set_session_cookie};
