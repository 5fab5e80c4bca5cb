//! Field rules shared by every form.
//!
//! Each rule takes the raw input string and returns an empty string when the
//! value is acceptable, or the message to show beneath the input otherwise.

use unicode_segmentation::UnicodeSegmentation;

/// The minimum number of characters in a first or last name.
pub const NAME_MIN_LENGTH: usize = 3;

/// The minimum number of characters in a password.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// The symbols a password may contain, at least one of which is required.
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&#";

/// The number of digits in a mobile number.
pub const MOBILE_NO_LENGTH: usize = 10;

pub const PASSWORD_RULE_MESSAGE: &str = "Password must be at least 8 characters, include \
    uppercase, lowercase, a number, and a special character.";

pub const PASSWORDS_DO_NOT_MATCH_MESSAGE: &str = "Passwords do not match.";

/// Check that `value` is not empty or whitespace.
///
/// `label` is the human readable name of the field, e.g. "Profile image".
pub fn validate_required(label: &str, value: &str) -> String {
    if value.trim().is_empty() {
        format!("{label} is required.")
    } else {
        String::new()
    }
}

/// Check a first or last name: required, and at least [NAME_MIN_LENGTH]
/// characters long.
///
/// Length is counted in user-perceived characters, so "Zoë" is three
/// characters long regardless of how it is encoded.
pub fn validate_name(label: &str, value: &str) -> String {
    if value.trim().is_empty() {
        format!("{label} is required.")
    } else if value.graphemes(true).count() < NAME_MIN_LENGTH {
        format!("{label} must be at least {NAME_MIN_LENGTH} characters.")
    } else {
        String::new()
    }
}

/// Check a mobile number: required, and exactly ten ASCII digits with no
/// separators or country code.
pub fn validate_mobile_no(value: &str) -> String {
    if value.trim().is_empty() {
        "Mobile number is required.".to_owned()
    } else if !is_mobile_no(value) {
        "Mobile number must be 10 digits.".to_owned()
    } else {
        String::new()
    }
}

/// Check an email address: required, and shaped like `local@domain.tld`.
pub fn validate_email(value: &str) -> String {
    if value.trim().is_empty() {
        "Email is required.".to_owned()
    } else if !is_email(value) {
        "Please enter a valid email address.".to_owned()
    } else {
        String::new()
    }
}

/// Check a new password against the complexity policy.
///
/// All conditions are checked together and reported with one message.
pub fn validate_password(value: &str) -> String {
    if value.trim().is_empty() {
        "Password is required.".to_owned()
    } else if !is_strong_password(value) {
        PASSWORD_RULE_MESSAGE.to_owned()
    } else {
        String::new()
    }
}

/// Check that the confirmation is character-for-character equal to `password`.
pub fn validate_confirm_password(value: &str, password: &str) -> String {
    if value != password {
        PASSWORDS_DO_NOT_MATCH_MESSAGE.to_owned()
    } else {
        String::new()
    }
}

/// Whether `value` is exactly [MOBILE_NO_LENGTH] ASCII digits.
pub fn is_mobile_no(value: &str) -> bool {
    value.len() == MOBILE_NO_LENGTH && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Whether `value` contains a run of the form `\S+@\S+\.\S+`.
///
/// The match does not need to span the whole string, mirroring an unanchored
/// pattern search.
pub fn is_email(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();

    chars.iter().enumerate().any(|(at, &c)| {
        if c != '@' || at == 0 || chars[at - 1].is_whitespace() {
            return false;
        }

        let domain: Vec<char> = chars[at + 1..]
            .iter()
            .copied()
            .take_while(|c| !c.is_whitespace())
            .collect();

        // The dot needs at least one character on each side.
        domain.len() >= 3
            && domain[1..domain.len() - 1]
                .iter()
                .any(|&domain_char| domain_char == '.')
    })
}

/// Whether `value` satisfies every password condition at once: at least
/// [PASSWORD_MIN_LENGTH] characters drawn only from ASCII letters, digits and
/// [PASSWORD_SYMBOLS], with at least one of each of lowercase, uppercase,
/// digit and symbol.
pub fn is_strong_password(value: &str) -> bool {
    let mut has_lowercase = false;
    let mut has_uppercase = false;
    let mut has_digit = false;
    let mut has_symbol = false;
    let mut length = 0;

    for c in value.chars() {
        length += 1;

        if c.is_ascii_lowercase() {
            has_lowercase = true;
        } else if c.is_ascii_uppercase() {
            has_uppercase = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if PASSWORD_SYMBOLS.contains(c) {
            has_symbol = true;
        } else {
            return false;
        }
    }

    length >= PASSWORD_MIN_LENGTH && has_lowercase && has_uppercase && has_digit && has_symbol
}




#[cfg(test)]
mod password_tests {
    use super::{PASSWORD_RULE_MESSAGE, validate_confirm_password, validate_password};

    #[test]
    fn accepts_password_meeting_every_condition() {
        assert_eq!(validate_password("Abcdef1!"), "");
        assert_eq!(validate_password("Sup3r#Secret"), "");
    }

    #[test]
    fn reports_one_combined_message() {
        for password in ["abcdefg1", "ABCDEFG1!", "Abcdefg!", "Abcdefgh1", "Ab1!"] {
            assert_eq!(
                validate_password(password),
                PASSWORD_RULE_MESSAGE,
                "want {password:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_characters_outside_the_allowed_set() {
        assert_eq!(validate_password("Abcdef1! "), PASSWORD_RULE_MESSAGE);
        assert_eq!(validate_password("Abcdef1^x"), PASSWORD_RULE_MESSAGE);
    }

    #[test]
    fn missing_password_is_required() {
        assert_eq!(validate_password(""), "Password is required.");
    }

    #[test]
    fn confirmation_must_match_exactly() {
        assert_eq!(validate_confirm_password("Abcdef1!", "Abcdef1!"), "");
        assert_eq!(
            validate_confirm_password("abcdef1!", "Abcdef1!"),
            "Passwords do not match."
        );
    }
}
