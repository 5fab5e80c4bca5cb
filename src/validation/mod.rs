//! The form validation engine.
//!
//! Every form is a closed set of string fields. Each field has one rule that
//! maps the field's value (and, for dependent fields, the rest of the form) to
//! an error message, where an empty string means the value is acceptable.
//! Submitting a form validates every field at once so that all problems are
//! reported together.

mod endpoint;
mod forms;
mod reducer;
mod rules;

use std::{collections::HashMap, fmt::Debug, hash::Hash};

pub use endpoint::{
    LOG_IN_FORM_NAME, POST_FORM_NAME, PROFILE_FORM_NAME, REGISTRATION_FORM_NAME,
    validate_field_endpoint,
};
pub use forms::{
    LogInField, LogInForm, PostField, PostForm, ProfileField, ProfileForm, RegistrationField,
    RegistrationForm,
};
pub use reducer::{FormAction, FormModel};
pub use rules::{
    NAME_MIN_LENGTH, PASSWORD_RULE_MESSAGE, PASSWORDS_DO_NOT_MATCH_MESSAGE, is_email,
    is_mobile_no, is_strong_password, validate_confirm_password, validate_email,
    validate_mobile_no, validate_name, validate_password, validate_required,
};

/// A field of one particular form.
///
/// Implemented by fieldless enums so that the set of fields is known at
/// compile time and unknown field names are rejected when parsed.
pub trait FieldName: Copy + Eq + Hash + Debug + 'static {
    /// The name used for the field in HTML forms, e.g. "first_name".
    fn name(self) -> &'static str;

    /// Parse a field from its HTML form name.
    ///
    /// Returns `None` if the form has no field called `name`.
    fn from_name(name: &str) -> Option<Self>;

    /// The human readable label shown next to the input, e.g. "First name".
    fn label(self) -> &'static str;

    /// The `type` attribute of the field's input element, or "textarea" for
    /// multi-line text.
    fn input_type(self) -> &'static str {
        "text"
    }
}

/// The values of a form and the rules that check them.
pub trait FormSchema: Clone + Default {
    /// The closed set of fields in this form.
    type Field: FieldName;

    /// Every field of the form in display order.
    const FIELDS: &'static [Self::Field];

    /// The current value of `field`.
    fn value(&self, field: Self::Field) -> &str;

    /// Replace the value of `field`.
    fn set_value(&mut self, field: Self::Field, value: String);

    /// Check the current value of `field`, using the other fields of the form
    /// where the rule needs them.
    ///
    /// Returns an empty string if the value is acceptable.
    fn validate_field(&self, field: Self::Field) -> String;

    /// Fields whose rules read the value of `field` and must be checked again
    /// when it changes.
    fn dependents(_field: Self::Field) -> &'static [Self::Field] {
        &[]
    }
}

/// The error message for each field of a form, where an empty string means
/// there is no error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormErrors<F: FieldName> {
    messages: HashMap<F, String>,
}

impl<F: FieldName> Default for FormErrors<F> {
    fn default() -> Self {
        Self {
            messages: HashMap::new(),
        }
    }
}

impl<F: FieldName> FormErrors<F> {
    /// The error message for `field`, or an empty string if it has none.
    pub fn get(&self, field: F) -> &str {
        self.messages.get(&field).map(String::as_str).unwrap_or("")
    }

    /// The error message for `field` if it has one.
    pub fn message(&self, field: F) -> Option<&str> {
        let message = self.get(field);

        (!message.is_empty()).then_some(message)
    }

    /// Set the error message for `field`. An empty `message` clears the error.
    pub fn set(&mut self, field: F, message: String) {
        self.messages.insert(field, message);
    }

    /// Whether every field is free of errors.
    pub fn is_valid(&self) -> bool {
        self.messages.values().all(String::is_empty)
    }

    /// The number of fields with an error.
    pub fn error_count(&self) -> usize {
        self.messages
            .values()
            .filter(|message| !message.is_empty())
            .count()
    }

    /// The fields that have an error along with their messages.
    pub fn errors(&self) -> impl Iterator<Item = (F, &str)> {
        self.messages
            .iter()
            .filter(|(_, message)| !message.is_empty())
            .map(|(field, message)| (*field, message.as_str()))
    }
}

/// Why a form submission did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError<F: FieldName> {
    /// At least one field failed validation, so nothing was sent.
    Invalid(FormErrors<F>),
    /// The form was valid but the service it was sent to refused it.
    ///
    /// Holds the single message shown above the form.
    Rejected(String),
}

/// Check every field of `form` and collect all the error messages.
///
/// The returned errors contain an entry for every field, so calling this
/// twice with the same form gives equal results.
pub fn validate_form<F: FormSchema>(form: &F) -> FormErrors<F::Field> {
    let mut errors = FormErrors::default();

    for &field in F::FIELDS {
        errors.set(field, form.validate_field(field));
    }

    errors
}
