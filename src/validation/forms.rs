//! The forms in the app and the rule for each of their fields.

use serde::{Deserialize, Serialize};

use crate::validation::{
    FieldName, FormSchema,
    rules::{
        validate_confirm_password, validate_email, validate_mobile_no, validate_name,
        validate_password, validate_required,
    },
};

/// The fields of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationField {
    FirstName,
    LastName,
    MobileNo,
    Email,
    Password,
    ConfirmPassword,
    ImageUri,
}

impl FieldName for RegistrationField {
    fn name(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::MobileNo => "mobile_no",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
            Self::ImageUri => "image_uri",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        RegistrationForm::FIELDS
            .iter()
            .copied()
            .find(|field| field.name() == name)
    }

    fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::MobileNo => "Mobile number",
            Self::Email => "Email",
            Self::Password => "Password",
            Self::ConfirmPassword => "Confirm password",
            Self::ImageUri => "Profile image",
        }
    }

    fn input_type(self) -> &'static str {
        match self {
            Self::MobileNo => "tel",
            Self::Email => "email",
            Self::Password | Self::ConfirmPassword => "password",
            Self::ImageUri => "url",
            Self::FirstName | Self::LastName => "text",
        }
    }
}

/// The values entered in the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub mobile_no: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// The URI of the selected profile image.
    pub image_uri: String,
}

impl FormSchema for RegistrationForm {
    type Field = RegistrationField;

    const FIELDS: &'static [RegistrationField] = &[
        RegistrationField::FirstName,
        RegistrationField::LastName,
        RegistrationField::MobileNo,
        RegistrationField::Email,
        RegistrationField::Password,
        RegistrationField::ConfirmPassword,
        RegistrationField::ImageUri,
    ];

    fn value(&self, field: RegistrationField) -> &str {
        match field {
            RegistrationField::FirstName => &self.first_name,
            RegistrationField::LastName => &self.last_name,
            RegistrationField::MobileNo => &self.mobile_no,
            RegistrationField::Email => &self.email,
            RegistrationField::Password => &self.password,
            RegistrationField::ConfirmPassword => &self.confirm_password,
            RegistrationField::ImageUri => &self.image_uri,
        }
    }

    fn set_value(&mut self, field: RegistrationField, value: String) {
        match field {
            RegistrationField::FirstName => self.first_name = value,
            RegistrationField::LastName => self.last_name = value,
            RegistrationField::MobileNo => self.mobile_no = value,
            RegistrationField::Email => self.email = value,
            RegistrationField::Password => self.password = value,
            RegistrationField::ConfirmPassword => self.confirm_password = value,
            RegistrationField::ImageUri => self.image_uri = value,
        }
    }

    fn validate_field(&self, field: RegistrationField) -> String {
        let value = self.value(field);

        match field {
            RegistrationField::FirstName | RegistrationField::LastName => {
                validate_name(field.label(), value)
            }
            RegistrationField::MobileNo => validate_mobile_no(value),
            RegistrationField::Email => validate_email(value),
            RegistrationField::Password => validate_password(value),
            RegistrationField::ConfirmPassword => validate_confirm_password(value, &self.password),
            RegistrationField::ImageUri => validate_required(field.label(), value),
        }
    }

    fn dependents(field: RegistrationField) -> &'static [RegistrationField] {
        match field {
            RegistrationField::Password => &[RegistrationField::ConfirmPassword],
            _ => &[],
        }
    }
}

/// The fields of the log-in form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogInField {
    Email,
    Password,
}

impl FieldName for LogInField {
    fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        LogInForm::FIELDS
            .iter()
            .copied()
            .find(|field| field.name() == name)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Password => "Password",
        }
    }

    fn input_type(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

/// The credentials entered in the log-in form.
///
/// Only the presence of the password is checked here, whether it is correct
/// is up to the authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogInForm {
    pub email: String,
    pub password: String,
}

impl FormSchema for LogInForm {
    type Field = LogInField;

    const FIELDS: &'static [LogInField] = &[LogInField::Email, LogInField::Password];

    fn value(&self, field: LogInField) -> &str {
        match field {
            LogInField::Email => &self.email,
            LogInField::Password => &self.password,
        }
    }

    fn set_value(&mut self, field: LogInField, value: String) {
        match field {
            LogInField::Email => self.email = value,
            LogInField::Password => self.password = value,
        }
    }

    fn validate_field(&self, field: LogInField) -> String {
        match field {
            LogInField::Email => validate_email(&self.email),
            LogInField::Password => validate_required(field.label(), &self.password),
        }
    }
}

/// The fields of the profile form that the user may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    FirstName,
    LastName,
    MobileNo,
}

impl FieldName for ProfileField {
    fn name(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::MobileNo => "mobile_no",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        ProfileForm::FIELDS
            .iter()
            .copied()
            .find(|field| field.name() == name)
    }

    fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::MobileNo => "Mobile number",
        }
    }

    fn input_type(self) -> &'static str {
        match self {
            Self::MobileNo => "tel",
            _ => "text",
        }
    }
}

/// The editable profile details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub mobile_no: String,
}

impl FormSchema for ProfileForm {
    type Field = ProfileField;

    const FIELDS: &'static [ProfileField] = &[
        ProfileField::FirstName,
        ProfileField::LastName,
        ProfileField::MobileNo,
    ];

    fn value(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::FirstName => &self.first_name,
            ProfileField::LastName => &self.last_name,
            ProfileField::MobileNo => &self.mobile_no,
        }
    }

    fn set_value(&mut self, field: ProfileField, value: String) {
        match field {
            ProfileField::FirstName => self.first_name = value,
            ProfileField::LastName => self.last_name = value,
            ProfileField::MobileNo => self.mobile_no = value,
        }
    }

    fn validate_field(&self, field: ProfileField) -> String {
        match field {
            ProfileField::FirstName | ProfileField::LastName => {
                validate_name(field.label(), self.value(field))
            }
            ProfileField::MobileNo => validate_mobile_no(&self.mobile_no),
        }
    }
}

/// The text fields of the new post form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostField {
    Title,
    Photo,
    Slug,
    Description,
}

impl FieldName for PostField {
    fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Photo => "photo",
            Self::Slug => "slug",
            Self::Description => "description",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        PostForm::FIELDS
            .iter()
            .copied()
            .find(|field| field.name() == name)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Photo => "Photo",
            Self::Slug => "Slug",
            Self::Description => "Description",
        }
    }

    fn input_type(self) -> &'static str {
        match self {
            Self::Photo => "url",
            Self::Description => "textarea",
            Self::Title | Self::Slug => "text",
        }
    }
}

/// The values entered in the new post form.
///
/// Tagged users are edited separately and are not part of the validated
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    /// The URI of the selected photo.
    pub photo: String,
    /// The user supplied part of the slug.
    pub slug: String,
    pub description: String,
}

impl FormSchema for PostForm {
    type Field = PostField;

    const FIELDS: &'static [PostField] = &[
        PostField::Title,
        PostField::Photo,
        PostField::Slug,
        PostField::Description,
    ];

    fn value(&self, field: PostField) -> &str {
        match field {
            PostField::Title => &self.title,
            PostField::Photo => &self.photo,
            PostField::Slug => &self.slug,
            PostField::Description => &self.description,
        }
    }

    fn set_value(&mut self, field: PostField, value: String) {
        match field {
            PostField::Title => self.title = value,
            PostField::Photo => self.photo = value,
            PostField::Slug => self.slug = value,
            PostField::Description => self.description = value,
        }
    }

    fn validate_field(&self, field: PostField) -> String {
        match field {
            PostField::Title | PostField::Photo => {
                validate_required(field.label(), self.value(field))
            }
            PostField::Slug | PostField::Description => String::new(),
        }
    }
}
