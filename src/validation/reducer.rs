//! The state of a single form instance and the actions that update it.

use crate::validation::{FormErrors, FormSchema, validate_form};

/// Something that happened to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction<Field> {
    /// The user changed the value of one field.
    FieldChanged { field: Field, value: String },
    /// The user tried to submit the form.
    SubmitAttempted,
    /// The form was submitted successfully or the screen was revisited.
    Reset,
}

/// The values of one form along with the errors currently shown for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormModel<F: FormSchema> {
    pub values: F,
    pub errors: FormErrors<F::Field>,
}

impl<F: FormSchema> Default for FormModel<F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<F: FormSchema> FormModel<F> {
    /// Create a model for a form that has been filled in but not checked yet.
    pub fn new(values: F) -> Self {
        Self {
            values,
            errors: FormErrors::default(),
        }
    }

    /// Update the model in response to `action`.
    ///
    /// - A changed field is checked again, along with any non-empty field
    ///   whose rule depends on it. Errors on other fields are left as is.
    /// - A submit attempt checks every field.
    /// - A reset clears all values and errors.
    pub fn apply(&mut self, action: FormAction<F::Field>) {
        match action {
            FormAction::FieldChanged { field, value } => {
                self.values.set_value(field, value);
                self.errors.set(field, self.values.validate_field(field));

                for &dependent in F::dependents(field) {
                    if !self.values.value(dependent).is_empty() {
                        self.errors
                            .set(dependent, self.values.validate_field(dependent));
                    }
                }
            }
            FormAction::SubmitAttempted => {
                self.errors = validate_form(&self.values);
            }
            FormAction::Reset => {
                *self = Self::default();
            }
        }
    }

    /// Consume the model and return it updated by `action`.
    pub fn reduce(mut self, action: FormAction<F::Field>) -> Self {
        self.apply(action);
        self
    }

    /// Whether the last check found no errors.
    ///
    /// Call this after [FormAction::SubmitAttempted] to decide whether the
    /// form may be sent.
    pub fn is_valid(&self) -> bool {
        self.errors.is_valid()
    }
}
