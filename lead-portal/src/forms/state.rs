//! Form state store: values, touched flags, errors and submission status for
//! one form instance.

use super::field::{FieldValue, FormField, FormValues};
use std::collections::{HashMap, HashSet};

/// Shown when a submission fails for an unexpected reason.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

/// Current validation message per field. A missing entry means valid.
pub type ErrorMap<F> = HashMap<F, &'static str>;

/// Lifecycle of one submit attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// Nothing submitted yet, or the last attempt was blocked by validation.
    #[default]
    Idle,
    /// A submission is in flight; inputs are disabled.
    Submitting,
    /// The last submission went through.
    Succeeded,
    /// The last submission failed with a user-facing message.
    Failed(String),
}

impl SubmissionStatus {
    /// Whether inputs and the submit action are disabled.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// Failure banner text, if the last attempt failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// State of one form instance.
#[derive(Debug, Clone)]
pub struct FormState<F: FormField> {
    values: FormValues<F>,
    touched: HashSet<F>,
    errors: ErrorMap<F>,
    status: SubmissionStatus,
}

impl<F: FormField> FormState<F> {
    /// Fresh form with initial values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: FormValues::initial(),
            touched: HashSet::new(),
            errors: HashMap::new(),
            status: SubmissionStatus::Idle,
        }
    }

    /// Current values.
    #[must_use]
    pub const fn values(&self) -> &FormValues<F> {
        &self.values
    }

    /// Current error map, including errors of untouched fields.
    #[must_use]
    pub const fn errors(&self) -> &ErrorMap<F> {
        &self.errors
    }

    /// Current submission status.
    #[must_use]
    pub const fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Whether the user has left this field at least once.
    #[must_use]
    pub fn is_touched(&self, field: F) -> bool {
        self.touched.contains(&field)
    }

    /// Error to display for a field: only once the field is touched.
    #[must_use]
    pub fn visible_error(&self, field: F) -> Option<&'static str> {
        if self.is_touched(field) {
            self.errors.get(&field).copied()
        } else {
            None
        }
    }

    /// Whether inputs currently accept events.
    #[must_use]
    pub const fn accepts_input(&self) -> bool {
        !self.status.is_submitting()
    }

    /// The user edited a field.
    ///
    /// Re-validates the field if it was touched, and every touched field
    /// that depends on it against the updated values.
    pub fn on_change(&mut self, field: F, value: FieldValue) {
        if !self.accepts_input() {
            tracing::debug!(field = field.name(), "Change ignored while submitting");
            return;
        }

        self.values.set(field, value);

        if self.is_touched(field) {
            self.revalidate(field);
        }
        for &dependent in field.dependents() {
            if self.is_touched(dependent) {
                let result =
                    dependent.validate_as_dependent(self.values.get(dependent), &self.values);
                self.record(dependent, result);
            }
        }
    }

    /// The user left a field: mark it touched and validate it.
    pub fn on_blur(&mut self, field: F, value: FieldValue) {
        if !self.accepts_input() {
            tracing::debug!(field = field.name(), "Blur ignored while submitting");
            return;
        }

        self.values.set(field, value);
        self.touched.insert(field);
        self.revalidate(field);
    }

    /// Validate every field and mark all of them touched.
    pub fn validate_all(&mut self) -> &ErrorMap<F> {
        self.errors = F::ALL
            .iter()
            .filter_map(|&field| {
                field
                    .validate(self.values.get(field), &self.values)
                    .map(|message| (field, message))
            })
            .collect();
        self.touched.extend(F::ALL.iter().copied());
        &self.errors
    }

    /// Back to initial values with nothing touched.
    pub fn reset(&mut self) {
        self.values = FormValues::initial();
        self.touched.clear();
        self.errors.clear();
    }

    /// Enter `Submitting`. The returned guard must be completed with the
    /// terminal status; if it is dropped first, the attempt counts as an
    /// unexpected failure.
    pub fn begin_submission(&mut self) -> SubmissionGuard<'_> {
        self.status = SubmissionStatus::Submitting;
        SubmissionGuard {
            status: &mut self.status,
        }
    }

    fn revalidate(&mut self, field: F) {
        let result = field.validate(self.values.get(field), &self.values);
        self.record(field, result);
    }

    fn record(&mut self, field: F, result: Option<&'static str>) {
        match result {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }
}

impl<F: FormField> Default for FormState<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a submission from staying in `Submitting` on any exit path.
#[derive(Debug)]
pub struct SubmissionGuard<'a> {
    status: &'a mut SubmissionStatus,
}

impl SubmissionGuard<'_> {
    /// Record the terminal status of the attempt.
    pub fn complete(self, status: SubmissionStatus) {
        *self.status = status;
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if self.status.is_submitting() {
            tracing::warn!("Submission abandoned before completing");
            *self.status = SubmissionStatus::Failed(UNEXPECTED_ERROR.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::validate::{
        LoginField, SignupField, CONFIRM_REQUIRED, EMAIL_INVALID, EMAIL_REQUIRED,
        LOGIN_PASSWORD_TOO_SHORT, PASSWORDS_DIFFER, PASSWORD_REQUIRED,
    };
    use proptest::prelude::*;

    #[test]
    fn test_errors_hidden_until_touched() {
        let mut form = FormState::<LoginField>::new();
        form.on_change(LoginField::Email, "bad".into());

        assert!(!form.is_touched(LoginField::Email));
        assert_eq!(form.visible_error(LoginField::Email), None);
        assert!(form.errors().is_empty());

        form.on_blur(LoginField::Email, "bad".into());
        assert_eq!(form.visible_error(LoginField::Email), Some(EMAIL_INVALID));
    }

    #[test]
    fn test_change_on_touched_field_revalidates() {
        let mut form = FormState::<LoginField>::new();
        form.on_blur(LoginField::Email, "".into());
        assert_eq!(form.visible_error(LoginField::Email), Some(EMAIL_REQUIRED));

        form.on_change(LoginField::Email, "ann@example.com".into());
        assert_eq!(form.visible_error(LoginField::Email), None);
        assert_eq!(form.values().text(LoginField::Email), "ann@example.com");
    }

    #[test]
    fn test_password_change_revalidates_touched_confirmation() {
        let mut form = FormState::<SignupField>::new();
        form.on_change(SignupField::Password, "Secret123".into());
        form.on_blur(SignupField::ConfirmPassword, "Secret123".into());
        assert_eq!(form.visible_error(SignupField::ConfirmPassword), None);

        form.on_change(SignupField::Password, "Secret1234".into());
        assert_eq!(
            form.visible_error(SignupField::ConfirmPassword),
            Some(PASSWORDS_DIFFER)
        );

        form.on_change(SignupField::Password, "Secret123".into());
        assert_eq!(form.visible_error(SignupField::ConfirmPassword), None);
    }

    #[test]
    fn test_password_change_clears_blank_confirmation_error() {
        let mut form = FormState::<SignupField>::new();
        form.on_blur(SignupField::ConfirmPassword, String::new().into());
        assert_eq!(
            form.visible_error(SignupField::ConfirmPassword),
            Some(CONFIRM_REQUIRED)
        );

        form.on_change(SignupField::Password, "Secret123".into());
        assert_eq!(form.visible_error(SignupField::ConfirmPassword), None);

        // Leaving the blank confirmation again still reports it
        form.on_blur(SignupField::ConfirmPassword, String::new().into());
        assert_eq!(
            form.visible_error(SignupField::ConfirmPassword),
            Some(CONFIRM_REQUIRED)
        );
    }

    #[test]
    fn test_password_change_leaves_untouched_confirmation_alone() {
        let mut form = FormState::<SignupField>::new();
        form.on_change(SignupField::ConfirmPassword, "Secret123".into());
        form.on_change(SignupField::Password, "Different1".into());
        assert!(form.errors().get(&SignupField::ConfirmPassword).is_none());
    }

    #[test]
    fn test_validate_all_marks_everything_touched() {
        let mut form = FormState::<LoginField>::new();
        form.on_change(LoginField::Email, "bad".into());
        form.on_change(LoginField::Password, "x".into());

        let errors = form.validate_all().clone();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[&LoginField::Email], EMAIL_INVALID);
        assert_eq!(errors[&LoginField::Password], LOGIN_PASSWORD_TOO_SHORT);
        assert!(form.is_touched(LoginField::Email));
        assert!(form.is_touched(LoginField::Password));
        assert_eq!(form.status(), &SubmissionStatus::Idle);
    }

    #[test]
    fn test_reset_clears_values_and_touched() {
        let mut form = FormState::<SignupField>::new();
        form.on_blur(SignupField::FullName, "Ann Lee".into());
        form.on_blur(SignupField::AgreeTerms, true.into());
        form.reset();

        assert_eq!(form.values(), &FormValues::initial());
        assert!(!form.is_touched(SignupField::FullName));
        assert!(!form.values().flag(SignupField::AgreeTerms));
    }

    #[test]
    fn test_inputs_ignored_while_submitting() {
        let mut form = FormState::<LoginField>::new();
        form.status = SubmissionStatus::Submitting;
        form.on_blur(LoginField::Password, "".into());
        form.on_change(LoginField::Email, "x".into());

        assert!(!form.is_touched(LoginField::Password));
        assert_eq!(form.values().text(LoginField::Email), "");
        assert!(form.errors().get(&LoginField::Password).is_none());
        assert!(!form.accepts_input());
    }

    #[test]
    fn test_guard_completes_with_status() {
        let mut form = FormState::<LoginField>::new();
        let guard = form.begin_submission();
        guard.complete(SubmissionStatus::Succeeded);
        assert_eq!(form.status(), &SubmissionStatus::Succeeded);
    }

    #[test]
    fn test_dropped_guard_fails_submission() {
        let mut form = FormState::<LoginField>::new();
        {
            let _guard = form.begin_submission();
        }
        assert_eq!(form.status().failure(), Some(UNEXPECTED_ERROR));
    }

    #[test]
    fn test_blur_required_message() {
        let mut form = FormState::<LoginField>::new();
        form.on_blur(LoginField::Password, "   ".into());
        assert_eq!(form.visible_error(LoginField::Password), Some(PASSWORD_REQUIRED));
    }

    proptest! {
        #[test]
        fn prop_blur_is_idempotent(field_index in 0usize..5, value in ".{0,16}") {
            let field = SignupField::ALL[field_index];
            let mut once = FormState::<SignupField>::new();
            once.on_blur(field, value.clone().into());

            let mut twice = once.clone();
            twice.on_blur(field, value.into());

            prop_assert_eq!(once.errors(), twice.errors());
            prop_assert_eq!(&once.touched, &twice.touched);
            prop_assert_eq!(once.values(), twice.values());
        }

        #[test]
        fn prop_visible_error_requires_touch(values in proptest::collection::vec(".{0,12}", 5)) {
            let mut form = FormState::<SignupField>::new();
            for (&field, value) in SignupField::ALL.iter().zip(values) {
                form.on_change(field, value.into());
            }
            for &field in SignupField::ALL {
                prop_assert!(form.visible_error(field).is_none());
            }
        }
    }
}
