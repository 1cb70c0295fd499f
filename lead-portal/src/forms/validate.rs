//! Field validation rules for the login and signup forms.
//!
//! Every rule is a pure function of the value (and, for `confirmPassword`,
//! the current password). "Required" checks trim the value; length and
//! pattern checks look at the raw value, except the full-name length check.

use super::field::{FieldValue, FormField, FormValues};
use once_cell::sync::Lazy;
use regex::Regex;

/// Shown when the email is blank.
pub const EMAIL_REQUIRED: &str = "Email is required";
/// Shown when the email does not look like `local@domain.tld`.
pub const EMAIL_INVALID: &str = "Please enter a valid email";
/// Shown when the password is blank.
pub const PASSWORD_REQUIRED: &str = "Password is required";
/// Login password shorter than six characters.
pub const LOGIN_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
/// Signup password shorter than eight characters.
pub const SIGNUP_PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
/// Signup password without a lowercase letter.
pub const PASSWORD_NEEDS_LOWERCASE: &str = "Password must contain a lowercase letter";
/// Signup password without an uppercase letter.
pub const PASSWORD_NEEDS_UPPERCASE: &str = "Password must contain an uppercase letter";
/// Signup password without a digit.
pub const PASSWORD_NEEDS_DIGIT: &str = "Password must contain a number";
/// Shown when the full name is blank.
pub const FULL_NAME_REQUIRED: &str = "Full name is required";
/// Trimmed full name shorter than two characters.
pub const FULL_NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
/// Full name with anything but letters and whitespace.
pub const FULL_NAME_INVALID: &str = "Name should only contain letters";
/// Shown when the confirmation is blank.
pub const CONFIRM_REQUIRED: &str = "Please confirm your password";
/// Confirmation differs from the password.
pub const PASSWORDS_DIFFER: &str = "Passwords do not match";
/// Terms checkbox left unchecked.
pub const TERMS_REQUIRED: &str = "You must agree to the terms and conditions";

const LOGIN_PASSWORD_MIN: usize = 6;
const SIGNUP_PASSWORD_MIN: usize = 8;
const FULL_NAME_MIN: usize = 2;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static FULL_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("valid name pattern"));

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Length as browsers count it, in UTF-16 code units.
fn length(value: &str) -> usize {
    value.encode_utf16().count()
}

/// Email rule shared by both forms.
#[must_use]
pub fn validate_email(value: &str) -> Option<&'static str> {
    if is_blank(value) {
        return Some(EMAIL_REQUIRED);
    }
    if !EMAIL_PATTERN.is_match(value) {
        return Some(EMAIL_INVALID);
    }
    None
}

/// Login password rule.
#[must_use]
pub fn validate_login_password(value: &str) -> Option<&'static str> {
    if is_blank(value) {
        return Some(PASSWORD_REQUIRED);
    }
    if length(value) < LOGIN_PASSWORD_MIN {
        return Some(LOGIN_PASSWORD_TOO_SHORT);
    }
    None
}

/// Signup password rule: length, then lowercase, uppercase and digit, first
/// failure wins.
#[must_use]
pub fn validate_signup_password(value: &str) -> Option<&'static str> {
    if is_blank(value) {
        return Some(PASSWORD_REQUIRED);
    }
    if length(value) < SIGNUP_PASSWORD_MIN {
        return Some(SIGNUP_PASSWORD_TOO_SHORT);
    }
    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        return Some(PASSWORD_NEEDS_LOWERCASE);
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Some(PASSWORD_NEEDS_UPPERCASE);
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Some(PASSWORD_NEEDS_DIGIT);
    }
    None
}

/// Full-name rule.
#[must_use]
pub fn validate_full_name(value: &str) -> Option<&'static str> {
    if is_blank(value) {
        return Some(FULL_NAME_REQUIRED);
    }
    if length(value.trim()) < FULL_NAME_MIN {
        return Some(FULL_NAME_TOO_SHORT);
    }
    if !FULL_NAME_PATTERN.is_match(value) {
        return Some(FULL_NAME_INVALID);
    }
    None
}

/// Confirmation rule against the current password.
#[must_use]
pub fn validate_confirm_password(value: &str, password: &str) -> Option<&'static str> {
    if is_blank(value) {
        return Some(CONFIRM_REQUIRED);
    }
    if value != password {
        return Some(PASSWORDS_DIFFER);
    }
    None
}

/// Terms checkbox rule.
#[must_use]
pub const fn validate_agree_terms(checked: bool) -> Option<&'static str> {
    if checked {
        None
    } else {
        Some(TERMS_REQUIRED)
    }
}

/// Fields of the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginField {
    /// `email`
    Email,
    /// `password`
    Password,
}

impl FormField for LoginField {
    const ALL: &'static [Self] = &[Self::Email, Self::Password];

    fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
        }
    }

    fn validate(self, value: &FieldValue, _context: &FormValues<Self>) -> Option<&'static str> {
        match self {
            Self::Email => validate_email(value.as_text()),
            Self::Password => validate_login_password(value.as_text()),
        }
    }
}

/// Fields of the signup form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignupField {
    /// `fullName`
    FullName,
    /// `email`
    Email,
    /// `password`
    Password,
    /// `confirmPassword`
    ConfirmPassword,
    /// `agreeTerms`
    AgreeTerms,
}

impl FormField for SignupField {
    const ALL: &'static [Self] = &[
        Self::FullName,
        Self::Email,
        Self::Password,
        Self::ConfirmPassword,
        Self::AgreeTerms,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
            Self::AgreeTerms => "agreeTerms",
        }
    }

    fn initial_value(self) -> FieldValue {
        match self {
            Self::AgreeTerms => FieldValue::Flag(false),
            _ => FieldValue::Text(String::new()),
        }
    }

    fn dependents(self) -> &'static [Self] {
        match self {
            Self::Password => &[Self::ConfirmPassword],
            _ => &[],
        }
    }

    fn validate(self, value: &FieldValue, context: &FormValues<Self>) -> Option<&'static str> {
        match self {
            Self::FullName => validate_full_name(value.as_text()),
            Self::Email => validate_email(value.as_text()),
            Self::Password => validate_signup_password(value.as_text()),
            Self::ConfirmPassword => {
                validate_confirm_password(value.as_text(), context.text(Self::Password))
            }
            Self::AgreeTerms => validate_agree_terms(value.is_truthy()),
        }
    }

    fn validate_as_dependent(
        self,
        value: &FieldValue,
        context: &FormValues<Self>,
    ) -> Option<&'static str> {
        match self {
            // A blank confirmation is only reported when it is left
            Self::ConfirmPassword if value.as_text().is_empty() => None,
            _ => self.validate(value, context),
        }
    }
}
