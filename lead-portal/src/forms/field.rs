//! Field identifiers and form values.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Value held by one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text input.
    Text(String),
    /// Checkbox.
    Flag(bool),
}

static EMPTY: FieldValue = FieldValue::Text(String::new());

impl FieldValue {
    /// Text content; checkboxes read as the empty string.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Flag(_) => "",
        }
    }

    /// Whether the value counts as checked. Text is checked when non-empty.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(text) => !text.is_empty(),
            Self::Flag(flag) => *flag,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

/// The fields of one kind of form, with their validation rules.
pub trait FormField: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every field, in display order.
    const ALL: &'static [Self];

    /// Name used in markup and requests.
    fn name(self) -> &'static str;

    /// Look a field up by its markup name.
    #[must_use]
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }

    /// Value the field starts with.
    fn initial_value(self) -> FieldValue {
        FieldValue::Text(String::new())
    }

    /// Fields whose validity depends on this field's value.
    fn dependents(self) -> &'static [Self] {
        &[]
    }

    /// Validate `value` for this field, with the rest of the form as context.
    /// Returns the message to show, or `None` when valid.
    fn validate(self, value: &FieldValue, context: &FormValues<Self>) -> Option<&'static str>;

    /// Validate this field after a field it depends on changed.
    fn validate_as_dependent(
        self,
        value: &FieldValue,
        context: &FormValues<Self>,
    ) -> Option<&'static str> {
        self.validate(value, context)
    }
}

/// Current values of every field of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues<F: FormField> {
    values: HashMap<F, FieldValue>,
}

impl<F: FormField> FormValues<F> {
    /// Every field at its initial value.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            values: F::ALL
                .iter()
                .map(|&field| (field, field.initial_value()))
                .collect(),
        }
    }

    /// Value of a field.
    #[must_use]
    pub fn get(&self, field: F) -> &FieldValue {
        self.values.get(&field).unwrap_or(&EMPTY)
    }

    /// Text of a field.
    #[must_use]
    pub fn text(&self, field: F) -> &str {
        self.get(field).as_text()
    }

    /// Checkbox state of a field.
    #[must_use]
    pub fn flag(&self, field: F) -> bool {
        self.get(field).is_truthy()
    }

    /// Replace a field's value.
    pub fn set(&mut self, field: F, value: FieldValue) {
        self.values.insert(field, value);
    }

    /// Fields and values in display order.
    pub fn iter(&self) -> impl Iterator<Item = (F, &FieldValue)> + '_ {
        F::ALL.iter().map(move |&field| (field, self.get(field)))
    }
}

impl<F: FormField> Default for FormValues<F> {
    fn default() -> Self {
        Self::initial()
    }
}
