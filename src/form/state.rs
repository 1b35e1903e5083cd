use std::collections::BTreeMap;
use std::collections::btree_map;

use super::attachment::FileHandle;
use super::controller::FieldKey;

/// Current value of a single field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Flag(bool),
    File(FileHandle),
}

impl FieldValue {
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(text) => text,
            _ => "",
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    pub fn as_file(&self) -> Option<&FileHandle> {
        match self {
            FieldValue::File(file) => Some(file),
            _ => None,
        }
    }

    /// True for values the user never filled in. Whitespace-only text is
    /// still considered set.
    pub fn is_unset(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Flag(_) | FieldValue::File(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<FileHandle> for FieldValue {
    fn from(value: FileHandle) -> Self {
        FieldValue::File(value)
    }
}

/// Field values of one form, keyed by field key.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormState {
    values: BTreeMap<FieldKey, FieldValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &str) -> &str {
        self.get(key).map(FieldValue::as_text).unwrap_or_default()
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(FieldValue::as_flag)
    }

    pub fn file(&self, key: &str) -> Option<&FileHandle> {
        self.get(key).and_then(FieldValue::as_file)
    }

    pub fn insert(&mut self, key: FieldKey, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.values.insert(key, value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, FieldKey, FieldValue> {
        self.values.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for FormState
where
    K: Into<FieldKey>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// A user-facing validation failure for one field.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Visible error messages, at most one per field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorState {
    errors: BTreeMap<FieldKey, FieldError>,
}

impl ErrorState {
    pub fn get(&self, key: &str) -> Option<&FieldError> {
        self.errors.get(key)
    }

    pub fn message(&self, key: &str) -> Option<&str> {
        self.get(key).map(FieldError::message)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.errors.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.errors.keys().copied()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, FieldKey, FieldError> {
        self.errors.iter()
    }

    pub(super) fn insert(&mut self, key: FieldKey, error: FieldError) {
        self.errors.insert(key, error);
    }

    pub(super) fn remove(&mut self, key: &str) -> Option<FieldError> {
        self.errors.remove(key)
    }

    pub(super) fn clear(&mut self) {
        self.errors.clear();
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationResult {
    pub ok: bool,
    pub errors: ErrorState,
}

impl ValidationResult {
    pub(super) fn from_errors(errors: ErrorState) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }
}
