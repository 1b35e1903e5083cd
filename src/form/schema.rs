use std::collections::BTreeSet;

use super::attachment::AttachmentPolicy;
use super::controller::FieldKey;
use super::state::{FieldError, FieldValue, FormState};
use super::validation::ValidationRule;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Password,
    Select,
    Textarea,
    File,
    Checkbox,
}

impl FieldKind {
    /// Whether `value` has the shape this kind of field stores.
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Empty) => true,
            (FieldKind::File, FieldValue::File(_)) => true,
            (FieldKind::Checkbox, FieldValue::Flag(_)) => true,
            (FieldKind::File | FieldKind::Checkbox, _) => false,
            (_, FieldValue::Text(_)) => true,
            _ => false,
        }
    }

    /// Password and select inputs are compared raw; free text is trimmed
    /// before the required check.
    fn trims_for_required(self) -> bool {
        !matches!(self, FieldKind::Password | FieldKind::Select)
    }
}

/// Declarative description of one form field and its validation rules.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    key: FieldKey,
    kind: FieldKind,
    required: bool,
    required_message: Option<String>,
    label: Option<String>,
    description: Option<String>,
    options: Vec<String>,
    default_value: FieldValue,
    validators: Vec<ValidationRule>,
}

impl FieldSpec {
    pub fn new(key: impl Into<FieldKey>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            required: false,
            required_message: None,
            label: None,
            description: None,
            options: Vec::new(),
            default_value: FieldValue::Empty,
            validators: Vec::new(),
        }
    }

    pub fn text(key: impl Into<FieldKey>) -> Self {
        Self::new(key, FieldKind::Text)
    }

    pub fn email(key: impl Into<FieldKey>) -> Self {
        Self::new(key, FieldKind::Email)
    }

    pub fn phone(key: impl Into<FieldKey>) -> Self {
        Self::new(key, FieldKind::Phone)
    }

    pub fn password(key: impl Into<FieldKey>) -> Self {
        Self::new(key, FieldKind::Password)
    }

    pub fn select(key: impl Into<FieldKey>) -> Self {
        Self::new(key, FieldKind::Select)
    }

    pub fn textarea(key: impl Into<FieldKey>) -> Self {
        Self::new(key, FieldKind::Textarea)
    }

    pub fn file(key: impl Into<FieldKey>) -> Self {
        Self::new(key, FieldKind::File)
    }

    pub fn checkbox(key: impl Into<FieldKey>) -> Self {
        Self::new(key, FieldKind::Checkbox).default_value(false)
    }

    pub fn label(mut self, value: impl Into<String>) -> Self {
        self.label = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field required and replaces the derived "{label} is
    /// required" message.
    pub fn required_message(mut self, message: impl Into<String>) -> Self {
        self.required = true;
        self.required_message = Some(message.into());
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.validators.push(rule);
        self
    }

    /// Appends the size rule followed by the type rule, so an oversized file
    /// reports the size message even when its type is also rejected.
    pub fn attachment_policy(self, policy: &AttachmentPolicy) -> Self {
        self.rule(ValidationRule::max_file_size(policy.max_bytes))
            .rule(ValidationRule::allowed_mime_types(
                policy.allowed_mime_types.iter().cloned(),
            ))
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn label_text(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| humanize_key(self.key.as_str()))
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn option_values(&self) -> &[String] {
        &self.options
    }

    pub fn initial_value(&self) -> &FieldValue {
        &self.default_value
    }

    pub fn validators(&self) -> &[ValidationRule] {
        &self.validators
    }

    /// Runs the required check and then each rule in declaration order,
    /// stopping at the first failure.
    pub fn check(&self, value: &FieldValue, form: &FormState) -> Result<(), FieldError> {
        if self.required && self.is_missing(value) {
            return Err(FieldError::new(self.required_message.clone().unwrap_or_else(
                || format!("{} is required", self.label_text()),
            )));
        }
        for rule in &self.validators {
            if value.is_unset() && !rule.runs_on_unset() {
                continue;
            }
            rule.check(self, value, form)?;
        }
        Ok(())
    }

    fn is_missing(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Empty => true,
            FieldValue::Text(text) if self.kind.trims_for_required() => text.trim().is_empty(),
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Flag(flag) => !flag,
            FieldValue::File(_) => false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate field key `{0}` in form schema")]
    DuplicateKey(FieldKey),
    #[error("field `{field}` references unknown field `{reference}`")]
    UnknownReference { field: FieldKey, reference: FieldKey },
}

pub(super) fn check_schema(fields: &[FieldSpec]) -> Result<(), SchemaError> {
    let mut keys = BTreeSet::new();
    for spec in fields {
        if !keys.insert(spec.key) {
            return Err(SchemaError::DuplicateKey(spec.key));
        }
    }
    for spec in fields {
        for reference in spec.validators.iter().filter_map(ValidationRule::referenced_field) {
            if !keys.contains(&reference) {
                return Err(SchemaError::UnknownReference {
                    field: spec.key,
                    reference,
                });
            }
        }
    }
    Ok(())
}

/// `confirmPassword` / `confirm_password` → `Confirm password`.
pub(super) fn humanize_key(key: &str) -> String {
    let mut words = String::with_capacity(key.len() + 4);
    for (index, ch) in key.chars().enumerate() {
        if ch == '_' || ch == '-' {
            words.push(' ');
        } else if ch.is_uppercase() {
            if index > 0 && !words.ends_with(' ') {
                words.push(' ');
            }
            words.extend(ch.to_lowercase());
        } else {
            words.push(ch);
        }
    }
    let mut chars = words.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanized_labels_read_like_page_messages() {
        assert_eq!(humanize_key("fullName"), "Full name");
        assert_eq!(humanize_key("confirm_password"), "Confirm password");
        assert_eq!(humanize_key("biz-cert"), "Biz cert");
        assert_eq!(humanize_key("email"), "Email");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let error = check_schema(&[FieldSpec::text("name"), FieldSpec::email("name")])
            .expect_err("duplicate key must fail");
        assert_eq!(error, SchemaError::DuplicateKey(FieldKey::new("name")));
    }

    #[test]
    fn equals_field_must_reference_a_declared_key() {
        let error = check_schema(&[
            FieldSpec::password("confirm").rule(ValidationRule::equals_field("password"))
        ])
        .expect_err("dangling reference must fail");
        assert_eq!(
            error,
            SchemaError::UnknownReference {
                field: FieldKey::new("confirm"),
                reference: FieldKey::new("password"),
            }
        );
    }

    #[test]
    fn kinds_reject_mismatched_values() {
        assert!(FieldKind::Text.accepts(&FieldValue::from("x")));
        assert!(!FieldKind::Text.accepts(&FieldValue::Flag(true)));
        assert!(FieldKind::Checkbox.accepts(&FieldValue::Flag(false)));
        assert!(!FieldKind::File.accepts(&FieldValue::from("x")));
        assert!(FieldKind::File.accepts(&FieldValue::Empty));
    }

    #[test]
    fn password_required_check_does_not_trim() {
        let spec = FieldSpec::password("password").required();
        let form = FormState::new();
        assert!(spec.check(&FieldValue::from("   "), &form).is_ok());

        let name = FieldSpec::text("name").required();
        assert_eq!(
            name.check(&FieldValue::from("   "), &form)
                .expect_err("blank name fails")
                .message(),
            "Name is required"
        );
    }
}
