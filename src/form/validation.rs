use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use rust_decimal::Decimal;

use super::attachment::{AttachmentError, FileCandidate, describe_mime_types};
use super::controller::FieldKey;
use super::schema::FieldSpec;
use super::state::{ErrorState, FieldError, FieldValue, FormState};

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile")
});

const PHONE_DIGITS: usize = 10;

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_email_shape(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value)
}

/// Exactly ten digits once every non-digit character is dropped.
pub fn is_phone_shape(value: &str) -> bool {
    value.chars().filter(char::is_ascii_digit).count() == PHONE_DIGITS
}

/// User-supplied rule with read access to the whole form.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: &FieldValue, form: &FormState) -> Result<(), String>;
}

impl<F> FieldValidator for F
where
    F: Fn(&FieldValue, &FormState) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, value: &FieldValue, form: &FormState) -> Result<(), String> {
        (self)(value, form)
    }
}

#[derive(Clone)]
enum RuleKind {
    MinLength { min: usize, trim: bool },
    EmailShape,
    PhoneShape,
    EqualsField(FieldKey),
    MaxFileSize(u64),
    AllowedMimeTypes(Vec<String>),
    PositiveNumber,
    NonNegativeNumber,
    OneOf,
    Custom(Arc<dyn FieldValidator>),
}

/// One check applied to a field value. Rules run in declaration order and the
/// first failure is the only one reported.
#[derive(Clone)]
pub struct ValidationRule {
    kind: RuleKind,
    message: Option<String>,
}

impl ValidationRule {
    fn from_kind(kind: RuleKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Trimmed character count must be at least `min`.
    pub fn min_length(min: usize) -> Self {
        Self::from_kind(RuleKind::MinLength { min, trim: true })
    }

    /// Like [`ValidationRule::min_length`] but counts surrounding whitespace,
    /// which is how password lengths are measured.
    pub fn min_length_raw(min: usize) -> Self {
        Self::from_kind(RuleKind::MinLength { min, trim: false })
    }

    pub fn email() -> Self {
        Self::from_kind(RuleKind::EmailShape)
    }

    pub fn phone() -> Self {
        Self::from_kind(RuleKind::PhoneShape)
    }

    /// Exact match against another field's value at validation time.
    pub fn equals_field(other: impl Into<FieldKey>) -> Self {
        Self::from_kind(RuleKind::EqualsField(other.into()))
    }

    pub fn max_file_size(max_bytes: u64) -> Self {
        Self::from_kind(RuleKind::MaxFileSize(max_bytes))
    }

    pub fn allowed_mime_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_kind(RuleKind::AllowedMimeTypes(
            types.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn positive_number() -> Self {
        Self::from_kind(RuleKind::PositiveNumber)
    }

    pub fn non_negative_number() -> Self {
        Self::from_kind(RuleKind::NonNegativeNumber)
    }

    /// Value must be one of the field's declared options.
    pub fn one_of() -> Self {
        Self::from_kind(RuleKind::OneOf)
    }

    pub fn custom(validator: impl FieldValidator + 'static) -> Self {
        Self::from_kind(RuleKind::Custom(Arc::new(validator)))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub(super) fn referenced_field(&self) -> Option<FieldKey> {
        match self.kind {
            RuleKind::EqualsField(other) => Some(other),
            _ => None,
        }
    }

    /// Custom rules see unset values; built-in rules leave those to the
    /// required check.
    pub(super) fn runs_on_unset(&self) -> bool {
        matches!(self.kind, RuleKind::Custom(_))
    }

    pub fn check(
        &self,
        spec: &FieldSpec,
        value: &FieldValue,
        form: &FormState,
    ) -> Result<(), FieldError> {
        match &self.kind {
            RuleKind::MinLength { min, trim } => {
                let text = value.as_text();
                let text = if *trim { text.trim() } else { text };
                if text.chars().count() >= *min {
                    Ok(())
                } else {
                    Err(self.fail(|| {
                        format!("{} must be at least {min} characters", spec.label_text())
                    }))
                }
            }
            RuleKind::EmailShape => {
                if is_email_shape(value.as_text()) {
                    Ok(())
                } else {
                    Err(self.fail(|| "Please enter a valid email address".to_string()))
                }
            }
            RuleKind::PhoneShape => {
                if is_phone_shape(value.as_text()) {
                    Ok(())
                } else {
                    Err(self.fail(|| "Please enter a valid 10-digit phone number".to_string()))
                }
            }
            RuleKind::EqualsField(other) => {
                if value.as_text() == form.text(other.as_str()) {
                    Ok(())
                } else {
                    Err(self.fail(|| "Passwords do not match".to_string()))
                }
            }
            RuleKind::MaxFileSize(_) | RuleKind::AllowedMimeTypes(_) => match value.as_file() {
                Some(file) => self
                    .check_attachment(&file.candidate())
                    .unwrap_or(Ok(()))
                    .map_err(|error| FieldError::new(error.to_string())),
                None => Ok(()),
            },
            RuleKind::PositiveNumber => match parse_number(value.as_text()) {
                Some(number) if number > Decimal::ZERO => Ok(()),
                _ => Err(self.fail(|| format!("{} must be greater than 0", spec.label_text()))),
            },
            RuleKind::NonNegativeNumber => match parse_number(value.as_text()) {
                Some(number) if number >= Decimal::ZERO => Ok(()),
                _ => Err(self.fail(|| format!("{} must be 0 or greater", spec.label_text()))),
            },
            RuleKind::OneOf => {
                let text = value.as_text();
                if spec.option_values().iter().any(|option| option == text) {
                    Ok(())
                } else {
                    Err(self.fail(|| {
                        format!("Please select a valid {}", spec.label_text().to_lowercase())
                    }))
                }
            }
            RuleKind::Custom(validator) => validator
                .validate(value, form)
                .map_err(|message| FieldError::new(self.message.clone().unwrap_or(message))),
        }
    }

    /// Applies size and type rules to a file before it is admitted into the
    /// form. Returns `None` for rules that do not inspect files.
    pub(super) fn check_attachment(
        &self,
        candidate: &FileCandidate,
    ) -> Option<Result<(), AttachmentError>> {
        match &self.kind {
            RuleKind::MaxFileSize(max_bytes) => Some(if candidate.size <= *max_bytes {
                Ok(())
            } else {
                Err(AttachmentError::TooLarge {
                    size: candidate.size,
                    max_bytes: *max_bytes,
                    message: self.fail(|| {
                        format!("File size must be less than {}", describe_bytes(*max_bytes))
                    })
                    .message()
                    .to_string(),
                })
            }),
            RuleKind::AllowedMimeTypes(types) => Some(
                if types.iter().any(|allowed| allowed == &candidate.mime_type) {
                    Ok(())
                } else {
                    Err(AttachmentError::UnsupportedType {
                        mime_type: candidate.mime_type.clone(),
                        message: self
                            .fail(|| format!("File must be {}", describe_mime_types(types)))
                            .message()
                            .to_string(),
                    })
                },
            ),
            _ => None,
        }
    }

    fn fail(&self, default: impl FnOnce() -> String) -> FieldError {
        FieldError::new(self.message.clone().unwrap_or_else(default))
    }
}

impl Debug for ValidationRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match &self.kind {
            RuleKind::MinLength { min, trim: true } => format!("MinLength({min})"),
            RuleKind::MinLength { min, trim: false } => format!("MinLengthRaw({min})"),
            RuleKind::EmailShape => "EmailShape".to_string(),
            RuleKind::PhoneShape => "PhoneShape".to_string(),
            RuleKind::EqualsField(other) => format!("EqualsField({other})"),
            RuleKind::MaxFileSize(max) => format!("MaxFileSize({max})"),
            RuleKind::AllowedMimeTypes(types) => format!("AllowedMimeTypes({types:?})"),
            RuleKind::PositiveNumber => "PositiveNumber".to_string(),
            RuleKind::NonNegativeNumber => "NonNegativeNumber".to_string(),
            RuleKind::OneOf => "OneOf".to_string(),
            RuleKind::Custom(_) => "Custom(fn)".to_string(),
        };
        f.write_str(&name)
    }
}

/// Validates every field in declaration order against `values`.
pub(super) fn validate_fields(schema: &[FieldSpec], values: &FormState) -> ErrorState {
    let mut errors = ErrorState::default();
    for spec in schema {
        let value = values.get(spec.key().as_str()).unwrap_or(&FieldValue::Empty);
        if let Err(error) = spec.check(value, values) {
            errors.insert(spec.key(), error);
        }
    }
    errors
}

pub(crate) fn parse_number(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}

fn describe_bytes(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    const KIB: u64 = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_follows_the_single_at_pattern() {
        assert!(is_email_shape("a@b.co"));
        assert!(is_email_shape("seller.one+tag@local-hunt.com.np"));
        assert!(!is_email_shape("bad"));
        assert!(!is_email_shape("no-dot@domain"));
        assert!(!is_email_shape("two@@signs.com"));
        assert!(!is_email_shape("space in@name.com"));
        assert!(!is_email_shape("@missing.local"));
    }

    #[test]
    fn phone_shape_counts_digits_only() {
        assert!(is_phone_shape("98-76543210"));
        assert!(is_phone_shape("(984) 123 4567"));
        assert!(!is_phone_shape("987654321"));
        assert!(!is_phone_shape("+977 9841234567"));
    }

    #[test]
    fn byte_limits_render_in_readable_units() {
        assert_eq!(describe_bytes(5 * 1024 * 1024), "5MB");
        assert_eq!(describe_bytes(512 * 1024), "512KB");
        assert_eq!(describe_bytes(1000), "1000 bytes");
    }

    #[test]
    fn overridden_message_replaces_default() {
        let spec = FieldSpec::text("price");
        let rule = ValidationRule::positive_number().with_message("Price must be greater than 0");
        let error = rule
            .check(&spec, &FieldValue::from("0"), &FormState::new())
            .expect_err("zero is not positive");
        assert_eq!(error.message(), "Price must be greater than 0");
        assert!(
            rule.check(&spec, &FieldValue::from(" 12.50 "), &FormState::new())
                .is_ok()
        );
    }

    #[test]
    fn non_numeric_input_fails_number_rules() {
        let spec = FieldSpec::text("stock");
        let rule = ValidationRule::non_negative_number();
        assert!(
            rule.check(&spec, &FieldValue::from("abc"), &FormState::new())
                .is_err()
        );
        assert!(
            rule.check(&spec, &FieldValue::from("0"), &FormState::new())
                .is_ok()
        );
    }
}
