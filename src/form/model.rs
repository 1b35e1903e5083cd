use super::attachment::FileHandle;
use super::controller::{FieldKey, FormHandle, FormResult, SubmitGuard};
use super::state::{FieldValue, FormState, ValidationResult};

/// A typed view of a form's values, usually generated with
/// `#[derive(FormModel)]`.
pub trait FormModel: Sized {
    type Fields;

    fn fields() -> Self::Fields;
    fn field_keys() -> &'static [FieldKey];
    fn from_state(state: &FormState) -> Result<Self, ModelError>;
    fn into_state(self) -> FormState;
}

/// Conversion between one model field and its stored value.
pub trait FieldCodec: Sized {
    fn decode(key: FieldKey, value: Option<&FieldValue>) -> Result<Self, ModelError>;
    fn encode(self) -> FieldValue;
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("field `{0}` has no value")]
    Missing(FieldKey),
    #[error("field `{field}` does not hold a {expected}")]
    TypeMismatch {
        field: FieldKey,
        expected: &'static str,
    },
    #[error("field `{field}` is not a valid number: {value:?}")]
    InvalidNumber { field: FieldKey, value: String },
}

impl FieldCodec for String {
    fn decode(key: FieldKey, value: Option<&FieldValue>) -> Result<Self, ModelError> {
        match value {
            None | Some(FieldValue::Empty) => Ok(String::new()),
            Some(FieldValue::Text(text)) => Ok(text.clone()),
            Some(_) => Err(ModelError::TypeMismatch {
                field: key,
                expected: "text",
            }),
        }
    }

    fn encode(self) -> FieldValue {
        FieldValue::Text(self)
    }
}

impl FieldCodec for bool {
    fn decode(key: FieldKey, value: Option<&FieldValue>) -> Result<Self, ModelError> {
        match value {
            None | Some(FieldValue::Empty) => Ok(false),
            Some(FieldValue::Flag(flag)) => Ok(*flag),
            Some(_) => Err(ModelError::TypeMismatch {
                field: key,
                expected: "flag",
            }),
        }
    }

    fn encode(self) -> FieldValue {
        FieldValue::Flag(self)
    }
}

impl FieldCodec for FileHandle {
    fn decode(key: FieldKey, value: Option<&FieldValue>) -> Result<Self, ModelError> {
        match value {
            Some(FieldValue::File(file)) => Ok(file.clone()),
            None | Some(FieldValue::Empty) => Err(ModelError::Missing(key)),
            Some(_) => Err(ModelError::TypeMismatch {
                field: key,
                expected: "file",
            }),
        }
    }

    fn encode(self) -> FieldValue {
        FieldValue::File(self)
    }
}

impl FieldCodec for Option<FileHandle> {
    fn decode(key: FieldKey, value: Option<&FieldValue>) -> Result<Self, ModelError> {
        match value {
            None | Some(FieldValue::Empty) => Ok(None),
            other => FileHandle::decode(key, other).map(Some),
        }
    }

    fn encode(self) -> FieldValue {
        self.map(FieldValue::File).unwrap_or_default()
    }
}

impl FormHandle {
    /// [`FormHandle::submit`] with the snapshot converted into `M`.
    pub fn submit_as<M>(&self, on_valid: impl FnOnce(M)) -> FormResult<ValidationResult>
    where
        M: FormModel,
    {
        let (result, snapshot) = self.begin_submit()?;
        let Some(snapshot) = snapshot else {
            return Ok(result);
        };
        let guard = SubmitGuard::new(self);
        let model = match M::from_state(&snapshot) {
            Ok(model) => model,
            Err(error) => {
                guard.abort()?;
                return Err(error.into());
            }
        };
        on_valid(model);
        guard.complete()?;
        Ok(result)
    }

    pub fn model<M>(&self) -> FormResult<M>
    where
        M: FormModel,
    {
        Ok(M::from_state(&self.values()?)?)
    }
}
