use super::controller::{FieldKey, FormHandle, FormResult, read_lock};
use super::schema::{FieldKind, FieldSpec};
use super::state::FieldValue;

/// Everything a renderer needs to paint one field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldView {
    pub key: FieldKey,
    pub kind: FieldKind,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub options: Vec<String>,
    pub value: FieldValue,
    pub error: Option<String>,
}

impl FieldView {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Text shown inside the input. Files render as their name.
    pub fn display_value(&self) -> &str {
        match &self.value {
            FieldValue::Text(text) => text,
            FieldValue::File(file) => &file.name,
            FieldValue::Empty | FieldValue::Flag(_) => "",
        }
    }
}

impl FormHandle {
    pub fn field_view(&self, key: impl AsRef<str>) -> FormResult<FieldView> {
        let spec = self.spec(key.as_ref())?;
        self.view_of(spec)
    }

    /// Views for every field in declaration order.
    pub fn field_views(&self) -> FormResult<Vec<FieldView>> {
        self.schema.iter().map(|spec| self.view_of(spec)).collect()
    }

    pub fn field_error_for_display(&self, key: impl AsRef<str>) -> FormResult<Option<String>> {
        Ok(self.field_view(key)?.error)
    }

    fn view_of(&self, spec: &FieldSpec) -> FormResult<FieldView> {
        let state = read_lock(&self.state, "reading field view")?;
        let key = spec.key();
        Ok(FieldView {
            key,
            kind: spec.kind(),
            label: spec.label_text(),
            description: spec.description_text().map(ToString::to_string),
            required: spec.is_required(),
            options: spec.option_values().to_vec(),
            value: state.values.get(key.as_str()).cloned().unwrap_or_default(),
            error: state.errors.message(key.as_str()).map(ToString::to_string),
        })
    }
}
