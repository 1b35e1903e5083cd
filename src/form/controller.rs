use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Deserialize;

use super::model::ModelError;
use super::schema::{FieldKind, FieldSpec, SchemaError, check_schema};
use super::state::{ErrorState, FieldError, FieldValue, FormState, ValidationResult};
use super::validation::validate_fields;

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "form-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&'static str> for FieldKey {
    fn from(value: &'static str) -> Self {
        Self(value)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        self.0
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        self.0
    }
}

/// Orders file preview completions per field; only the newest ticket may
/// write its result.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PreviewTicket(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormOptions {
    /// Restore the initial values after a successful submit.
    pub reset_on_success: bool,
    /// Delay before a selected file's preview is generated.
    pub preview_debounce_ms: u64,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            reset_on_success: false,
            preview_debounce_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("form submit is already in progress")]
    AlreadySubmitting,
    #[error("form has no field named `{0}`")]
    UnknownField(String),
    #[error("field `{field}` of kind {kind:?} cannot hold this value")]
    ValueKindMismatch { field: FieldKey, kind: FieldKind },
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type FormResult<T> = Result<T, FormError>;

pub(super) struct HandleState {
    pub(super) id: FormId,
    pub(super) initial: FormState,
    pub(super) values: FormState,
    pub(super) errors: ErrorState,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) tickets: BTreeMap<FieldKey, PreviewTicket>,
}

impl HandleState {
    /// Invalidates any preview still in flight for `key`.
    pub(super) fn bump_ticket(&mut self, key: FieldKey) -> PreviewTicket {
        let next = PreviewTicket(
            self.tickets
                .get(&key)
                .copied()
                .unwrap_or(PreviewTicket(0))
                .0
                + 1,
        );
        self.tickets.insert(key, next);
        next
    }
}

/// Runtime instance binding a field schema to live values and errors.
///
/// Clones share the same state so that deferred work such as file previews
/// can write back into the form that started it.
#[derive(Clone)]
pub struct FormHandle {
    pub(super) schema: Arc<[FieldSpec]>,
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<HandleState>>,
}

impl FormHandle {
    pub fn define(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        Self::define_with(fields, FormState::default(), FormOptions::default())
    }

    /// Defines a form whose values start from each field's default, overlaid
    /// with `initial`.
    pub fn define_with(
        fields: Vec<FieldSpec>,
        initial: FormState,
        options: FormOptions,
    ) -> Result<Self, SchemaError> {
        check_schema(&fields)?;
        let mut values = FormState::default();
        for spec in &fields {
            let value = initial
                .get(spec.key().as_str())
                .cloned()
                .unwrap_or_else(|| spec.initial_value().clone());
            values.insert(spec.key(), value);
        }
        let id = FormId::next();
        tracing::debug!(form = %id, fields = fields.len(), "form defined");
        Ok(Self {
            schema: fields.into(),
            options,
            state: Arc::new(RwLock::new(HandleState {
                id,
                initial: values.clone(),
                values,
                errors: ErrorState::default(),
                submit_state: SubmitState::Idle,
                submit_count: 0,
                tickets: BTreeMap::new(),
            })),
        })
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn schema(&self) -> &[FieldSpec] {
        &self.schema
    }

    pub fn spec(&self, key: &str) -> FormResult<&FieldSpec> {
        self.schema
            .iter()
            .find(|spec| spec.key().as_str() == key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))
    }

    /// Stores a new value and clears the field's visible error without
    /// re-validating.
    pub fn set_value(&self, key: impl AsRef<str>, value: impl Into<FieldValue>) -> FormResult<()> {
        let spec = self.spec(key.as_ref())?;
        let value = value.into();
        if !spec.kind().accepts(&value) || matches!(value, FieldValue::File(_)) {
            return Err(FormError::ValueKindMismatch {
                field: spec.key(),
                kind: spec.kind(),
            });
        }

        let mut state = write_lock(&self.state, "writing field value")?;
        state.values.insert(spec.key(), value);
        state.bump_ticket(spec.key());
        if state.errors.remove(spec.key().as_str()).is_some() {
            tracing::trace!(form = %state.id, field = %spec.key(), "field error cleared on edit");
        }
        Ok(())
    }

    pub fn value(&self, key: impl AsRef<str>) -> FormResult<FieldValue> {
        let spec = self.spec(key.as_ref())?;
        Ok(read_lock(&self.state, "reading field value")?
            .values
            .get(spec.key().as_str())
            .cloned()
            .unwrap_or_default())
    }

    pub fn error(&self, key: impl AsRef<str>) -> FormResult<Option<FieldError>> {
        let spec = self.spec(key.as_ref())?;
        Ok(read_lock(&self.state, "reading field error")?
            .errors
            .get(spec.key().as_str())
            .cloned())
    }

    pub fn values(&self) -> FormResult<FormState> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    pub fn errors(&self) -> FormResult<ErrorState> {
        Ok(read_lock(&self.state, "reading form errors")?.errors.clone())
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    pub fn submit_count(&self) -> FormResult<u32> {
        Ok(read_lock(&self.state, "reading submit count")?.submit_count)
    }

    /// First field in declaration order that currently shows an error.
    pub fn first_error(&self) -> FormResult<Option<FieldKey>> {
        let state = read_lock(&self.state, "reading first error key")?;
        Ok(self
            .schema
            .iter()
            .map(FieldSpec::key)
            .find(|key| state.errors.contains(key.as_str())))
    }

    /// Checks every field against the current values. Neither values nor
    /// visible errors are modified.
    pub fn validate(&self) -> FormResult<ValidationResult> {
        let state = read_lock(&self.state, "reading values for validation")?;
        let result = ValidationResult::from_errors(validate_fields(&self.schema, &state.values));
        tracing::debug!(
            form = %state.id,
            ok = result.ok,
            errors = result.errors.len(),
            "form validated"
        );
        Ok(result)
    }

    /// Validates and, when every field passes, hands a snapshot of the values
    /// to `on_valid`. On failure the errors become visible and `on_valid` is
    /// not called. If `on_valid` panics the submit ends in `Failed`.
    pub fn submit(&self, on_valid: impl FnOnce(FormState)) -> FormResult<ValidationResult> {
        let (result, snapshot) = self.begin_submit()?;
        let Some(snapshot) = snapshot else {
            return Ok(result);
        };
        let guard = SubmitGuard::new(self);
        on_valid(snapshot);
        guard.complete()?;
        Ok(result)
    }

    /// Restores `initial` (or the values the form was defined with) and
    /// clears every visible error.
    pub fn reset(&self, initial: Option<FormState>) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        let values = match initial {
            Some(initial) => self.overlay_defaults(initial),
            None => state.initial.clone(),
        };
        state.values = values;
        state.errors.clear();
        let keys = state.tickets.keys().copied().collect::<Vec<_>>();
        for key in keys {
            state.bump_ticket(key);
        }
        transition_submit_state(&mut state, SubmitState::Idle)?;
        tracing::debug!(form = %state.id, "form reset");
        Ok(())
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        write_lock(&self.state, "clearing all field errors")?
            .errors
            .clear();
        Ok(())
    }

    pub(super) fn begin_submit(&self) -> FormResult<(ValidationResult, Option<FormState>)> {
        let mut state = write_lock(&self.state, "preparing submit")?;
        if state.submit_state == SubmitState::Submitting {
            return Err(FormError::AlreadySubmitting);
        }
        transition_submit_state(&mut state, SubmitState::Validating)?;
        state.submit_count = state.submit_count.saturating_add(1);

        let result = ValidationResult::from_errors(validate_fields(&self.schema, &state.values));
        state.errors = result.errors.clone();
        if !result.ok {
            transition_submit_state(&mut state, SubmitState::Failed)?;
            tracing::debug!(
                form = %state.id,
                errors = result.errors.len(),
                attempt = state.submit_count,
                "submit rejected"
            );
            return Ok((result, None));
        }

        transition_submit_state(&mut state, SubmitState::Submitting)?;
        Ok((result, Some(state.values.clone())))
    }

    fn finish_submit(&self) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "completing submit")?;
            transition_submit_state(&mut state, SubmitState::Succeeded)?;
            tracing::debug!(form = %state.id, attempt = state.submit_count, "submit accepted");
        }
        if self.options.reset_on_success {
            self.reset(None)?;
        }
        Ok(())
    }

    fn abort_submit(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "aborting submit")?;
        tracing::debug!(form = %state.id, attempt = state.submit_count, "submit aborted");
        transition_submit_state(&mut state, SubmitState::Failed)
    }

    fn overlay_defaults(&self, initial: FormState) -> FormState {
        let mut values = FormState::default();
        for spec in self.schema.iter() {
            let value = initial
                .get(spec.key().as_str())
                .cloned()
                .unwrap_or_else(|| spec.initial_value().clone());
            values.insert(spec.key(), value);
        }
        values
    }
}

/// Holds a submit in `Submitting` while the success callback runs. Dropping
/// it without [`SubmitGuard::complete`] moves the form to `Failed`.
pub(super) struct SubmitGuard<'a> {
    form: &'a FormHandle,
    armed: bool,
}

impl<'a> SubmitGuard<'a> {
    pub(super) fn new(form: &'a FormHandle) -> Self {
        Self { form, armed: true }
    }

    pub(super) fn complete(mut self) -> FormResult<()> {
        self.armed = false;
        self.form.finish_submit()
    }

    pub(super) fn abort(mut self) -> FormResult<()> {
        self.armed = false;
        self.form.abort_submit()
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(error) = self.form.abort_submit() {
            tracing::warn!(%error, "submit left unfinished");
        }
    }
}

pub(super) fn transition_submit_state(
    state: &mut HandleState,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
