use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_timer::Delay;
use serde::Deserialize;

use super::controller::{FieldKey, FormError, FormHandle, FormResult, PreviewTicket, read_lock, write_lock};
use super::schema::{FieldKind, FieldSpec};
use super::state::{FieldError, FieldValue};

pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;
pub const ALLOWED_ATTACHMENT_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/jpg", "image/png"];

static PREVIEW_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

/// Size and type limits applied to a selected file before it reaches the
/// form.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttachmentPolicy {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_ATTACHMENT_BYTES,
            allowed_mime_types: ALLOWED_ATTACHMENT_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// A file the user picked, before any checks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// Locally minted reference used to display a selected file. Nothing is
/// uploaded.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints a unique `blob:` reference for `candidate`.
    pub fn mint(candidate: &FileCandidate) -> Self {
        let serial = PREVIEW_ALLOCATOR.fetch_add(1, Ordering::SeqCst);
        Self(format!("blob:localhunt/{serial:08x}/{}", candidate.name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An admitted file: the checked candidate plus its preview reference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileHandle {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub preview: PreviewUrl,
}

impl FileHandle {
    pub fn new(candidate: FileCandidate, preview: PreviewUrl) -> Self {
        Self {
            name: candidate.name,
            size: candidate.size,
            mime_type: candidate.mime_type,
            preview,
        }
    }

    pub fn candidate(&self) -> FileCandidate {
        FileCandidate::new(self.name.clone(), self.size, self.mime_type.clone())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AttachmentError {
    #[error("{message}")]
    TooLarge {
        size: u64,
        max_bytes: u64,
        message: String,
    },
    #[error("{message}")]
    UnsupportedType { mime_type: String, message: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttachOutcome {
    Admitted(FileHandle),
    Rejected(AttachmentError),
    /// A newer edit to the same field landed first; this file was dropped.
    Superseded,
}

pub type BoxedPreviewFuture<'a> = Pin<Box<dyn Future<Output = PreviewUrl> + Send + 'a>>;

/// Produces a displayable reference for a selected file, possibly
/// asynchronously.
pub trait PreviewSource: Send + Sync {
    fn preview<'a>(&'a self, candidate: &'a FileCandidate) -> BoxedPreviewFuture<'a>;
}

impl<F> PreviewSource for F
where
    F: for<'a> Fn(&'a FileCandidate) -> BoxedPreviewFuture<'a> + Send + Sync,
{
    fn preview<'a>(&'a self, candidate: &'a FileCandidate) -> BoxedPreviewFuture<'a> {
        (self)(candidate)
    }
}

/// Mints `blob:` references immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalBlobPreview;

impl PreviewSource for LocalBlobPreview {
    fn preview<'a>(&'a self, candidate: &'a FileCandidate) -> BoxedPreviewFuture<'a> {
        let url = PreviewUrl::mint(candidate);
        Box::pin(async move { url })
    }
}

impl AttachmentPolicy {
    /// Size is checked before type.
    pub fn check(&self, candidate: &FileCandidate) -> Result<(), AttachmentError> {
        let probe = FieldSpec::new("attachment", FieldKind::File).attachment_policy(self);
        check_candidate(&probe, candidate)
    }

    pub fn describe_types(&self) -> String {
        describe_mime_types(&self.allowed_mime_types)
    }
}

impl FormHandle {
    /// Checks `candidate` against the field's file rules and, if it passes,
    /// stores it with a locally minted preview. A rejected file keeps the
    /// current value but still supersedes any preview in flight.
    pub fn attach_file(
        &self,
        key: impl AsRef<str>,
        candidate: FileCandidate,
    ) -> FormResult<AttachOutcome> {
        let key = self.file_field(key.as_ref())?;
        if let Some(rejected) = self.reject_if_invalid(key, &candidate)? {
            return Ok(rejected);
        }
        let ticket = write_lock(&self.state, "starting file attachment")?.bump_ticket(key);
        let preview = PreviewUrl::mint(&candidate);
        self.finish_attachment(key, ticket, FileHandle::new(candidate, preview))
    }

    /// Like [`FormHandle::attach_file`] but generates the preview through
    /// `source`. When the same field is edited again before the preview
    /// resolves, the later edit wins and this call reports `Superseded`.
    pub async fn attach_file_async<S>(
        &self,
        key: impl AsRef<str>,
        candidate: FileCandidate,
        source: &S,
    ) -> FormResult<AttachOutcome>
    where
        S: PreviewSource + ?Sized,
    {
        let key = self.file_field(key.as_ref())?;
        if let Some(rejected) = self.reject_if_invalid(key, &candidate)? {
            return Ok(rejected);
        }
        let ticket = write_lock(&self.state, "starting async file attachment")?.bump_ticket(key);

        let debounce = Duration::from_millis(self.options.preview_debounce_ms);
        if !debounce.is_zero() {
            Delay::new(debounce).await;
            if !self.is_latest_ticket(key, ticket)? {
                return Ok(AttachOutcome::Superseded);
            }
        }

        let preview = source.preview(&candidate).await;
        self.finish_attachment(key, ticket, FileHandle::new(candidate, preview))
    }

    /// Removes the selected file, if any.
    pub fn clear_file(&self, key: impl AsRef<str>) -> FormResult<()> {
        self.set_value(key, FieldValue::Empty)
    }

    fn file_field(&self, key: &str) -> FormResult<FieldKey> {
        let spec = self.spec(key)?;
        if spec.kind() != FieldKind::File {
            return Err(FormError::ValueKindMismatch {
                field: spec.key(),
                kind: spec.kind(),
            });
        }
        Ok(spec.key())
    }

    fn reject_if_invalid(
        &self,
        key: FieldKey,
        candidate: &FileCandidate,
    ) -> FormResult<Option<AttachOutcome>> {
        let spec = self.spec(key.as_str())?;
        let Err(error) = check_candidate(spec, candidate) else {
            return Ok(None);
        };
        let mut state = write_lock(&self.state, "recording attachment error")?;
        tracing::warn!(
            form = %state.id,
            field = %key,
            size = candidate.size,
            mime_type = %candidate.mime_type,
            reason = %error,
            "attachment rejected"
        );
        state.errors.insert(key, FieldError::new(error.to_string()));
        state.bump_ticket(key);
        Ok(Some(AttachOutcome::Rejected(error)))
    }

    fn is_latest_ticket(&self, key: FieldKey, ticket: PreviewTicket) -> FormResult<bool> {
        Ok(read_lock(&self.state, "checking latest preview ticket")?
            .tickets
            .get(&key)
            .copied()
            == Some(ticket))
    }

    fn finish_attachment(
        &self,
        key: FieldKey,
        ticket: PreviewTicket,
        file: FileHandle,
    ) -> FormResult<AttachOutcome> {
        let mut state = write_lock(&self.state, "finishing file attachment")?;
        if state.tickets.get(&key).copied() != Some(ticket) {
            tracing::debug!(form = %state.id, field = %key, "stale preview dropped");
            return Ok(AttachOutcome::Superseded);
        }
        state.values.insert(key, FieldValue::File(file.clone()));
        state.errors.remove(key.as_str());
        tracing::debug!(
            form = %state.id,
            field = %key,
            file = %file.name,
            preview = %file.preview.as_str(),
            "attachment admitted"
        );
        Ok(AttachOutcome::Admitted(file))
    }
}

fn check_candidate(spec: &FieldSpec, candidate: &FileCandidate) -> Result<(), AttachmentError> {
    spec.validators()
        .iter()
        .filter_map(|rule| rule.check_attachment(candidate))
        .collect()
}

/// `["application/pdf", "image/jpeg", "image/png"]` → `PDF, JPG, or PNG`.
pub(super) fn describe_mime_types(types: &[String]) -> String {
    let mut labels: Vec<String> = Vec::new();
    for mime in types {
        let label = match mime.as_str() {
            "application/pdf" => "PDF".to_string(),
            "image/jpeg" | "image/jpg" => "JPG".to_string(),
            other => other
                .rsplit('/')
                .next()
                .unwrap_or(other)
                .to_ascii_uppercase(),
        };
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    match labels.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [rest @ .., last] => format!("{}, or {last}", rest.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn default_policy_messages_match_the_upload_form() {
        let policy = AttachmentPolicy::default();
        assert_eq!(policy.describe_types(), "PDF, JPG, or PNG");

        let too_large = policy
            .check(&FileCandidate::new("scan.png", 6 * MIB, "image/png"))
            .expect_err("6MB exceeds the limit");
        assert_eq!(too_large.to_string(), "File size must be less than 5MB");

        let wrong_type = policy
            .check(&FileCandidate::new("notes.txt", 1024, "text/plain"))
            .expect_err("text is not accepted");
        assert_eq!(wrong_type.to_string(), "File must be PDF, JPG, or PNG");
    }

    #[test]
    fn size_is_reported_before_type() {
        let error = AttachmentPolicy::default()
            .check(&FileCandidate::new("movie.mp4", 6 * MIB, "video/mp4"))
            .expect_err("both rules fail");
        assert!(matches!(error, AttachmentError::TooLarge { .. }));
    }

    #[test]
    fn limit_is_inclusive() {
        let policy = AttachmentPolicy::default();
        assert!(
            policy
                .check(&FileCandidate::new("exact.pdf", 5 * MIB, "application/pdf"))
                .is_ok()
        );
        assert!(
            policy
                .check(&FileCandidate::new("over.pdf", 5 * MIB + 1, "application/pdf"))
                .is_err()
        );
    }

    #[test]
    fn minted_previews_are_unique() {
        let candidate = FileCandidate::new("a.png", 10, "image/png");
        assert_ne!(PreviewUrl::mint(&candidate), PreviewUrl::mint(&candidate));
        assert!(PreviewUrl::mint(&candidate).as_str().starts_with("blob:"));
    }

    #[test]
    fn type_lists_join_naturally() {
        assert_eq!(describe_mime_types(&["image/png".to_string()]), "PNG");
        assert_eq!(
            describe_mime_types(&["image/png".to_string(), "image/webp".to_string()]),
            "PNG or WEBP"
        );
    }
}
