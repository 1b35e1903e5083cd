mod attachment;
mod controller;
mod model;
mod schema;
mod state;
mod validation;
mod view;


pub use attachment::{
    ALLOWED_ATTACHMENT_TYPES, AttachOutcome, AttachmentError, AttachmentPolicy,
    BoxedPreviewFuture, FileCandidate, FileHandle, LocalBlobPreview, MAX_ATTACHMENT_BYTES,
    PreviewSource, PreviewUrl,
};
pub use controller::{
    FieldKey, FormError, FormHandle, FormId, FormOptions, FormResult, PreviewTicket, SubmitState,
};
pub use localhunt_form_derive::FormModel;
pub use model::{FieldCodec, FormModel, ModelError};
pub use schema::{FieldKind, FieldSpec, SchemaError};
pub use state::{ErrorState, FieldError, FieldValue, FormState, ValidationResult};
pub(crate) use validation::parse_number;
pub use validation::{FieldValidator, ValidationRule, is_email_shape, is_phone_shape};
pub use view::FieldView;
