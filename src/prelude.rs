pub use crate::catalog::{Catalog, Product, ProductId, ProductStatus};
pub use crate::config::EngineConfig;
pub use crate::form::{
    AttachOutcome, AttachmentPolicy, FieldKey, FieldSpec, FieldValue, FileCandidate, FormError,
    FormHandle, FormModel, FormOptions, FormResult, FormState, SubmitState, ValidationResult,
    ValidationRule,
};
pub use crate::pages::Submission;
