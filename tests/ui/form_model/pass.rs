use localhunt::form::{FieldValue, FileHandle, FormModel, FormState, ModelError};

#[derive(Clone, Debug, PartialEq, localhunt::form::FormModel)]
struct DocumentUpload {
    #[form(key = "contactEmail")]
    contact_email: String,
    agreed: bool,
    #[form(key = "biz-cert")]
    certificate: Option<FileHandle>,
}

fn main() {
    let fields = DocumentUpload::fields();
    assert_eq!(fields.contact_email().as_str(), "contactEmail");
    assert_eq!(fields.certificate().as_str(), "biz-cert");
    assert_eq!(DocumentUpload::field_keys().len(), 3);

    let state = FormState::from_iter([
        ("contactEmail", FieldValue::from("a@b.co")),
        ("agreed", FieldValue::from(true)),
    ]);
    let model = DocumentUpload::from_state(&state).expect("model decodes");
    assert_eq!(model.contact_email, "a@b.co");
    assert!(model.agreed);
    assert_eq!(model.certificate, None);

    let encoded = model.clone().into_state();
    assert_eq!(encoded.text("contactEmail"), "a@b.co");
    assert!(encoded.flag("agreed"));

    let mismatched = FormState::from_iter([("agreed", "yes")]);
    assert!(matches!(
        DocumentUpload::from_state(&mismatched),
        Err(ModelError::TypeMismatch { .. })
    ));
}
