use crate::config::EngineConfig;
use crate::form::{
    FieldKey, FieldSpec, FileHandle, FormHandle, FormModel, FormResult, FormState, SchemaError,
    ValidationRule,
};

use super::{
    Submission, confirm_password_field, email_field, password_field, phone_field, submit_model,
};

/// Verification documents a seller uploads, as `(key, label)`.
pub const DOCUMENT_FIELDS: [(FieldKey, &str); 2] = [
    (FieldKey::new("biz-cert"), "Business Registration Certificate"),
    (FieldKey::new("pan-cert"), "PAN / VAT Certificate"),
];

/// `(value, label)` pairs for the business category select.
pub const BUSINESS_CATEGORIES: [(&str, &str); 6] = [
    ("handmade", "Handmade & Crafts"),
    ("fashion", "Fashion & Apparel"),
    ("gourmet", "Gourmet & Organic"),
    ("home", "Home & Living"),
    ("masks", "Masks"),
    ("other", "Other"),
];

#[derive(Clone, Debug, Eq, PartialEq, FormModel)]
pub struct SellerApplication {
    #[form(key = "userName")]
    pub user_name: String,
    #[form(key = "phoneNumber")]
    pub phone_number: String,
    #[form(key = "contactEmail")]
    pub contact_email: String,
    pub location: String,
    #[form(key = "businessName")]
    pub business_name: String,
    #[form(key = "businessCategory")]
    pub business_category: String,
    #[form(key = "businessPanVat")]
    pub business_pan_vat: String,
    #[form(key = "businessLocation")]
    pub business_location: String,
    pub password: String,
    #[form(key = "confirmPassword")]
    pub confirm_password: String,
    #[form(key = "biz-cert")]
    pub registration_certificate: FileHandle,
    #[form(key = "pan-cert")]
    pub pan_vat_certificate: FileHandle,
}

pub fn schema(config: &EngineConfig) -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::text("userName")
            .required()
            .rule(ValidationRule::min_length(2)),
        phone_field("phoneNumber"),
        email_field("contactEmail"),
        FieldSpec::text("location").required(),
        FieldSpec::text("businessName").required(),
        FieldSpec::select("businessCategory")
            .required()
            .options(BUSINESS_CATEGORIES.iter().map(|(value, _)| *value))
            .rule(ValidationRule::one_of()),
        FieldSpec::text("businessPanVat")
            .label("PAN / VAT ID")
            .required(),
        FieldSpec::text("businessLocation").required(),
        password_field(),
        confirm_password_field(),
    ];
    fields.extend(DOCUMENT_FIELDS.iter().map(|(key, label)| {
        FieldSpec::file(*key)
            .label(*label)
            .required()
            .attachment_policy(&config.attachments)
    }));
    fields
}

pub fn form(config: &EngineConfig) -> Result<FormHandle, SchemaError> {
    FormHandle::define_with(schema(config), FormState::default(), config.form)
}

pub fn submit(form: &FormHandle) -> FormResult<Submission<SellerApplication>> {
    submit_model(form, |application: &SellerApplication| {
        tracing::info!(
            user = %application.user_name,
            business = %application.business_name,
            category = %application.business_category,
            documents = DOCUMENT_FIELDS.len(),
            "seller signup submitted"
        );
    })
}
