use crate::form::{FieldSpec, FormHandle, FormModel, FormResult, SchemaError, ValidationRule};

use super::{Submission, email_field, submit_model};

#[derive(Clone, Debug, Eq, PartialEq, FormModel)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

pub fn schema() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("name")
            .required()
            .rule(ValidationRule::min_length(2)),
        email_field("email"),
        FieldSpec::text("subject")
            .required()
            .rule(ValidationRule::min_length(3)),
        FieldSpec::textarea("message")
            .required()
            .rule(ValidationRule::min_length(10)),
    ]
}

pub fn form() -> Result<FormHandle, SchemaError> {
    FormHandle::define(schema())
}

pub fn submit(form: &FormHandle) -> FormResult<Submission<ContactMessage>> {
    submit_model(form, |message: &ContactMessage| {
        tracing::info!(
            name = %message.name,
            email = %message.email,
            subject = %message.subject,
            "contact form submitted"
        );
    })
}
