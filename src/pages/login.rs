use std::fmt::{Display, Formatter};

use crate::form::{FieldSpec, FormHandle, FormModel, FormResult, SchemaError};

use super::{Submission, email_field, password_field, submit_model};

/// Which login page the credentials were entered on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Audience {
    Buyer,
    Seller,
}

impl Display for Audience {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Audience::Buyer => "buyer",
            Audience::Seller => "seller",
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, FormModel)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn schema() -> Vec<FieldSpec> {
    vec![email_field("email"), password_field()]
}

pub fn form() -> Result<FormHandle, SchemaError> {
    FormHandle::define(schema())
}

pub fn submit(audience: Audience, form: &FormHandle) -> FormResult<Submission<Credentials>> {
    submit_model(form, |credentials: &Credentials| {
        tracing::info!(%audience, email = %credentials.email, "login submitted");
    })
}
