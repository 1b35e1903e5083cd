//! Form definitions for each page of the storefront.

pub mod contact;
pub mod login;
pub mod profile;
pub mod seller_product;
pub mod seller_settings;
pub mod seller_signup;
pub mod signup;

use crate::form::{
    ErrorState, FieldKey, FieldSpec, FormHandle, FormModel, FormResult, ValidationRule,
};

/// Outcome of submitting a page form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Submission<M> {
    Accepted(M),
    Rejected(ErrorState),
}

impl<M> Submission<M> {
    pub fn accepted(self) -> Option<M> {
        match self {
            Submission::Accepted(model) => Some(model),
            Submission::Rejected(_) => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted(_))
    }
}

pub(crate) fn submit_model<M>(
    form: &FormHandle,
    on_accept: impl FnOnce(&M),
) -> FormResult<Submission<M>>
where
    M: FormModel,
{
    let mut accepted = None;
    let result = form.submit_as(|model: M| {
        on_accept(&model);
        accepted = Some(model);
    })?;
    Ok(match accepted {
        Some(model) => Submission::Accepted(model),
        None => Submission::Rejected(result.errors),
    })
}

pub(crate) fn email_field(key: impl Into<FieldKey>) -> FieldSpec {
    FieldSpec::email(key).required().rule(ValidationRule::email())
}

pub(crate) fn phone_field(key: impl Into<FieldKey>) -> FieldSpec {
    FieldSpec::phone(key)
        .label("Phone number")
        .required()
        .rule(ValidationRule::phone())
}

pub(crate) fn password_field() -> FieldSpec {
    FieldSpec::password("password")
        .required()
        .rule(ValidationRule::min_length_raw(6))
}

pub(crate) fn confirm_password_field() -> FieldSpec {
    FieldSpec::password("confirmPassword")
        .required_message("Please confirm your password")
        .rule(ValidationRule::equals_field("password"))
}
