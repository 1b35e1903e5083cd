use crate::form::{FieldSpec, FormHandle, FormModel, FormResult, SchemaError, ValidationRule};

use super::{
    Submission, confirm_password_field, email_field, password_field, phone_field, submit_model,
};

#[derive(Clone, Debug, Eq, PartialEq, FormModel)]
pub struct Registration {
    #[form(key = "fullName")]
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[form(key = "confirmPassword")]
    pub confirm_password: String,
}

pub fn schema() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("fullName")
            .required()
            .rule(ValidationRule::min_length(2)),
        email_field("email"),
        phone_field("phone"),
        password_field(),
        confirm_password_field(),
    ]
}

pub fn form() -> Result<FormHandle, SchemaError> {
    FormHandle::define(schema())
}

pub fn submit(form: &FormHandle) -> FormResult<Submission<Registration>> {
    submit_model(form, |registration: &Registration| {
        tracing::info!(
            full_name = %registration.full_name,
            email = %registration.email,
            "registration submitted"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> FormHandle {
        let form = form().expect("signup form");
        for (key, value) in [
            ("fullName", "Nivesh Shrestha"),
            ("email", "nivesh@example.com"),
            ("phone", "9876543210"),
            ("password", "secret1"),
            ("confirmPassword", "secret1"),
        ] {
            form.set_value(key, value).expect("fill field");
        }
        form
    }

    #[test]
    fn empty_form_uses_page_messages() {
        let form = form().expect("signup form");
        let Submission::Rejected(errors) = submit(&form).expect("submit") else {
            panic!("empty signup accepted");
        };
        assert_eq!(errors.message("fullName"), Some("Full name is required"));
        assert_eq!(errors.message("phone"), Some("Phone number is required"));
        assert_eq!(
            errors.message("confirmPassword"),
            Some("Please confirm your password")
        );
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn whitespace_name_counts_as_missing() {
        let form = filled();
        form.set_value("fullName", "   ").expect("name");
        let result = form.validate().expect("validate");
        assert_eq!(result.errors.message("fullName"), Some("Full name is required"));
    }

    #[test]
    fn mismatched_confirmation() {
        let form = filled();
        form.set_value("confirmPassword", "secret2").expect("confirm");
        let Submission::Rejected(errors) = submit(&form).expect("submit") else {
            panic!("mismatch accepted");
        };
        assert_eq!(errors.message("confirmPassword"), Some("Passwords do not match"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn valid_registration_is_accepted() {
        let registration = submit(&filled())
            .expect("submit")
            .accepted()
            .expect("valid signup");
        assert_eq!(registration.full_name, "Nivesh Shrestha");
        assert_eq!(registration.phone, "9876543210");
    }
}
