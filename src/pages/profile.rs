use crate::form::{
    FieldSpec, FormHandle, FormModel, FormOptions, FormResult, SchemaError, ValidationRule,
};

use super::{Submission, email_field, phone_field, submit_model};

#[derive(Clone, Debug, Eq, PartialEq, FormModel)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Nivesh Shrestha".to_string(),
            email: "niveshshrestha@gmail.com".to_string(),
            phone: "9876543210".to_string(),
            address: "Pulchowk, Lalitpur".to_string(),
        }
    }
}

pub fn schema() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("name")
            .required()
            .rule(ValidationRule::min_length(2)),
        email_field("email"),
        phone_field("phone"),
        FieldSpec::text("address").required(),
    ]
}

/// The saved profile plus an edit buffer. Edits only reach the profile
/// through a successful [`ProfilePage::save`].
pub struct ProfilePage {
    profile: Profile,
    form: FormHandle,
    editing: bool,
}

impl ProfilePage {
    pub fn new(profile: Profile) -> Result<Self, SchemaError> {
        let form = FormHandle::define_with(
            schema(),
            profile.clone().into_state(),
            FormOptions::default(),
        )?;
        Ok(Self {
            profile,
            form,
            editing: false,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn form(&self) -> &FormHandle {
        &self.form
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Loads the saved profile into the edit buffer.
    pub fn edit(&mut self) -> FormResult<()> {
        self.form.reset(Some(self.profile.clone().into_state()))?;
        self.editing = true;
        Ok(())
    }

    /// Discards the edit buffer.
    pub fn cancel(&mut self) -> FormResult<()> {
        self.form.reset(Some(self.profile.clone().into_state()))?;
        self.editing = false;
        Ok(())
    }

    /// Commits the edit buffer when it validates. Invalid edits stay in the
    /// buffer with their errors and the page remains in edit mode.
    pub fn save(&mut self) -> FormResult<Submission<Profile>> {
        let submission = submit_model(&self.form, |profile: &Profile| {
            tracing::info!(name = %profile.name, email = %profile.email, "profile saved");
        })?;
        if let Submission::Accepted(profile) = &submission {
            self.profile = profile.clone();
            self.editing = false;
        }
        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing_page() -> ProfilePage {
        let mut page = ProfilePage::new(Profile::default()).expect("profile page");
        page.edit().expect("edit");
        page
    }

    #[test]
    fn invalid_save_keeps_the_saved_profile() {
        let mut page = editing_page();
        page.form().set_value("phone", "12345").expect("phone");
        page.form().set_value("address", "  ").expect("address");

        let Submission::Rejected(errors) = page.save().expect("save") else {
            panic!("invalid profile saved");
        };
        assert_eq!(
            errors.message("phone"),
            Some("Please enter a valid 10-digit phone number")
        );
        assert_eq!(errors.message("address"), Some("Address is required"));
        assert!(page.is_editing());
        assert_eq!(page.profile(), &Profile::default());
    }

    #[test]
    fn valid_save_commits_and_leaves_edit_mode() {
        let mut page = editing_page();
        page.form().set_value("address", "Jhamsikhel, Lalitpur").expect("address");

        let saved = page.save().expect("save").accepted().expect("valid profile");
        assert_eq!(saved.address, "Jhamsikhel, Lalitpur");
        assert_eq!(page.profile().address, "Jhamsikhel, Lalitpur");
        assert!(!page.is_editing());
    }

    #[test]
    fn cancel_discards_edits_and_errors() {
        let mut page = editing_page();
        page.form().set_value("name", "N").expect("name");
        assert!(!page.save().expect("save").is_accepted());

        page.cancel().expect("cancel");
        assert!(!page.is_editing());
        assert!(page.form().errors().expect("errors").is_empty());
        assert_eq!(
            page.form().values().expect("values").text("name"),
            "Nivesh Shrestha"
        );

        page.edit().expect("edit again");
        assert_eq!(
            page.form().model::<Profile>().expect("buffer"),
            Profile::default()
        );
    }
}
