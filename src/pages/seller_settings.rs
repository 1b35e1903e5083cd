use std::collections::BTreeMap;

use crate::form::{
    FieldSpec, FormHandle, FormModel, FormOptions, FormResult, SchemaError, ValidationRule,
};

use super::{Submission, email_field, submit_model};

pub const STORE_CATEGORIES: [&str; 5] = [
    "Handmade & Crafts",
    "Fashion & Apparel",
    "Gourmet & Organic",
    "Home & Living",
    "Other",
];

pub const PROCESSING_TIMES: [&str; 4] = [
    "1-2 business days",
    "2-3 business days",
    "3-5 business days",
    "5-7 business days",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum NotificationTopic {
    NewOrders,
    Messages,
    Payouts,
    Reviews,
    LowStock,
    System,
}

impl NotificationTopic {
    pub const ALL: [Self; 6] = [
        Self::NewOrders,
        Self::Messages,
        Self::Payouts,
        Self::Reviews,
        Self::LowStock,
        Self::System,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::NewOrders => "newOrders",
            Self::Messages => "messages",
            Self::Payouts => "payouts",
            Self::Reviews => "reviews",
            Self::LowStock => "lowStock",
            Self::System => "system",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NewOrders => "New orders",
            Self::Messages => "Customer messages",
            Self::Payouts => "Payout updates",
            Self::Reviews => "Product reviews",
            Self::LowStock => "Low stock alerts",
            Self::System => "System announcements",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::NewOrders => "Get notified when customers place new orders.",
            Self::Messages => "Alert me when customers send messages or inquiries.",
            Self::Payouts => "Email me when payouts are processed or delayed.",
            Self::Reviews => "Notify me when customers leave reviews or ratings.",
            Self::LowStock => "Warn me when product inventory falls below threshold.",
            Self::System => "Platform updates, maintenance, and new features.",
        }
    }

    fn enabled_by_default(self) -> bool {
        !matches!(self, Self::Reviews)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, FormModel)]
pub struct StoreSettings {
    #[form(key = "storeName")]
    pub store_name: String,
    #[form(key = "businessCategory")]
    pub business_category: String,
    #[form(key = "storeDescription")]
    pub store_description: String,
    #[form(key = "storeLocation")]
    pub store_location: String,
    #[form(key = "businessPanVat")]
    pub business_pan_vat: String,
    #[form(key = "fullName")]
    pub full_name: String,
    #[form(key = "phoneNumber")]
    pub phone_number: String,
    #[form(key = "emailAddress")]
    pub email_address: String,
    #[form(key = "processingTime")]
    pub processing_time: String,
    #[form(key = "returnPolicy")]
    pub return_policy: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "Nepal Handicrafts Store".to_string(),
            business_category: "Handmade & Crafts".to_string(),
            store_description: "Authentic Nepali handicrafts and handmade products, sourced \
                                directly from local artisans."
                .to_string(),
            store_location: "Kathmandu, Nepal".to_string(),
            business_pan_vat: "123456789".to_string(),
            full_name: "Mr. Nivesh Shrestha".to_string(),
            phone_number: "+977 9841234567".to_string(),
            email_address: "nivesh@nepalhandicrafts.com".to_string(),
            processing_time: "1-2 business days".to_string(),
            return_policy: "We accept returns within 7 days of delivery. Items must be unused \
                            and in original packaging."
                .to_string(),
        }
    }
}

pub fn schema() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("storeName").required(),
        FieldSpec::select("businessCategory")
            .required()
            .options(STORE_CATEGORIES),
        FieldSpec::textarea("storeDescription").required(),
        FieldSpec::text("storeLocation").required(),
        FieldSpec::text("businessPanVat")
            .label("Business PAN / VAT ID")
            .required_message("PAN / VAT ID is required"),
        FieldSpec::text("fullName").required(),
        FieldSpec::phone("phoneNumber")
            .label("Phone number")
            .required(),
        email_field("emailAddress"),
        FieldSpec::select("processingTime").options(PROCESSING_TIMES),
        FieldSpec::textarea("returnPolicy").required(),
    ]
}

/// Store settings form plus the toggles that save without validation.
pub struct SellerSettingsPage {
    form: FormHandle,
    notifications: BTreeMap<NotificationTopic, bool>,
    two_factor: bool,
}

impl SellerSettingsPage {
    pub fn new(settings: StoreSettings) -> Result<Self, SchemaError> {
        let form =
            FormHandle::define_with(schema(), settings.into_state(), FormOptions::default())?;
        Ok(Self {
            form,
            notifications: NotificationTopic::ALL
                .into_iter()
                .map(|topic| (topic, topic.enabled_by_default()))
                .collect(),
            two_factor: false,
        })
    }

    pub fn form(&self) -> &FormHandle {
        &self.form
    }

    pub fn notification(&self, topic: NotificationTopic) -> bool {
        self.notifications.get(&topic).copied().unwrap_or(false)
    }

    /// Flips one notification and returns its new state.
    pub fn toggle_notification(&mut self, topic: NotificationTopic) -> bool {
        let enabled = self.notifications.entry(topic).or_insert(false);
        *enabled = !*enabled;
        tracing::debug!(topic = topic.id(), enabled = *enabled, "notification toggled");
        *enabled
    }

    pub fn two_factor_enabled(&self) -> bool {
        self.two_factor
    }

    pub fn toggle_two_factor(&mut self) -> bool {
        self.two_factor = !self.two_factor;
        tracing::debug!(enabled = self.two_factor, "two-factor toggled");
        self.two_factor
    }

    pub fn save(&self) -> FormResult<Submission<StoreSettings>> {
        submit_model(&self.form, |settings: &StoreSettings| {
            tracing::info!(
                store = %settings.store_name,
                category = %settings.business_category,
                email = %settings.email_address,
                "settings saved"
            );
        })
    }
}
