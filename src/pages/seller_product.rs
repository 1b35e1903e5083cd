use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::catalog::{Catalog, CatalogError, Product, ProductId, ProductStatus};
use crate::config::EngineConfig;
use crate::form::{
    AttachOutcome, AttachmentPolicy, FieldKey, FieldSpec, FieldValue, FileCandidate, FileHandle,
    FormHandle, FormModel, FormOptions, FormResult, FormState, ModelError, SchemaError,
    ValidationRule, parse_number,
};

use super::{Submission, submit_model};

pub const PRODUCT_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Raw values of the "Add New Product" form.
#[derive(Clone, Debug, Eq, PartialEq, FormModel)]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub price: String,
    pub stock: String,
    pub description: String,
    pub image: Option<FileHandle>,
    #[form(key = "imageUrl")]
    pub image_url: String,
    pub handcrafted: bool,
    pub specs: String,
    #[form(key = "sizeEu")]
    pub size_eu: String,
    #[form(key = "sizeClothing")]
    pub size_clothing: String,
}

impl ProductDraft {
    /// Builds a listing from a validated draft. The uploaded image wins over
    /// a typed URL; specs are one per non-blank line.
    pub fn into_product(self) -> Result<Product, ModelError> {
        let price = parse_number(&self.price).ok_or_else(|| ModelError::InvalidNumber {
            field: FieldKey::new("price"),
            value: self.price.clone(),
        })?;
        let stock = parse_whole(&self.stock).ok_or_else(|| ModelError::InvalidNumber {
            field: FieldKey::new("stock"),
            value: self.stock.clone(),
        })?;
        let image_url = match self.image {
            Some(file) => Some(file.preview.as_str().to_string()),
            None => non_blank(&self.image_url),
        };

        Ok(Product {
            id: ProductId::next(),
            name: self.name.trim().to_string(),
            sku: self.sku.trim().to_string(),
            price,
            stock,
            status: ProductStatus::for_stock(stock),
            image_url,
            description: self.description.trim().to_string(),
            handcrafted: self.handcrafted,
            specs: self
                .specs
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect(),
            size_eu: non_blank(&self.size_eu),
            size_clothing: non_blank(&self.size_clothing),
        })
    }
}

pub fn schema(policy: &AttachmentPolicy) -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("name").label("Product name").required(),
        FieldSpec::text("sku").label("SKU").required(),
        FieldSpec::text("price")
            .required_message("Price must be greater than 0")
            .rule(ValidationRule::positive_number()),
        FieldSpec::text("stock")
            .required_message("Stock must be 0 or greater")
            .rule(ValidationRule::non_negative_number())
            .rule(ValidationRule::custom(|value: &FieldValue, _: &FormState| {
                match parse_whole(value.as_text()) {
                    Some(_) => Ok(()),
                    None => Err("Stock must be a whole number".to_string()),
                }
            })),
        FieldSpec::textarea("description")
            .required()
            .rule(ValidationRule::min_length(10)),
        FieldSpec::file("image")
            .label("Product image")
            .attachment_policy(policy)
            .rule(ValidationRule::custom(|value: &FieldValue, form: &FormState| {
                if value.as_file().is_none() && form.text("imageUrl").trim().is_empty() {
                    Err("Product image is required".to_string())
                } else {
                    Ok(())
                }
            })),
        FieldSpec::text("imageUrl").label("Image URL"),
        FieldSpec::checkbox("handcrafted").default_value(true),
        FieldSpec::textarea("specs").description("One specification per line"),
        FieldSpec::text("sizeEu").label("EU size"),
        FieldSpec::text("sizeClothing").label("Clothing size"),
    ]
}

/// Product listings plus the form that adds to them.
pub struct ProductPage {
    catalog: Catalog,
    form: FormHandle,
}

impl ProductPage {
    pub fn new(catalog: Catalog, config: &EngineConfig) -> Result<Self, SchemaError> {
        let policy = AttachmentPolicy {
            allowed_mime_types: PRODUCT_IMAGE_TYPES.map(String::from).to_vec(),
            ..config.attachments.clone()
        };
        let form = FormHandle::define_with(
            schema(&policy),
            FormState::default(),
            FormOptions {
                reset_on_success: true,
                ..config.form
            },
        )?;
        Ok(Self { catalog, form })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn form(&self) -> &FormHandle {
        &self.form
    }

    /// Selects a product image. An admitted file empties the typed image URL.
    pub fn attach_image(&self, candidate: FileCandidate) -> FormResult<AttachOutcome> {
        let outcome = self.form.attach_file("image", candidate)?;
        if let AttachOutcome::Admitted(_) = &outcome {
            self.form.set_value("imageUrl", FieldValue::Empty)?;
        }
        Ok(outcome)
    }

    /// Validates the form and, on success, lists the product first in the
    /// catalog. The form is cleared only after an accepted submit.
    pub fn add_product(&mut self) -> FormResult<Submission<ProductId>> {
        let draft = match submit_model(&self.form, |draft: &ProductDraft| {
            tracing::info!(name = %draft.name, sku = %draft.sku, "product submitted");
        })? {
            Submission::Accepted(draft) => draft,
            Submission::Rejected(errors) => return Ok(Submission::Rejected(errors)),
        };
        let product = draft.into_product()?;
        let id = product.id;
        self.catalog.prepend(product);
        Ok(Submission::Accepted(id))
    }

    pub fn delete_product(&mut self, id: ProductId) -> Result<Product, CatalogError> {
        self.catalog.remove(id)
    }
}

fn parse_whole(value: &str) -> Option<u32> {
    let number = parse_number(value)?;
    if !number.fract().is_zero() || number < Decimal::ZERO {
        return None;
    }
    number.to_u32()
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> ProductPage {
        ProductPage::new(Catalog::with_seed(), &EngineConfig::default()).expect("product page")
    }

    fn fill(page: &ProductPage, values: &[(&str, &str)]) {
        for (key, value) in values {
            page.form().set_value(key, *value).expect("fill field");
        }
    }

    #[test]
    fn empty_form_uses_listing_messages() {
        let mut page = page();
        let Submission::Rejected(errors) = page.add_product().expect("add") else {
            panic!("empty product accepted");
        };
        assert_eq!(errors.message("name"), Some("Product name is required"));
        assert_eq!(errors.message("sku"), Some("SKU is required"));
        assert_eq!(errors.message("price"), Some("Price must be greater than 0"));
        assert_eq!(errors.message("stock"), Some("Stock must be 0 or greater"));
        assert_eq!(errors.message("description"), Some("Description is required"));
        assert_eq!(errors.message("image"), Some("Product image is required"));
        assert_eq!(errors.len(), 6);
        assert_eq!(page.catalog().len(), 3);
    }

    #[test]
    fn numbers_are_range_checked() {
        let page = page();
        fill(
            &page,
            &[("price", "0"), ("stock", "-1"), ("description", "Short one")],
        );
        let errors = page.form().validate().expect("validate").errors;
        assert_eq!(errors.message("price"), Some("Price must be greater than 0"));
        assert_eq!(errors.message("stock"), Some("Stock must be 0 or greater"));
        assert_eq!(
            errors.message("description"),
            Some("Description must be at least 10 characters")
        );

        fill(&page, &[("price", "abc"), ("stock", "2.5")]);
        let errors = page.form().validate().expect("validate").errors;
        assert_eq!(errors.message("price"), Some("Price must be greater than 0"));
        assert_eq!(errors.message("stock"), Some("Stock must be a whole number"));
    }

    #[test]
    fn url_listing_is_prepended_and_form_cleared() {
        let mut page = page();
        fill(
            &page,
            &[
                ("name", "  Singing Bowl "),
                ("sku", "SB-310"),
                ("price", "2450.50"),
                ("stock", "0"),
                ("description", "Hand-hammered brass singing bowl."),
                ("imageUrl", "https://cdn.example/bowl.png"),
                ("specs", "Brass\n\n  Hand-hammered  \n"),
            ],
        );
        page.form().set_value("handcrafted", false).expect("flag");

        let Submission::Accepted(id) = page.add_product().expect("add") else {
            panic!("valid product rejected");
        };
        let product = page.catalog().iter().next().expect("new listing");
        assert_eq!(product.id, id);
        assert_eq!(product.name, "Singing Bowl");
        assert_eq!(product.price, Decimal::new(245050, 2));
        assert_eq!(product.status, ProductStatus::OutOfStock);
        assert_eq!(product.specs, ["Brass", "Hand-hammered"]);
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.example/bowl.png"));
        assert!(!product.handcrafted);
        assert_eq!(product.size_eu, None);
        assert_eq!(page.catalog().len(), 4);

        let form = page.form();
        assert_eq!(form.value("name").expect("name"), FieldValue::Empty);
        assert_eq!(form.value("handcrafted").expect("flag"), FieldValue::Flag(true));
        assert!(form.errors().expect("errors").is_empty());
    }

    #[test]
    fn uploaded_image_replaces_the_typed_url() {
        let mut page = page();
        fill(
            &page,
            &[
                ("name", "Pashmina Shawl"),
                ("sku", "PSH-007"),
                ("price", "5200"),
                ("stock", "4"),
                ("description", "Soft pashmina shawl woven in Kathmandu."),
                ("imageUrl", "https://cdn.example/old.png"),
                ("sizeClothing", " M "),
            ],
        );
        let AttachOutcome::Admitted(file) = page
            .attach_image(FileCandidate::new("shawl.webp", 2048, "image/webp"))
            .expect("attach")
        else {
            panic!("webp image rejected");
        };
        assert_eq!(page.form().values().expect("values").text("imageUrl"), "");

        assert!(page.add_product().expect("add").is_accepted());
        let product = page.catalog().iter().next().expect("new listing");
        assert_eq!(product.image_url.as_deref(), Some(file.preview.as_str()));
        assert_eq!(product.status, ProductStatus::Live);
        assert_eq!(product.size_clothing.as_deref(), Some("M"));
    }

    #[test]
    fn rejected_image_keeps_the_typed_url() {
        let page = page();
        fill(&page, &[("imageUrl", "https://cdn.example/bowl.png")]);
        let outcome = page
            .attach_image(FileCandidate::new("bowl.bmp", 2048, "image/bmp"))
            .expect("attach");
        assert!(matches!(outcome, AttachOutcome::Rejected(_)));
        assert_eq!(
            page.form().values().expect("values").text("imageUrl"),
            "https://cdn.example/bowl.png"
        );
    }

    #[test]
    fn uploaded_image_wins_over_url_in_the_draft() {
        let draft = ProductDraft {
            name: "Bowl".to_string(),
            sku: "SB-1".to_string(),
            price: "10".to_string(),
            stock: "1".to_string(),
            description: "Brass bowl from Patan.".to_string(),
            image: Some(FileHandle::new(
                FileCandidate::new("bowl.png", 10, "image/png"),
                crate::form::PreviewUrl::new("blob:bowl"),
            )),
            image_url: "https://cdn.example/bowl.png".to_string(),
            handcrafted: true,
            specs: String::new(),
            size_eu: String::new(),
            size_clothing: String::new(),
        };
        let product = draft.into_product().expect("product");
        assert_eq!(product.image_url.as_deref(), Some("blob:bowl"));
    }

    #[test]
    fn documents_are_not_product_images() {
        let page = page();
        let outcome = page
            .form()
            .attach_file("image", FileCandidate::new("spec.pdf", 2048, "application/pdf"))
            .expect("attach");
        assert!(matches!(outcome, AttachOutcome::Rejected(_)));
        assert_eq!(
            page.form().field_error_for_display("image").expect("error"),
            Some("File must be JPG, PNG, WEBP, or GIF".to_string())
        );
    }

    #[test]
    fn delete_removes_a_listing() {
        let mut page = page();
        let id = page.catalog().iter().last().map(|product| product.id).expect("journal");
        let removed = page.delete_product(id).expect("delete");
        assert_eq!(removed.sku, "LKT-089");
        assert_eq!(page.catalog().out_of_stock_count(), 0);
        assert!(page.delete_product(id).is_err());
    }
}
