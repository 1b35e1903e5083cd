use futures::executor::block_on;
use localhunt::form::LocalBlobPreview;
use localhunt::pages::{login, seller_product::ProductPage, seller_signup};
use localhunt::prelude::*;

#[test]
fn seller_onboarding_then_first_listing() {
    let config = EngineConfig::from_toml_str(
        r#"
        [form]
        preview_debounce_ms = 5
        "#,
    )
    .expect("config");

    let signup = seller_signup::form(&config).expect("seller signup form");
    for (key, value) in [
        ("userName", "Mina"),
        ("phoneNumber", "9812345678"),
        ("contactEmail", "mina@dhaka.example"),
        ("location", "Palpa"),
        ("businessName", "Palpali Dhaka House"),
        ("businessCategory", "fashion"),
        ("businessPanVat", "609123456"),
        ("businessLocation", "Tansen, Palpa"),
        ("password", "dhaka-2024"),
        ("confirmPassword", "dhaka-2024"),
    ] {
        signup.set_value(key, value).expect("fill signup");
    }
    for key in ["biz-cert", "pan-cert"] {
        let outcome = block_on(signup.attach_file_async(
            key,
            FileCandidate::new(format!("{key}.pdf"), 300_000, "application/pdf"),
            &LocalBlobPreview,
        ))
        .expect("attach document");
        assert!(matches!(outcome, AttachOutcome::Admitted(_)));
    }
    let application = seller_signup::submit(&signup)
        .expect("submit signup")
        .accepted()
        .expect("application accepted");
    assert_eq!(application.business_category, "fashion");

    let login = login::form().expect("login form");
    login.set_value("email", "mina@dhaka.example").expect("email");
    login.set_value("password", "dhaka-2024").expect("password");
    assert!(
        login::submit(login::Audience::Seller, &login)
            .expect("login")
            .is_accepted()
    );

    let mut products = ProductPage::new(Catalog::with_seed(), &config).expect("product page");
    for (key, value) in [
        ("name", "Dhaka Topi"),
        ("sku", "TOP-001"),
        ("price", "1200"),
        ("stock", "12"),
        ("description", "Traditional Palpali Dhaka cap."),
        ("imageUrl", "https://cdn.example/topi.png"),
    ] {
        products.form().set_value(key, value).expect("fill product");
    }
    let Submission::Accepted(id) = products.add_product().expect("add product") else {
        panic!("listing rejected");
    };
    let listed = products.catalog().get(id).expect("listed product");
    assert_eq!(listed.status, ProductStatus::Live);
    assert_eq!(products.catalog().live_count(), 3);
}

#[test]
fn rejected_submit_exposes_errors_through_the_handle() {
    let form = login::form().expect("login form");
    let result = form.submit(|_| {}).expect("submit");
    assert!(!result.ok);
    assert_eq!(form.submit_state().expect("state"), SubmitState::Failed);

    let views = form.field_views().expect("views");
    assert!(views.iter().all(|view| view.has_error()));
    assert_eq!(
        form.first_error().expect("first error").map(FieldKey::as_str),
        Some("email")
    );
}
