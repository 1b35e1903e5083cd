#![allow(dead_code)]

#[derive(localhunt::form::FormModel)]
struct Contact {
    #[form(rename = "email")]
    contact_email: String,
}

fn main() {}
