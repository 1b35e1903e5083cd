#![allow(dead_code)]

#[derive(localhunt::form::FormModel)]
struct Contact {
    email: String,
    #[form(key = "email")]
    backup_email: String,
}

fn main() {}
