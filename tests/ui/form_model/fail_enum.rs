#![allow(dead_code)]

#[derive(localhunt::form::FormModel)]
enum Audience {
    Buyer,
    Seller,
}

fn main() {}
