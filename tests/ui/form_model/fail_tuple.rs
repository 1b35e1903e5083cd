#![allow(dead_code)]

#[derive(localhunt::form::FormModel)]
struct Credentials(String, String);

fn main() {}
