#![allow(dead_code)]

#[derive(localhunt::form::FormModel)]
struct Wrapper<T> {
    value: T,
}

fn main() {}
