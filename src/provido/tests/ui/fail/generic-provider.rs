use provido::prelude::*;

#[provider]
fn generic<T>(_: &Container) -> u8 {
    1
}

fn main() {}
