use provido::prelude::*;

#[provider]
fn config(_: &Container, _: u8) -> u8 {
    1
}

fn main() {}
