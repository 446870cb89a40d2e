use provido::prelude::*;

#[provider]
async fn config(_: &Container) -> u8 {
    1
}

fn main() {}
