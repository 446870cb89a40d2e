use provido::prelude::*;

struct Service;

impl Service {
    #[provider]
    fn config(&self) -> u8 {
        1
    }
}

fn main() {
    let _ = Service;
}
