use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use provido::prelude::*;

#[derive(Debug)]
struct SetupError;

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "setup failed")
    }
}

impl Error for SetupError {}

#[provider]
fn infallible(_: &Container) -> u32 {
    1
}

#[provider]
fn fallible(_: &Container) -> Result<u64, SetupError> {
    Ok(2)
}

#[provider]
fn qualified_path(container: &provido::container::Container) -> std::result::Result<String, SetupError> {
    let number = container.get(infallible()).map_err(|_| SetupError)?;
    Ok(number.to_string())
}

#[provider]
fn boxed(_: &Container) -> Result<Vec<i32>, Box<dyn Error + Send + Sync>> {
    Ok(Vec::new())
}

#[provider]
fn tuple(_: &Container) -> (u8, &'static str) {
    (3, "three")
}

#[provider(crate = provido)]
fn renamed(_: &Container) -> bool {
    true
}

fn main() {
    let container = Container::new();
    let _: std::sync::Arc<u32> = container.get(infallible()).unwrap();
    let _: std::sync::Arc<u64> = container.get(fallible()).unwrap();
    let _: std::sync::Arc<String> = container.get(qualified_path()).unwrap();
    let _: std::sync::Arc<Vec<i32>> = container.get(boxed()).unwrap();
    let _: std::sync::Arc<(u8, &'static str)> = container.get(tuple()).unwrap();
    let _: std::sync::Arc<bool> = container.get(renamed()).unwrap();
}
