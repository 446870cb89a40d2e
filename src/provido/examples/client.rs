use std::error::Error;
use std::sync::Arc;

use parking_lot::RwLock;
use provido::prelude::*;
use serde::{Deserialize, Deserializer};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"{
    "addr": "127.0.0.1:5432",
    "password": "secret key"
}"#;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config_service = ConfigService::new(CONFIG);
    let client_service = ClientService::new(&config_service);

    let container = Container::new();
    container.on_close(|| {
        println!("container closed");
        Ok::<_, BoxError>(())
    });

    // The config is constructed on demand while the client is.
    let client = client_service.get(&container)?;
    println!("{}", client.config.addr());
    println!("{}", client.config.password);

    // Both services share the memoized config.
    let config = config_service.get(&container)?;
    config.set_addr("localhost:5432");
    println!("{}", client.config.addr());

    let fresh = client_service.get_new(&container)?;
    println!("fresh client sees {}", fresh.config.addr());

    container.close()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Config {
    #[serde(deserialize_with = "lockable")]
    addr: RwLock<String>,
    password: String,
}

fn lockable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RwLock<String>, D::Error> {
    String::deserialize(deserializer).map(RwLock::new)
}

impl Config {
    fn parse(text: &str) -> Result<Self, BoxError> {
        Ok(serde_json::from_str(text)?)
    }

    fn addr(&self) -> String {
        self.addr.read().clone()
    }

    fn set_addr(&self, addr: &str) {
        *self.addr.write() = addr.to_string();
    }
}

#[derive(Debug)]
struct Client {
    config: Arc<Config>,
}

struct ConfigService {
    handle: Handle<Config>,
}

impl ConfigService {
    fn new(text: &'static str) -> Self {
        Self {
            handle: Handle::from_fn(move |_: &Container| Config::parse(text)),
        }
    }

    fn get(&self, container: &Container) -> Result<Arc<Config>, ProvideError> {
        container.get(&self.handle)
    }
}

struct ClientService {
    handle: Handle<Client>,
}

impl ClientService {
    fn new(configs: &ConfigService) -> Self {
        let config = configs.handle.clone();
        Self {
            handle: Handle::from_fn(move |container: &Container| {
                let config = container.get(&config)?;
                Ok::<_, ProvideError>(Client { config })
            }),
        }
    }

    fn get(&self, container: &Container) -> Result<Arc<Client>, ProvideError> {
        self.handle.get(container)
    }

    fn get_new(&self, container: &Container) -> Result<Client, ProvideError> {
        self.handle.get_new(container)
    }
}
