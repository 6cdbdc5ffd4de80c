use std::sync::Arc;

use chrono::Duration;
use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{api::auth::Registration, auth::Rights};
use crate::store::{DynStore, MemoryStore, MongoStore, Store};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    /// Position names, in ballot order.
    positions: Vec<String>,
    #[serde(default = "default_max_candidates")]
    max_candidates_per_position: u32,
    admin_student_number: String,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

fn default_max_candidates() -> u32 {
    5
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to encrypt JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Positions seeded into an empty database, in ballot order.
    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    /// Most candidates that can be approved for one position.
    pub fn max_candidates_per_position(&self) -> u32 {
        self.max_candidates_per_position
    }

    /// Registration for the admin account created when none exists.
    fn default_admin(&self) -> Registration {
        Registration {
            student_number: self.admin_student_number.clone(),
            first_name: "Election".to_string(),
            last_name: "Administrator".to_string(),
            department: "Commission on Elections".to_string(),
            password: self.admin_password.clone(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Where election data is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Mongodb,
    Memory,
}

/// Configuration for the store.
#[derive(Deserialize)]
struct StoreConfig {
    storage: StorageKind,
    #[serde(default = "default_db_name")]
    db_name: String,
    // secrets
    db_uri: Option<String>,
}

fn default_db_name() -> String {
    "election".to_string()
}

/// A fairing that loads the store config, connects to the store, seeds the
/// positions and default admin, and places a [`DynStore`] into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Construct the store.
        let store: DynStore = match config.storage {
            StorageKind::Memory => {
                info!("Using in-memory store; data will not survive a restart");
                Arc::new(MemoryStore::new())
            }
            StorageKind::Mongodb => {
                let Some(db_uri) = config.db_uri else {
                    error!("`db_uri` must be set when `storage` is \"mongodb\"");
                    return Err(rocket);
                };
                info!("Loaded database config, connecting...");
                match MongoStore::connect(&db_uri, &config.db_name).await {
                    Ok(store) => Arc::new(store),
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
        };

        // Seed positions and make sure somebody can administer the election.
        let Some(app_config) = rocket.state::<Config>() else {
            error!("Application config must be loaded before the store");
            return Err(rocket);
        };
        if let Err(e) = seed(store.as_ref(), app_config).await {
            error!("Failed to prepare store: {e}");
            return Err(rocket);
        }
        info!("...store online!");

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

/// Insert the configured positions into an empty store, and create the default
/// admin if there is no admin yet.
///
/// This operation is idempotent.
async fn seed(store: &dyn Store, config: &Config) -> Result<()> {
    if store.positions().await?.is_empty() {
        for name in config.positions() {
            let position = store.insert_position(name).await?;
            info!("Created position {} ({})", position.name, position.id);
        }
    }

    if !store.admin_exists().await? {
        let admin = config.default_admin().into_account(Rights::Admin)?;
        store.insert_account(admin).await?;
        info!(
            "Created default admin account {}",
            config.admin_student_number
        );
    }

    Ok(())
}


#[cfg(test)]
pub use examples::{EXAMPLE_ADMIN, EXAMPLE_ADMIN_PASSWORD, EXAMPLE_POSITIONS};
