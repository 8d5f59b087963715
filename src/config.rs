use std::time::Duration;

use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::{
    model::mongodb::ensure_indexes_exist,
    store::{MemoryStore, MongoGroupStore, Store},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_vote_batch_wait_ms")]
    vote_batch_wait_ms: u64,
    #[serde(default = "default_phase_sweep_secs")]
    phase_sweep_secs: u64,
    #[serde(default = "default_save_conflict_retries")]
    save_conflict_retries: u32,
}

fn default_vote_batch_wait_ms() -> u64 {
    1000
}

fn default_phase_sweep_secs() -> u64 {
    30
}

fn default_save_conflict_retries() -> u32 {
    3
}

impl Config {
    /// Bounded wait for the first submission of a batch.
    pub fn vote_batch_wait(&self) -> Duration {
        Duration::from_millis(self.vote_batch_wait_ms)
    }

    /// Time between sweeps for expired suggestion timers.
    pub fn phase_sweep_period(&self) -> Duration {
        Duration::from_secs(self.phase_sweep_secs.max(1))
    }

    /// How many times a batch is re-applied after the group changed underneath it.
    pub fn save_conflict_retries(&self) -> u32 {
        self.save_conflict_retries
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
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
        debug!("Loaded config: {config:?}");

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: Option<String>,
}

/// A fairing that loads the MongoDB config, connects to the database, makes sure
/// the indexes exist, and places the group [`Store`] into managed state.
///
/// Without a `db_uri` the groups are kept in memory instead.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let Some(db_uri) = config.db_uri else {
            warn!("No `db_uri` configured, groups will only be kept in memory");
            return Ok(rocket.manage(Store::new(MemoryStore::new())));
        };
        info!("Loaded database config, connecting...");

        // Construct the connection.
        let client = match MongoClient::with_uri_str(db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        let store = Store::new(MongoGroupStore::new(&db));
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

/// Get the name of the database to use.
fn get_database_name() -> String {
    "babmomok".to_string()
}
