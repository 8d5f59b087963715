#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;
use crate::pipeline::PipelineFairing;
use crate::store::Store;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod store;

/// Build the server, with the group store chosen by the database config.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(PipelineFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
}

/// Build the server on top of an existing group store.
pub fn rocket_for_store(store: Store) -> Rocket<Build> {
    rocket::build()
        .manage(store)
        .attach(ConfigFairing)
        .attach(PipelineFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
}
