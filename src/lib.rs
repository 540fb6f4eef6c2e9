pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod output;
pub mod parser;
pub mod query;
pub mod scheduler;
pub mod snapshot;
pub mod stats;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
