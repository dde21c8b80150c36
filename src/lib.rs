pub mod auth;
pub mod config;
pub mod harness;
pub mod shell;

pub mod store {
    pub mod event;
    pub mod in_memory;
    pub mod postgres;

    mod contract;
    pub use contract::{EventStore, EventStoreError};
}
