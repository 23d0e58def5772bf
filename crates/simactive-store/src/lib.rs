//! # simactive-store
//!
//! SQLite-backed authoritative storage for providers, services, SIM cards
//! and usage links.
//!
//! A single [`Database`] handle owns the connection and runs the schema
//! migrations. Each entity gets a thin adapter implementing
//! [`PersistentStore`], which is what the write-through repositories in
//! `simactive-core` are built on.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod providers;
pub mod services;
pub mod sims;
pub mod used;

mod error;

pub use adapter::PersistentStore;
pub use database::Database;
pub use error::StoreError;
pub use providers::ProviderStore;
pub use services::ServiceStore;
pub use sims::SimStore;
pub use used::UsedServiceStore;
