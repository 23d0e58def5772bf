//! # simactive-core
//!
//! Dual-tier repositories and the domain services built on them.
//!
//! Every entity type is kept in an in-memory [`Mirror`] and in the SQLite
//! store from `simactive-store`. [`WriteThroughRepository`] orders writes
//! across the two tiers and decides where reads are answered from;
//! [`Repositories`] bundles one repository per entity type and warms the
//! mirrors at startup.

mod gate;
pub mod mirror;
pub mod registry;
pub mod repository;
pub mod services;

pub use mirror::Mirror;
pub use registry::{
    ProviderRepository, Repositories, ServiceRepository, SimRepository, UsedServiceRepository,
    WarmReport,
};
pub use repository::WriteThroughRepository;
pub use services::{
    DomainServices, ProviderService, ServiceService, SimService, UsageService,
};
