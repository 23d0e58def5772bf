//! Domain services, one per entity type.

mod provider;
mod service;
mod sim;
mod used;

use std::sync::Arc;

use simactive_store::Database;

pub use provider::ProviderService;
pub use service::ServiceService;
pub use sim::SimService;
pub use used::UsageService;

use crate::registry::Repositories;

/// Every domain service, sharing one set of repositories.
#[derive(Clone)]
pub struct DomainServices {
    pub sims: SimService,
    pub services: ServiceService,
    pub providers: ProviderService,
    pub used: UsageService,
}

impl DomainServices {
    pub fn new(repos: &Repositories) -> Self {
        let providers = ProviderService::new(repos.providers.clone());
        Self {
            sims: SimService::new(repos.sims.clone(), repos.used.clone(), providers.clone()),
            services: ServiceService::new(repos.services.clone()),
            providers,
            used: UsageService::new(repos.used.clone()),
        }
    }

    /// Build fresh (cold) repositories over `db` and wrap them.
    pub fn open(db: Arc<Database>) -> Self {
        Self::new(&Repositories::new(db))
    }
}
