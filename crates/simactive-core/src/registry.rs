//! The four repositories, built over one shared [`Database`].

use std::sync::Arc;

use simactive_shared::{Context, Provider, RepoResult, Service, Sim, UsedService};
use simactive_store::{Database, ProviderStore, ServiceStore, SimStore, UsedServiceStore};

use crate::repository::WriteThroughRepository;

pub type ProviderRepository = WriteThroughRepository<Provider, ProviderStore>;
pub type ServiceRepository = WriteThroughRepository<Service, ServiceStore>;
pub type SimRepository = WriteThroughRepository<Sim, SimStore>;
pub type UsedServiceRepository = WriteThroughRepository<UsedService, UsedServiceStore>;

/// Mirror sizes after a warm-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmReport {
    pub providers: usize,
    pub services: usize,
    pub sims: usize,
    pub used_services: usize,
}

#[derive(Clone)]
pub struct Repositories {
    pub providers: Arc<ProviderRepository>,
    pub services: Arc<ServiceRepository>,
    pub sims: Arc<SimRepository>,
    pub used: Arc<UsedServiceRepository>,
}

impl Repositories {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            providers: Arc::new(WriteThroughRepository::new(ProviderStore::new(db.clone()))),
            services: Arc::new(WriteThroughRepository::new(ServiceStore::new(db.clone()))),
            sims: Arc::new(WriteThroughRepository::new(SimStore::new(db.clone()))),
            used: Arc::new(WriteThroughRepository::new(UsedServiceStore::new(db))),
        }
    }

    /// Bulk-load every mirror from the store. Providers go first since SIMs
    /// embed them.
    pub fn warm_all(&self, ctx: &Context) -> RepoResult<WarmReport> {
        let report = WarmReport {
            providers: self.providers.warm(ctx)?,
            services: self.services.warm(ctx)?,
            sims: self.sims.warm(ctx)?,
            used_services: self.used.warm(ctx)?,
        };
        tracing::info!(?report, "all mirrors warmed");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use simactive_store::PersistentStore;

    use super::*;

    #[test]
    fn warm_all_loads_every_table() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let ctx = Context::background();

        let mut provider = Provider::new("Vodafone");
        provider.id = ProviderStore::new(db.clone()).add(&ctx, &provider).unwrap();
        let sim_id = SimStore::new(db.clone())
            .add(&ctx, &Sim::new("19998887766", provider))
            .unwrap();
        let service_id = ServiceStore::new(db.clone())
            .add(&ctx, &Service::new("Telegram"))
            .unwrap();
        UsedServiceStore::new(db.clone())
            .add(&ctx, &UsedService::new(sim_id, service_id))
            .unwrap();

        let repos = Repositories::new(db);
        let report = repos.warm_all(&ctx).unwrap();

        assert_eq!(
            report,
            WarmReport {
                providers: 1,
                services: 1,
                sims: 1,
                used_services: 1,
            }
        );
        assert_eq!(repos.sims.mirror().by_id(sim_id).unwrap().provider.name, "Vodafone");
    }
}
