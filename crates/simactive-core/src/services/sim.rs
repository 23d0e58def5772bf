//! SIM card operations.
//!
//! Adding a SIM or moving it to another provider resolves the provider by
//! name first and creates it if needed. Provider creation and the SIM write
//! are independent, so a failed SIM write can leave an unused provider
//! behind but never a SIM pointing at an unknown provider.

use std::sync::Arc;

use simactive_shared::{Context, EntityId, RepoResult, Sim, UsedService};

use crate::registry::{SimRepository, UsedServiceRepository};
use crate::services::ProviderService;

#[derive(Clone)]
pub struct SimService {
    sims: Arc<SimRepository>,
    used: Arc<UsedServiceRepository>,
    providers: ProviderService,
}

impl SimService {
    pub fn new(
        sims: Arc<SimRepository>,
        used: Arc<UsedServiceRepository>,
        providers: ProviderService,
    ) -> Self {
        Self {
            sims,
            used,
            providers,
        }
    }

    /// Persist a new SIM. Only `sim.provider.name` is read from the embedded
    /// provider; its id is resolved here.
    pub fn add(&self, ctx: &Context, mut sim: Sim) -> RepoResult<EntityId> {
        sim.provider = self.providers.resolve(ctx, &sim.provider.name)?;
        self.sims.add(ctx, &sim)
    }

    pub fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()> {
        self.sims.remove(ctx, id)
    }

    pub fn list(&self, ctx: &Context) -> RepoResult<Vec<Sim>> {
        self.sims.list(ctx)
    }

    pub fn by_id(&self, ctx: &Context, id: EntityId) -> RepoResult<Sim> {
        self.sims.by_id(ctx, id)
    }

    pub fn activate(&self, ctx: &Context, id: EntityId) -> RepoResult<Sim> {
        self.modify(ctx, id, |sim| sim.is_activated = true)
    }

    pub fn block(&self, ctx: &Context, id: EntityId) -> RepoResult<Sim> {
        self.modify(ctx, id, |sim| sim.is_blocked = true)
    }

    pub fn change_provider(
        &self,
        ctx: &Context,
        id: EntityId,
        provider_name: &str,
    ) -> RepoResult<Sim> {
        let mut sim = self.sims.by_id(ctx, id)?;
        sim.provider = self.providers.resolve(ctx, provider_name)?;
        self.sims.update(ctx, &sim)?;
        Ok(sim)
    }

    /// Usage links recorded for an existing SIM.
    pub fn used_services(&self, ctx: &Context, id: EntityId) -> RepoResult<Vec<UsedService>> {
        self.sims.by_id(ctx, id)?;

        let mut links = self.used.list(ctx)?;
        links.retain(|link| link.sim_id == id);
        Ok(links)
    }

    fn modify<F>(&self, ctx: &Context, id: EntityId, apply: F) -> RepoResult<Sim>
    where
        F: FnOnce(&mut Sim),
    {
        let mut sim = self.sims.by_id(ctx, id)?;
        apply(&mut sim);
        self.sims.update(ctx, &sim)?;
        Ok(sim)
    }
}
