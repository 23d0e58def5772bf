use std::sync::Arc;

use simactive_shared::{Context, EntityId, RepoResult, UsedService};

use crate::registry::UsedServiceRepository;

/// Records which SIM was used for which service.
#[derive(Clone)]
pub struct UsageService {
    repo: Arc<UsedServiceRepository>,
}

impl UsageService {
    pub fn new(repo: Arc<UsedServiceRepository>) -> Self {
        Self { repo }
    }

    /// New links start unblocked with empty block info.
    pub fn use_sim_for_service(
        &self,
        ctx: &Context,
        sim_id: EntityId,
        service_id: EntityId,
    ) -> RepoResult<EntityId> {
        self.repo.add(ctx, &UsedService::new(sim_id, service_id))
    }

    pub fn list(&self, ctx: &Context) -> RepoResult<Vec<UsedService>> {
        self.repo.list(ctx)
    }

    pub fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()> {
        self.repo.remove(ctx, id)
    }

    pub fn block(&self, ctx: &Context, id: EntityId, info: &str) -> RepoResult<UsedService> {
        let mut used = self.repo.by_id(ctx, id)?;
        used.is_blocked = true;
        used.blocked_info = info.to_owned();
        self.repo.update(ctx, &used)?;
        Ok(used)
    }
}
