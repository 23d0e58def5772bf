use std::sync::Arc;

use simactive_shared::{Context, Entity, EntityId, Provider, RepoResult};

use crate::registry::ProviderRepository;

#[derive(Clone)]
pub struct ProviderService {
    repo: Arc<ProviderRepository>,
}

impl ProviderService {
    pub fn new(repo: Arc<ProviderRepository>) -> Self {
        Self { repo }
    }

    pub fn add(&self, ctx: &Context, name: &str) -> RepoResult<EntityId> {
        self.repo.add(ctx, &Provider::new(name))
    }

    pub fn list(&self, ctx: &Context) -> RepoResult<Vec<Provider>> {
        self.repo.list(ctx)
    }

    pub fn by_name(&self, ctx: &Context, name: &str) -> RepoResult<Provider> {
        self.repo.find_by(
            ctx,
            |p| p.name == name,
            |ctx| self.repo.store().by_name(ctx, name),
        )
    }

    /// Look a provider up by name, creating it when it does not exist yet.
    ///
    /// A concurrent caller may create the same provider between the lookup
    /// and the insert; the resulting conflict is answered with one more
    /// lookup.
    pub fn resolve(&self, ctx: &Context, name: &str) -> RepoResult<Provider> {
        match self.by_name(ctx, name) {
            Ok(provider) => return Ok(provider),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let mut provider = Provider::new(name);
        match self.repo.add(ctx, &provider) {
            Ok(id) => {
                provider.set_id(id);
                tracing::info!(id, name, "provider created on demand");
                Ok(provider)
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(name, "provider created concurrently, looking it up again");
                self.by_name(ctx, name)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use simactive_store::{Database, PersistentStore};

    use super::*;
    use crate::registry::Repositories;

    fn service() -> (Repositories, ProviderService) {
        let repos = Repositories::new(Arc::new(Database::open_in_memory().unwrap()));
        let service = ProviderService::new(repos.providers.clone());
        (repos, service)
    }

    #[test]
    fn by_name_checks_mirror_then_store() {
        let (repos, providers) = service();
        let ctx = Context::background();

        let mirrored = providers.add(&ctx, "Vodafone").unwrap();
        let cold = repos
            .providers
            .store()
            .add(&ctx, &Provider::new("Tele2"))
            .unwrap();

        assert_eq!(providers.by_name(&ctx, "Vodafone").unwrap().id, mirrored);
        assert_eq!(providers.by_name(&ctx, "Tele2").unwrap().id, cold);
        assert!(providers.by_name(&ctx, "MTS").unwrap_err().is_not_found());
    }

    #[test]
    fn resolve_creates_once_and_reuses() {
        let (_, providers) = service();
        let ctx = Context::background();

        let first = providers.resolve(&ctx, "Beeline").unwrap();
        let second = providers.resolve(&ctx, "Beeline").unwrap();

        assert!(first.is_persisted());
        assert_eq!(first, second);
        assert_eq!(providers.list(&ctx).unwrap().len(), 1);
    }
}
