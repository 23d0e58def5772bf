use std::sync::Arc;

use simactive_shared::{Context, EntityId, RepoResult, Service};

use crate::registry::ServiceRepository;

/// Catalog of services a SIM can be used for.
#[derive(Clone)]
pub struct ServiceService {
    repo: Arc<ServiceRepository>,
}

impl ServiceService {
    pub fn new(repo: Arc<ServiceRepository>) -> Self {
        Self { repo }
    }

    pub fn add(&self, ctx: &Context, name: &str) -> RepoResult<EntityId> {
        self.repo.add(ctx, &Service::new(name))
    }

    pub fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()> {
        self.repo.remove(ctx, id)
    }

    pub fn list(&self, ctx: &Context) -> RepoResult<Vec<Service>> {
        self.repo.list(ctx)
    }

    pub fn rename(&self, ctx: &Context, id: EntityId, name: &str) -> RepoResult<Service> {
        let mut service = self.repo.by_id(ctx, id)?;
        service.name = name.to_owned();
        self.repo.update(ctx, &service)?;
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use simactive_store::Database;

    use super::*;
    use crate::registry::Repositories;

    #[test]
    fn rename_and_remove() {
        let repos = Repositories::new(Arc::new(Database::open_in_memory().unwrap()));
        let services = ServiceService::new(repos.services.clone());
        let ctx = Context::background();

        let id = services.add(&ctx, "Telegram").unwrap();
        let other = services.add(&ctx, "Viber").unwrap();

        assert_eq!(services.rename(&ctx, id, "Telegram X").unwrap().name, "Telegram X");
        assert!(services.rename(&ctx, other, "Telegram X").unwrap_err().is_conflict());

        services.remove(&ctx, id).unwrap();
        let names: Vec<_> = services
            .list(&ctx)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Viber"]);
    }
}
