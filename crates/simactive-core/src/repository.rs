//! Write-through repository: one generic component composing a
//! [`PersistentStore`] with a [`Mirror`].
//!
//! Ordering rules:
//! - `add` goes to the store first (it assigns the id), then the mirror.
//! - `remove` and `update` go to the mirror first, then the store. A store
//!   failure puts the mirror back the way it was when that is still possible.
//!   Both hold the id's write gate until the store call and any rollback are
//!   done, so writes to one id never interleave.
//! - Reads prefer the mirror and fall back to the store without writing the
//!   result back. Only [`WriteThroughRepository::warm`] bulk-loads the mirror.

use simactive_shared::{Context, Entity, EntityId, RepoError, RepoResult};
use simactive_store::PersistentStore;

use crate::gate::WriteGate;
use crate::mirror::Mirror;

pub struct WriteThroughRepository<E: Entity, S: PersistentStore<E>> {
    store: S,
    mirror: Mirror<E>,
    gate: WriteGate,
}

impl<E: Entity, S: PersistentStore<E>> WriteThroughRepository<E, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            mirror: Mirror::new(),
            gate: WriteGate::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mirror(&self) -> &Mirror<E> {
        &self.mirror
    }

    /// Persist `entity` and mirror it under the id the store assigned.
    pub fn add(&self, ctx: &Context, entity: &E) -> RepoResult<EntityId> {
        let id = self.store.add(ctx, entity)?;

        let mut stored = entity.clone();
        stored.set_id(id);
        if let Err(e) = self.mirror.add(stored) {
            tracing::warn!(
                entity = %E::KIND,
                id,
                error = %e,
                "stored row could not be mirrored"
            );
        }

        tracing::info!(entity = %E::KIND, id, item = %entity.describe(), "added");
        Ok(id)
    }

    pub fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()> {
        let _gate = self.gate.enter(E::KIND, id)?;
        let evicted = self.mirror.remove(id)?;

        match self.store.remove(ctx, id) {
            Ok(()) => {
                tracing::info!(entity = %E::KIND, id, "removed");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(entity = %E::KIND, id, "mirrored entry had no stored row");
                Err(RepoError::Inconsistent {
                    entity: E::KIND,
                    id,
                    detail: "mirrored entry had no stored row".into(),
                })
            }
            Err(e) => match self.mirror.add(evicted) {
                // a concurrent warm-up may already have put the row back
                Ok(()) | Err(RepoError::Conflict { .. }) => {
                    tracing::debug!(entity = %E::KIND, id, error = %e, "store remove failed, mirror entry restored");
                    Err(e)
                }
                Err(restore) => {
                    tracing::warn!(
                        entity = %E::KIND,
                        id,
                        error = %e,
                        restore_error = %restore,
                        "store remove failed and mirror entry could not be restored"
                    );
                    Err(RepoError::Inconsistent {
                        entity: E::KIND,
                        id,
                        detail: format!("store remove failed: {e}"),
                    })
                }
            },
        }
    }

    /// Mirror snapshot, or a cold load from the store when the mirror is empty.
    pub fn list(&self, ctx: &Context) -> RepoResult<Vec<E>> {
        match self.mirror.list() {
            Ok(entities) if !entities.is_empty() => Ok(entities),
            Ok(_) => {
                tracing::debug!(entity = %E::KIND, "mirror empty, listing from store");
                self.store.list(ctx)
            }
            Err(e) => {
                tracing::warn!(entity = %E::KIND, error = %e, "mirror unavailable, listing from store");
                self.store.list(ctx)
            }
        }
    }

    pub fn by_id(&self, ctx: &Context, id: EntityId) -> RepoResult<E> {
        match self.mirror.by_id(id) {
            Ok(entity) => Ok(entity),
            Err(e) => {
                tracing::debug!(entity = %E::KIND, id, reason = %e, "mirror miss, reading from store");
                self.store.by_id(ctx, id)
            }
        }
    }

    /// Rewrite an entity that is already mirrored.
    pub fn update(&self, ctx: &Context, entity: &E) -> RepoResult<()> {
        let id = entity.id();
        let _gate = self.gate.enter(E::KIND, id)?;
        let previous = self.mirror.update(entity.clone())?;

        if let Err(e) = self.store.update(ctx, entity) {
            match self.mirror.restore_if(entity, previous) {
                Ok(true) => {
                    tracing::debug!(entity = %E::KIND, id, error = %e, "store update failed, previous mirror value restored");
                }
                Ok(false) => {
                    tracing::warn!(
                        entity = %E::KIND,
                        id,
                        error = %e,
                        "store update failed and the mirror entry changed meanwhile, left as is"
                    );
                }
                Err(restore) => {
                    tracing::warn!(
                        entity = %E::KIND,
                        id,
                        error = %e,
                        restore_error = %restore,
                        "store update failed and previous mirror value could not be restored"
                    );
                }
            }
            return Err(e);
        }

        tracing::info!(entity = %E::KIND, id, "updated");
        Ok(())
    }

    /// Attribute lookup: the mirror first, then `fallback` against the store.
    pub fn find_by<P, F>(&self, ctx: &Context, predicate: P, fallback: F) -> RepoResult<E>
    where
        P: Fn(&E) -> bool,
        F: FnOnce(&Context) -> RepoResult<E>,
    {
        match self.mirror.find_by(predicate) {
            Ok(Some(entity)) => Ok(entity),
            Ok(None) => fallback(ctx),
            Err(e) => {
                tracing::warn!(entity = %E::KIND, error = %e, "mirror unavailable, searching store");
                fallback(ctx)
            }
        }
    }

    /// Load every stored row into the mirror. Returns the number loaded.
    pub fn warm(&self, ctx: &Context) -> RepoResult<usize> {
        let rows = self.store.list(ctx)?;
        let loaded = self.mirror.load(rows)?;
        tracing::info!(entity = %E::KIND, loaded, "mirror warmed");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use simactive_shared::{ErrorKind, Service};
    use simactive_store::{Database, ServiceStore};

    use super::*;

    fn repo() -> WriteThroughRepository<Service, ServiceStore> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        WriteThroughRepository::new(ServiceStore::new(db))
    }

    #[test]
    fn add_populates_both_tiers() {
        let repo = repo();
        let ctx = Context::background();

        let id = repo.add(&ctx, &Service::new("Telegram")).unwrap();

        assert_eq!(repo.mirror().by_id(id).unwrap().name, "Telegram");
        assert_eq!(repo.store().by_id(&ctx, id).unwrap().name, "Telegram");
    }

    #[test]
    fn failed_add_leaves_mirror_untouched() {
        let repo = repo();
        let ctx = Context::background();
        repo.add(&ctx, &Service::new("Telegram")).unwrap();

        let err = repo.add(&ctx, &Service::new("Telegram")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(repo.mirror().len().unwrap(), 1);
    }

    #[test]
    fn by_id_falls_back_without_repopulating() {
        let repo = repo();
        let ctx = Context::background();
        let id = repo.store().add(&ctx, &Service::new("WhatsApp")).unwrap();

        assert_eq!(repo.by_id(&ctx, id).unwrap().name, "WhatsApp");
        assert!(repo.mirror().is_empty().unwrap());
    }

    #[test]
    fn warm_then_update_reaches_both_tiers() {
        let repo = repo();
        let ctx = Context::background();
        let id = repo.store().add(&ctx, &Service::new("Viber")).unwrap();

        let renamed = Service { id, name: "Viber Out".into() };
        assert!(repo.update(&ctx, &renamed).unwrap_err().is_not_found());

        assert_eq!(repo.warm(&ctx).unwrap(), 1);
        repo.update(&ctx, &renamed).unwrap();
        assert_eq!(repo.mirror().by_id(id).unwrap(), renamed);
        assert_eq!(repo.store().by_id(&ctx, id).unwrap(), renamed);
    }

    #[test]
    fn update_conflict_restores_previous_mirror_value() {
        let repo = repo();
        let ctx = Context::background();
        let id = repo.add(&ctx, &Service::new("Viber")).unwrap();
        repo.add(&ctx, &Service::new("Skype")).unwrap();

        let clash = Service { id, name: "Skype".into() };
        assert!(repo.update(&ctx, &clash).unwrap_err().is_conflict());
        assert_eq!(repo.mirror().by_id(id).unwrap().name, "Viber");
    }
}
