//! The persistent-store boundary consumed by the write-through repositories.

use simactive_shared::{Context, Entity, EntityId, RepoResult};

/// Authoritative storage for one entity type.
///
/// Implementations report uniqueness violations as `Conflict`, missing rows
/// (including zero affected rows on update/delete) as `NotFound`, and
/// everything else, cancellation included, as `Internal`.
pub trait PersistentStore<E: Entity>: Send + Sync {
    /// Insert a new row and return the id the store assigned.
    fn add(&self, ctx: &Context, entity: &E) -> RepoResult<EntityId>;

    fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()>;

    /// Full scan, ordered by id.
    fn list(&self, ctx: &Context) -> RepoResult<Vec<E>>;

    fn by_id(&self, ctx: &Context, id: EntityId) -> RepoResult<E>;

    /// Full-row update keyed by `entity.id()`.
    fn update(&self, ctx: &Context, entity: &E) -> RepoResult<()>;
}

/// Collapse an affected-row flag from an UPDATE/DELETE into the repository
/// taxonomy: no affected row means the id does not exist.
pub(crate) fn expect_affected<E: Entity>(
    id: EntityId,
    result: crate::error::Result<bool>,
) -> RepoResult<()> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => Err(simactive_shared::RepoError::not_found(
            E::KIND,
            format!("id {id}"),
        )),
        Err(e) => Err(e.into_repo(E::KIND, format!("id {id}"))),
    }
}
