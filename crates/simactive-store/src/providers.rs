//! CRUD operations for [`Provider`] records.

use std::sync::Arc;

use rusqlite::params;
use simactive_shared::{Context, Entity, EntityId, Provider, RepoResult};

use crate::adapter::{expect_affected, PersistentStore};
use crate::database::Database;
use crate::error::{no_rows_as_not_found, Result};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new provider and return its generated id.
    pub fn insert_provider(&self, ctx: &Context, provider: &Provider) -> Result<EntityId> {
        self.run(ctx, |conn| {
            conn.execute(
                "INSERT INTO providers (name) VALUES (?1)",
                params![provider.name],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_provider(&self, ctx: &Context, id: EntityId) -> Result<Provider> {
        self.run(ctx, |conn| {
            conn.query_row(
                "SELECT id, name FROM providers WHERE id = ?1",
                params![id],
                row_to_provider,
            )
        })
        .map_err(no_rows_as_not_found)
    }

    pub fn get_provider_by_name(&self, ctx: &Context, name: &str) -> Result<Provider> {
        self.run(ctx, |conn| {
            conn.query_row(
                "SELECT id, name FROM providers WHERE name = ?1",
                params![name],
                row_to_provider,
            )
        })
        .map_err(no_rows_as_not_found)
    }

    /// List all providers, ordered by id.
    pub fn list_providers(&self, ctx: &Context) -> Result<Vec<Provider>> {
        self.run(ctx, |conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM providers ORDER BY id ASC")?;
            let rows = stmt.query_map([], row_to_provider)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    // ------------------------------------------------------------------
    // Update / Delete
    // ------------------------------------------------------------------

    /// Rewrite a provider's name.  Returns `true` if a row was updated.
    pub fn update_provider(&self, ctx: &Context, provider: &Provider) -> Result<bool> {
        let affected = self.run(ctx, |conn| {
            conn.execute(
                "UPDATE providers SET name = ?1 WHERE id = ?2",
                params![provider.name, provider.id],
            )
        })?;
        Ok(affected > 0)
    }

    // fails while any sim still references the provider
    pub fn delete_provider(&self, ctx: &Context, id: EntityId) -> Result<bool> {
        let affected = self.run(ctx, |conn| {
            conn.execute("DELETE FROM providers WHERE id = ?1", params![id])
        })?;
        Ok(affected > 0)
    }
}

fn row_to_provider(row: &rusqlite::Row<'_>) -> rusqlite::Result<Provider> {
    Ok(Provider {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// [`PersistentStore`] adapter over the `providers` table.
#[derive(Clone)]
pub struct ProviderStore {
    db: Arc<Database>,
}

impl ProviderStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Point lookup on the unique name column.
    pub fn by_name(&self, ctx: &Context, name: &str) -> RepoResult<Provider> {
        self.db
            .get_provider_by_name(ctx, name)
            .map_err(|e| e.into_repo(Provider::KIND, format!("name {name}")))
    }
}

impl PersistentStore<Provider> for ProviderStore {
    fn add(&self, ctx: &Context, provider: &Provider) -> RepoResult<EntityId> {
        let id = self
            .db
            .insert_provider(ctx, provider)
            .map_err(|e| e.into_repo(Provider::KIND, provider.describe()))?;
        tracing::debug!(id, name = %provider.name, "provider row inserted");
        Ok(id)
    }

    fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()> {
        expect_affected::<Provider>(id, self.db.delete_provider(ctx, id))
    }

    fn list(&self, ctx: &Context) -> RepoResult<Vec<Provider>> {
        self.db
            .list_providers(ctx)
            .map_err(|e| e.into_repo(Provider::KIND, "list"))
    }

    fn by_id(&self, ctx: &Context, id: EntityId) -> RepoResult<Provider> {
        self.db
            .get_provider(ctx, id)
            .map_err(|e| e.into_repo(Provider::KIND, format!("id {id}")))
    }

    fn update(&self, ctx: &Context, provider: &Provider) -> RepoResult<()> {
        match self.db.update_provider(ctx, provider) {
            Err(e) if e.is_unique_violation() => Err(e.into_repo(Provider::KIND, provider.describe())),
            other => expect_affected::<Provider>(provider.id, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use simactive_shared::{ErrorKind, RepoError};

    use super::*;

    fn store() -> ProviderStore {
        ProviderStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn add_assigns_increasing_ids() {
        let store = store();
        let ctx = Context::background();

        let a = store.add(&ctx, &Provider::new("Vodafone")).unwrap();
        let b = store.add(&ctx, &Provider::new("Tele2")).unwrap();
        assert!(a > 0);
        assert!(b > a);

        let names: Vec<_> = store
            .list(&ctx)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Vodafone", "Tele2"]);
    }

    #[test]
    fn duplicate_name_is_conflict() {
        let store = store();
        let ctx = Context::background();
        store.add(&ctx, &Provider::new("Vodafone")).unwrap();

        let err = store.add(&ctx, &Provider::new("Vodafone")).unwrap_err();
        assert_eq!(
            err,
            RepoError::conflict(Provider::KIND, "name Vodafone")
        );
    }

    #[test]
    fn lookup_by_name_and_id() {
        let store = store();
        let ctx = Context::background();
        let id = store.add(&ctx, &Provider::new("Beeline")).unwrap();

        assert_eq!(store.by_name(&ctx, "Beeline").unwrap().id, id);
        assert_eq!(store.by_id(&ctx, id).unwrap().name, "Beeline");
        assert!(store.by_name(&ctx, "MTS").unwrap_err().is_not_found());
        assert!(store.by_id(&ctx, id + 1).unwrap_err().is_not_found());
    }

    #[test]
    fn remove_missing_row_is_not_found() {
        let store = store();
        let ctx = Context::background();
        let id = store.add(&ctx, &Provider::new("Beeline")).unwrap();

        store.remove(&ctx, id).unwrap();
        assert_eq!(store.remove(&ctx, id).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn update_renames_and_detects_conflicts() {
        let store = store();
        let ctx = Context::background();
        let id = store.add(&ctx, &Provider::new("Beeline")).unwrap();
        store.add(&ctx, &Provider::new("MTS")).unwrap();

        let mut renamed = store.by_id(&ctx, id).unwrap();
        renamed.name = "Beeline KZ".into();
        store.update(&ctx, &renamed).unwrap();
        assert_eq!(store.by_id(&ctx, id).unwrap().name, "Beeline KZ");

        renamed.name = "MTS".into();
        assert!(store.update(&ctx, &renamed).unwrap_err().is_conflict());

        let ghost = Provider { id: 999, name: "Ghost".into() };
        assert!(store.update(&ctx, &ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn cancelled_context_is_internal() {
        let store = store();
        let ctx = Context::background();
        ctx.cancel();

        let err = store.add(&ctx, &Provider::new("Vodafone")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
