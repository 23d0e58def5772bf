//! CRUD operations for [`Service`] catalog records.

use std::sync::Arc;

use rusqlite::params;
use simactive_shared::{Context, Entity, EntityId, RepoResult, Service};

use crate::adapter::{expect_affected, PersistentStore};
use crate::database::Database;
use crate::error::{no_rows_as_not_found, Result};

impl Database {
    pub fn insert_service(&self, ctx: &Context, service: &Service) -> Result<EntityId> {
        self.run(ctx, |conn| {
            conn.execute(
                "INSERT INTO services (name) VALUES (?1)",
                params![service.name],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_service(&self, ctx: &Context, id: EntityId) -> Result<Service> {
        self.run(ctx, |conn| {
            conn.query_row(
                "SELECT id, name FROM services WHERE id = ?1",
                params![id],
                row_to_service,
            )
        })
        .map_err(no_rows_as_not_found)
    }

    pub fn list_services(&self, ctx: &Context) -> Result<Vec<Service>> {
        self.run(ctx, |conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM services ORDER BY id ASC")?;
            let rows = stmt.query_map([], row_to_service)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    pub fn update_service(&self, ctx: &Context, service: &Service) -> Result<bool> {
        let affected = self.run(ctx, |conn| {
            conn.execute(
                "UPDATE services SET name = ?1 WHERE id = ?2",
                params![service.name, service.id],
            )
        })?;
        Ok(affected > 0)
    }

    pub fn delete_service(&self, ctx: &Context, id: EntityId) -> Result<bool> {
        let affected = self.run(ctx, |conn| {
            conn.execute("DELETE FROM services WHERE id = ?1", params![id])
        })?;
        Ok(affected > 0)
    }
}

fn row_to_service(row: &rusqlite::Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// [`PersistentStore`] adapter over the `services` table.
#[derive(Clone)]
pub struct ServiceStore {
    db: Arc<Database>,
}

impl ServiceStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl PersistentStore<Service> for ServiceStore {
    fn add(&self, ctx: &Context, service: &Service) -> RepoResult<EntityId> {
        let id = self
            .db
            .insert_service(ctx, service)
            .map_err(|e| e.into_repo(Service::KIND, service.describe()))?;
        tracing::debug!(id, name = %service.name, "service row inserted");
        Ok(id)
    }

    fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()> {
        expect_affected::<Service>(id, self.db.delete_service(ctx, id))
    }

    fn list(&self, ctx: &Context) -> RepoResult<Vec<Service>> {
        self.db
            .list_services(ctx)
            .map_err(|e| e.into_repo(Service::KIND, "list"))
    }

    fn by_id(&self, ctx: &Context, id: EntityId) -> RepoResult<Service> {
        self.db
            .get_service(ctx, id)
            .map_err(|e| e.into_repo(Service::KIND, format!("id {id}")))
    }

    fn update(&self, ctx: &Context, service: &Service) -> RepoResult<()> {
        match self.db.update_service(ctx, service) {
            Err(e) if e.is_unique_violation() => Err(e.into_repo(Service::KIND, service.describe())),
            other => expect_affected::<Service>(service.id, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use simactive_shared::ErrorKind;

    use super::*;

    #[test]
    fn round_trip_and_conflict() {
        let store = ServiceStore::new(Arc::new(Database::open_in_memory().unwrap()));
        let ctx = Context::background();

        let id = store.add(&ctx, &Service::new("Telegram")).unwrap();
        assert_eq!(
            store.by_id(&ctx, id).unwrap(),
            Service { id, name: "Telegram".into() }
        );

        let err = store.add(&ctx, &Service::new("Telegram")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("Telegram"));

        store.remove(&ctx, id).unwrap();
        assert!(store.list(&ctx).unwrap().is_empty());
    }

    #[test]
    fn overlong_name_is_rejected_by_schema() {
        let store = ServiceStore::new(Arc::new(Database::open_in_memory().unwrap()));
        let ctx = Context::background();

        let err = store.add(&ctx, &Service::new("x".repeat(65))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
