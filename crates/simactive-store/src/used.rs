//! CRUD operations for [`UsedService`] usage links.

use std::sync::Arc;

use rusqlite::params;
use simactive_shared::{Context, Entity, EntityId, RepoResult, UsedService};

use crate::adapter::{expect_affected, PersistentStore};
use crate::database::Database;
use crate::error::{no_rows_as_not_found, Result};

impl Database {
    pub fn insert_used_service(&self, ctx: &Context, used: &UsedService) -> Result<EntityId> {
        self.run(ctx, |conn| {
            conn.execute(
                "INSERT INTO used_services (sim_id, service_id, is_blocked, blocked_info)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    used.sim_id,
                    used.service_id,
                    used.is_blocked as i32,
                    used.blocked_info,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_used_service(&self, ctx: &Context, id: EntityId) -> Result<UsedService> {
        self.run(ctx, |conn| {
            conn.query_row(
                "SELECT id, sim_id, service_id, is_blocked, blocked_info
                 FROM used_services
                 WHERE id = ?1",
                params![id],
                row_to_used_service,
            )
        })
        .map_err(no_rows_as_not_found)
    }

    pub fn list_used_services(&self, ctx: &Context) -> Result<Vec<UsedService>> {
        self.run(ctx, |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sim_id, service_id, is_blocked, blocked_info
                 FROM used_services
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], row_to_used_service)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    pub fn update_used_service(&self, ctx: &Context, used: &UsedService) -> Result<bool> {
        let affected = self.run(ctx, |conn| {
            conn.execute(
                "UPDATE used_services
                 SET sim_id = ?1, service_id = ?2, is_blocked = ?3, blocked_info = ?4
                 WHERE id = ?5",
                params![
                    used.sim_id,
                    used.service_id,
                    used.is_blocked as i32,
                    used.blocked_info,
                    used.id,
                ],
            )
        })?;
        Ok(affected > 0)
    }

    pub fn delete_used_service(&self, ctx: &Context, id: EntityId) -> Result<bool> {
        let affected = self.run(ctx, |conn| {
            conn.execute("DELETE FROM used_services WHERE id = ?1", params![id])
        })?;
        Ok(affected > 0)
    }
}

fn row_to_used_service(row: &rusqlite::Row<'_>) -> rusqlite::Result<UsedService> {
    let is_blocked: i32 = row.get(3)?;

    Ok(UsedService {
        id: row.get(0)?,
        sim_id: row.get(1)?,
        service_id: row.get(2)?,
        is_blocked: is_blocked != 0,
        blocked_info: row.get(4)?,
    })
}

/// [`PersistentStore`] adapter over the `used_services` table.
#[derive(Clone)]
pub struct UsedServiceStore {
    db: Arc<Database>,
}

impl UsedServiceStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl PersistentStore<UsedService> for UsedServiceStore {
    fn add(&self, ctx: &Context, used: &UsedService) -> RepoResult<EntityId> {
        let id = self
            .db
            .insert_used_service(ctx, used)
            .map_err(|e| e.into_repo(UsedService::KIND, used.describe()))?;
        tracing::debug!(
            id,
            sim_id = used.sim_id,
            service_id = used.service_id,
            "used service row inserted"
        );
        Ok(id)
    }

    fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()> {
        expect_affected::<UsedService>(id, self.db.delete_used_service(ctx, id))
    }

    fn list(&self, ctx: &Context) -> RepoResult<Vec<UsedService>> {
        self.db
            .list_used_services(ctx)
            .map_err(|e| e.into_repo(UsedService::KIND, "list"))
    }

    fn by_id(&self, ctx: &Context, id: EntityId) -> RepoResult<UsedService> {
        self.db
            .get_used_service(ctx, id)
            .map_err(|e| e.into_repo(UsedService::KIND, format!("id {id}")))
    }

    fn update(&self, ctx: &Context, used: &UsedService) -> RepoResult<()> {
        match self.db.update_used_service(ctx, used) {
            Err(e) if e.is_unique_violation() => {
                Err(e.into_repo(UsedService::KIND, used.describe()))
            }
            other => expect_affected::<UsedService>(used.id, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use simactive_shared::{ErrorKind, Provider, Service, Sim};

    use super::*;
    use crate::{ProviderStore, ServiceStore, SimStore};

    struct Fixture {
        used: UsedServiceStore,
        sim_id: EntityId,
        service_id: EntityId,
    }

    fn fixture() -> Fixture {
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

        Fixture {
            used: UsedServiceStore::new(db),
            sim_id,
            service_id,
        }
    }

    #[test]
    fn link_is_unique_per_sim_and_service() {
        let f = fixture();
        let ctx = Context::background();

        let id = f
            .used
            .add(&ctx, &UsedService::new(f.sim_id, f.service_id))
            .unwrap();
        assert!(id > 0);

        let err = f
            .used
            .add(&ctx, &UsedService::new(f.sim_id, f.service_id))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn block_info_is_persisted() {
        let f = fixture();
        let ctx = Context::background();
        let id = f
            .used
            .add(&ctx, &UsedService::new(f.sim_id, f.service_id))
            .unwrap();

        let mut used = f.used.by_id(&ctx, id).unwrap();
        assert!(!used.is_blocked);
        used.is_blocked = true;
        used.blocked_info = "banned by service".into();
        f.used.update(&ctx, &used).unwrap();

        assert_eq!(f.used.by_id(&ctx, id).unwrap(), used);
    }

    #[test]
    fn unknown_sim_is_rejected_by_foreign_key() {
        let f = fixture();
        let err = f
            .used
            .add(&Context::background(), &UsedService::new(f.sim_id + 100, f.service_id))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
