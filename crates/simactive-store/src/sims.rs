//! CRUD operations for [`Sim`] records.
//!
//! Rows are always read joined with `providers` so every returned [`Sim`]
//! embeds its provider's persisted id and name.

use std::sync::Arc;

use rusqlite::params;
use simactive_shared::{Context, Entity, EntityId, Provider, RepoError, RepoResult, Sim};

use crate::adapter::{expect_affected, PersistentStore};
use crate::database::Database;
use crate::error::{no_rows_as_not_found, Result};

const SELECT_SIM: &str = "SELECT s.id, s.number, s.provider_id, p.name,
            s.is_activated, s.is_blocked, s.activate_until
     FROM sims s
     JOIN providers p ON p.id = s.provider_id";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new SIM.  The embedded provider must already be persisted.
    pub fn insert_sim(&self, ctx: &Context, sim: &Sim) -> Result<EntityId> {
        self.run(ctx, |conn| {
            conn.execute(
                "INSERT INTO sims (number, provider_id, is_activated, is_blocked, activate_until)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    sim.number,
                    sim.provider.id,
                    sim.is_activated as i32,
                    sim.is_blocked as i32,
                    sim.activate_until,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_sim(&self, ctx: &Context, id: EntityId) -> Result<Sim> {
        self.run(ctx, |conn| {
            conn.query_row(
                &format!("{SELECT_SIM} WHERE s.id = ?1"),
                params![id],
                row_to_sim,
            )
        })
        .map_err(no_rows_as_not_found)
    }

    /// List all SIMs, ordered by id.
    pub fn list_sims(&self, ctx: &Context) -> Result<Vec<Sim>> {
        self.run(ctx, |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_SIM} ORDER BY s.id ASC"))?;
            let rows = stmt.query_map([], row_to_sim)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    // ------------------------------------------------------------------
    // Update / Delete
    // ------------------------------------------------------------------

    /// Rewrite every column of a SIM.  Returns `true` if a row was updated.
    pub fn update_sim(&self, ctx: &Context, sim: &Sim) -> Result<bool> {
        let affected = self.run(ctx, |conn| {
            conn.execute(
                "UPDATE sims
                 SET number = ?1, provider_id = ?2, is_activated = ?3,
                     is_blocked = ?4, activate_until = ?5
                 WHERE id = ?6",
                params![
                    sim.number,
                    sim.provider.id,
                    sim.is_activated as i32,
                    sim.is_blocked as i32,
                    sim.activate_until,
                    sim.id,
                ],
            )
        })?;
        Ok(affected > 0)
    }

    // fails while any used_services row still references the sim
    pub fn delete_sim(&self, ctx: &Context, id: EntityId) -> Result<bool> {
        let affected = self.run(ctx, |conn| {
            conn.execute("DELETE FROM sims WHERE id = ?1", params![id])
        })?;
        Ok(affected > 0)
    }
}

/// Map a joined `sims`/`providers` row to a [`Sim`].
fn row_to_sim(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sim> {
    let is_activated: i32 = row.get(4)?;
    let is_blocked: i32 = row.get(5)?;

    Ok(Sim {
        id: row.get(0)?,
        number: row.get(1)?,
        provider: Provider {
            id: row.get(2)?,
            name: row.get(3)?,
        },
        is_activated: is_activated != 0,
        is_blocked: is_blocked != 0,
        activate_until: row.get(6)?,
    })
}

/// [`PersistentStore`] adapter over the `sims` table.
#[derive(Clone)]
pub struct SimStore {
    db: Arc<Database>,
}

impl SimStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn unresolved_provider(sim: &Sim) -> RepoError {
        RepoError::internal(
            Sim::KIND,
            format!(
                "{}: provider {} has no persisted id",
                sim.describe(),
                sim.provider.name
            ),
        )
    }
}

impl PersistentStore<Sim> for SimStore {
    fn add(&self, ctx: &Context, sim: &Sim) -> RepoResult<EntityId> {
        if !sim.provider.is_persisted() {
            return Err(Self::unresolved_provider(sim));
        }

        let id = self
            .db
            .insert_sim(ctx, sim)
            .map_err(|e| e.into_repo(Sim::KIND, sim.describe()))?;
        tracing::debug!(
            id,
            number = %sim.number,
            provider_id = sim.provider.id,
            "sim row inserted"
        );
        Ok(id)
    }

    fn remove(&self, ctx: &Context, id: EntityId) -> RepoResult<()> {
        expect_affected::<Sim>(id, self.db.delete_sim(ctx, id))
    }

    fn list(&self, ctx: &Context) -> RepoResult<Vec<Sim>> {
        self.db
            .list_sims(ctx)
            .map_err(|e| e.into_repo(Sim::KIND, "list"))
    }

    fn by_id(&self, ctx: &Context, id: EntityId) -> RepoResult<Sim> {
        self.db
            .get_sim(ctx, id)
            .map_err(|e| e.into_repo(Sim::KIND, format!("id {id}")))
    }

    fn update(&self, ctx: &Context, sim: &Sim) -> RepoResult<()> {
        if !sim.provider.is_persisted() {
            return Err(Self::unresolved_provider(sim));
        }

        match self.db.update_sim(ctx, sim) {
            Err(e) if e.is_unique_violation() => Err(e.into_repo(Sim::KIND, sim.describe())),
            other => expect_affected::<Sim>(sim.id, other),
        }
    }
}
