//! v001 -- Initial schema creation.
//!
//! Creates the four tables: `providers`, `services`, `sims` and
//! `used_services`. Referenced rows cannot be deleted while referenced
//! (no cascades), so a delete never removes rows the mirrors still hold.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Providers
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS providers (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- ----------------------------------------------------------------
-- Services
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS services (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) <= 64)
);

-- ----------------------------------------------------------------
-- SIM cards
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sims (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    number         TEXT NOT NULL UNIQUE,
    provider_id    INTEGER NOT NULL,
    is_activated   INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    is_blocked     INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    activate_until INTEGER NOT NULL DEFAULT 0,   -- unix epoch seconds

    FOREIGN KEY (provider_id) REFERENCES providers(id)
);

CREATE INDEX IF NOT EXISTS idx_sims_provider_id ON sims(provider_id);

-- ----------------------------------------------------------------
-- Used services (SIM x service usage links)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS used_services (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    sim_id       INTEGER NOT NULL,
    service_id   INTEGER NOT NULL,
    is_blocked   INTEGER NOT NULL DEFAULT 0,     -- boolean 0/1
    blocked_info TEXT NOT NULL DEFAULT '',

    FOREIGN KEY (sim_id) REFERENCES sims(id),
    FOREIGN KEY (service_id) REFERENCES services(id),
    UNIQUE (sim_id, service_id)
);

CREATE INDEX IF NOT EXISTS idx_used_services_service_id ON used_services(service_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
