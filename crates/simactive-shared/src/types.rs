//! Entity model shared by the store, the repositories and the RPC façade.
//!
//! Every record is a plain struct whose `id` is `0` until the persistent
//! store assigns one. The [`Entity`] trait is the seam the generic
//! write-through repository is built on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned primary key. `0` means "not yet persisted".
pub type EntityId = i64;

/// The id every entity carries before the store assigns one.
pub const UNSET_ID: EntityId = 0;

/// Tag naming an entity type in errors and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Provider,
    Service,
    Sim,
    UsedService,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Service => "service",
            Self::Sim => "sim card",
            Self::UsedService => "used service",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record kept in both the in-memory mirror and the persistent store.
pub trait Entity: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    fn set_id(&mut self, id: EntityId);

    /// The identifying input fields, e.g. `number 19998887766`.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// A mobile network operator. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provider {
    pub id: EntityId,
    pub name: String,
}

impl Provider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNSET_ID,
            name: name.into(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSET_ID
    }
}

impl Entity for Provider {
    const KIND: EntityKind = EntityKind::Provider;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn describe(&self) -> String {
        format!("name {}", self.name)
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// A catalog entry a SIM can be used for. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: EntityId,
    pub name: String,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNSET_ID,
            name: name.into(),
        }
    }
}

impl Entity for Service {
    const KIND: EntityKind = EntityKind::Service;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn describe(&self) -> String {
        format!("name {}", self.name)
    }
}

// ---------------------------------------------------------------------------
// Sim
// ---------------------------------------------------------------------------

/// A SIM card. The embedded provider must carry a persisted id before the
/// SIM itself is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sim {
    pub id: EntityId,
    /// Phone number, 8 to 15 digits. Unique.
    pub number: String,
    pub provider: Provider,
    pub is_activated: bool,
    pub is_blocked: bool,
    /// Unix epoch seconds.
    pub activate_until: i64,
}

impl Sim {
    pub fn new(number: impl Into<String>, provider: Provider) -> Self {
        Self {
            id: UNSET_ID,
            number: number.into(),
            provider,
            is_activated: false,
            is_blocked: false,
            activate_until: 0,
        }
    }
}

impl Entity for Sim {
    const KIND: EntityKind = EntityKind::Sim;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn describe(&self) -> String {
        format!("number {}", self.number)
    }
}

// ---------------------------------------------------------------------------
// UsedService
// ---------------------------------------------------------------------------

/// Records that a SIM has been used for a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsedService {
    pub id: EntityId,
    pub sim_id: EntityId,
    pub service_id: EntityId,
    pub is_blocked: bool,
    pub blocked_info: String,
}

impl UsedService {
    pub fn new(sim_id: EntityId, service_id: EntityId) -> Self {
        Self {
            id: UNSET_ID,
            sim_id,
            service_id,
            is_blocked: false,
            blocked_info: String::new(),
        }
    }
}

impl Entity for UsedService {
    const KIND: EntityKind = EntityKind::UsedService;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn describe(&self) -> String {
        format!("sim id {}, service id {}", self.sim_id, self.service_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entities_are_unpersisted() {
        let sim = Sim::new("19998887766", Provider::new("Vodafone"));
        assert_eq!(sim.id(), UNSET_ID);
        assert!(!sim.provider.is_persisted());
        assert!(!sim.is_activated);
        assert!(!sim.is_blocked);
    }

    #[test]
    fn describe_names_the_unique_field() {
        assert_eq!(Provider::new("Tele2").describe(), "name Tele2");
        assert_eq!(
            Sim::new("19998887766", Provider::new("Tele2")).describe(),
            "number 19998887766"
        );
        assert_eq!(UsedService::new(3, 4).describe(), "sim id 3, service id 4");
    }

    #[test]
    fn sim_serializes_with_nested_provider() {
        let mut sim = Sim::new("19998887766", Provider::new("Vodafone"));
        sim.set_id(7);
        sim.provider.set_id(2);

        let json = serde_json::to_value(&sim).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["provider"]["name"], "Vodafone");
        assert_eq!(json["provider"]["id"], 2);
    }
}
