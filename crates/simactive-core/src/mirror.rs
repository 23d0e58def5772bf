//! In-memory mirror of one entity type.
//!
//! A [`Mirror`] is an id-ordered map behind a single mutex. It never talks to
//! the store and never blocks on I/O, so the lock is only held for the map
//! operation itself.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use simactive_shared::{Entity, EntityId, RepoError, RepoResult, UNSET_ID};

pub struct Mirror<E: Entity> {
    entries: Mutex<BTreeMap<EntityId, E>>,
}

impl<E: Entity> Default for Mirror<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Mirror<E> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, BTreeMap<EntityId, E>>> {
        self.entries
            .lock()
            .map_err(|_| RepoError::internal(E::KIND, "mirror lock poisoned"))
    }

    /// Insert a persisted entity. Rejects id 0 and existing keys.
    pub fn add(&self, entity: E) -> RepoResult<()> {
        let id = entity.id();
        if id == UNSET_ID {
            return Err(RepoError::internal(
                E::KIND,
                format!("{} has no persisted id", entity.describe()),
            ));
        }

        let mut entries = self.lock()?;
        if entries.contains_key(&id) {
            return Err(RepoError::conflict(E::KIND, format!("id {id}")));
        }
        entries.insert(id, entity);
        Ok(())
    }

    /// Evict an entry and hand it back.
    pub fn remove(&self, id: EntityId) -> RepoResult<E> {
        self.lock()?
            .remove(&id)
            .ok_or_else(|| RepoError::not_found(E::KIND, format!("id {id}")))
    }

    pub fn by_id(&self, id: EntityId) -> RepoResult<E> {
        self.lock()?
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::not_found(E::KIND, format!("id {id}")))
    }

    /// Replace an existing entry, returning the value it held before.
    pub fn update(&self, entity: E) -> RepoResult<E> {
        let mut entries = self.lock()?;
        match entries.get_mut(&entity.id()) {
            Some(slot) => Ok(std::mem::replace(slot, entity)),
            None => Err(RepoError::not_found(
                E::KIND,
                format!("id {}", entity.id()),
            )),
        }
    }

    /// Put `previous` back only if the entry still holds `expected`.
    /// Returns whether the swap happened.
    pub fn restore_if(&self, expected: &E, previous: E) -> RepoResult<bool> {
        let mut entries = self.lock()?;
        match entries.get_mut(&previous.id()) {
            Some(slot) if *slot == *expected => {
                *slot = previous;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Snapshot of every entry, ordered by id.
    pub fn list(&self) -> RepoResult<Vec<E>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// First entry (by id) matching `predicate`.
    pub fn find_by<P>(&self, predicate: P) -> RepoResult<Option<E>>
    where
        P: Fn(&E) -> bool,
    {
        Ok(self.lock()?.values().find(|e| predicate(e)).cloned())
    }

    /// Bulk insert of entities not mirrored yet. Existing entries already
    /// reflect every write made through the repository and are kept.
    /// Returns the number of entities inserted.
    pub fn load<I>(&self, entities: I) -> RepoResult<usize>
    where
        I: IntoIterator<Item = E>,
    {
        let mut entries = self.lock()?;
        let mut loaded = 0;
        for entity in entities {
            if entity.id() == UNSET_ID {
                tracing::warn!(entity = %E::KIND, item = %entity.describe(), "skipping unpersisted entity during load");
                continue;
            }
            if let Entry::Vacant(slot) = entries.entry(entity.id()) {
                slot.insert(entity);
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.lock()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use simactive_shared::{ErrorKind, Provider};

    use super::*;

    fn provider(id: EntityId, name: &str) -> Provider {
        Provider {
            id,
            name: name.into(),
        }
    }

    #[test]
    fn add_rejects_unset_id_and_duplicates() {
        let mirror = Mirror::new();

        let err = mirror.add(Provider::new("Vodafone")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        mirror.add(provider(1, "Vodafone")).unwrap();
        let err = mirror.add(provider(1, "Tele2")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(mirror.by_id(1).unwrap().name, "Vodafone");
    }

    #[test]
    fn update_and_remove_return_previous_values() {
        let mirror = Mirror::new();
        mirror.add(provider(3, "Beeline")).unwrap();

        let previous = mirror.update(provider(3, "Beeline KZ")).unwrap();
        assert_eq!(previous.name, "Beeline");

        let evicted = mirror.remove(3).unwrap();
        assert_eq!(evicted.name, "Beeline KZ");
        assert!(mirror.by_id(3).unwrap_err().is_not_found());
        assert!(mirror.remove(3).unwrap_err().is_not_found());
        assert!(mirror.update(provider(3, "MTS")).unwrap_err().is_not_found());
    }

    #[test]
    fn list_is_ordered_by_id() {
        let mirror = Mirror::new();
        mirror.add(provider(9, "MTS")).unwrap();
        mirror.add(provider(2, "Tele2")).unwrap();
        mirror.add(provider(5, "Beeline")).unwrap();

        let ids: Vec<_> = mirror.list().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, [2, 5, 9]);
    }

    #[test]
    fn find_by_and_load() {
        let mirror = Mirror::new();
        assert!(mirror.is_empty().unwrap());

        let loaded = mirror
            .load([provider(1, "Vodafone"), Provider::new("skipped"), provider(2, "Tele2")])
            .unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(mirror.len().unwrap(), 2);

        let found = mirror.find_by(|p| p.name == "Tele2").unwrap();
        assert_eq!(found.map(|p| p.id), Some(2));
        assert!(mirror.find_by(|p| p.name == "MTS").unwrap().is_none());
    }

    #[test]
    fn load_keeps_entries_already_mirrored() {
        let mirror = Mirror::new();
        mirror.add(provider(1, "Vodafone UK")).unwrap();

        let loaded = mirror
            .load([provider(1, "Vodafone"), provider(2, "Tele2")])
            .unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(mirror.by_id(1).unwrap().name, "Vodafone UK");
    }

    #[test]
    fn restore_if_only_swaps_the_expected_value() {
        let mirror = Mirror::new();
        mirror.add(provider(4, "written")).unwrap();

        assert!(!mirror
            .restore_if(&provider(4, "someone else"), provider(4, "original"))
            .unwrap());
        assert_eq!(mirror.by_id(4).unwrap().name, "written");

        assert!(mirror
            .restore_if(&provider(4, "written"), provider(4, "original"))
            .unwrap());
        assert_eq!(mirror.by_id(4).unwrap().name, "original");

        assert!(!mirror
            .restore_if(&provider(5, "x"), provider(5, "y"))
            .unwrap());
    }

    #[test]
    fn poisoned_lock_is_internal_for_size_queries() {
        let mirror: Mirror<Provider> = Mirror::new();
        std::thread::scope(|scope| {
            let holder = scope.spawn(|| {
                let _entries = mirror.entries.lock().unwrap();
                panic!("poison the mirror");
            });
            assert!(holder.join().is_err());
        });

        assert_eq!(mirror.len().unwrap_err().kind(), ErrorKind::Internal);
        assert_eq!(mirror.is_empty().unwrap_err().kind(), ErrorKind::Internal);
    }
}
