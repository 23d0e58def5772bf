//! Per-id serialization of mirror-first writes.
//!
//! `update` and `remove` change the mirror before the store call and may
//! have to undo that change afterwards. Two such writes on the same id must
//! not interleave, or one of them could roll the mirror back over the
//! other's committed value. The gate is held across the store call; the
//! mirror lock is not.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

use simactive_shared::{EntityId, EntityKind, RepoError, RepoResult};

#[derive(Default)]
pub(crate) struct WriteGate {
    busy: Mutex<HashSet<EntityId>>,
    released: Condvar,
}

impl WriteGate {
    /// Block until no other write holds `id`, then hold it until the guard
    /// is dropped.
    pub(crate) fn enter(&self, kind: EntityKind, id: EntityId) -> RepoResult<GateGuard<'_>> {
        let poisoned = |_| RepoError::internal(kind, "write gate poisoned");

        let mut busy = self.busy.lock().map_err(poisoned)?;
        while busy.contains(&id) {
            busy = self.released.wait(busy).map_err(poisoned)?;
        }
        busy.insert(id);

        Ok(GateGuard { gate: self, id })
    }
}

pub(crate) struct GateGuard<'a> {
    gate: &'a WriteGate,
    id: EntityId,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        // a poisoned set is still released so waiters do not hang
        let mut busy = self
            .gate
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        busy.remove(&self.id);
        drop(busy);
        self.gate.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn same_id_waits_other_ids_do_not() {
        let gate = WriteGate::default();
        let held = gate.enter(EntityKind::Sim, 1).unwrap();

        std::thread::scope(|scope| {
            let gate = &gate;
            let (done_tx, done_rx) = mpsc::channel();
            scope.spawn(|| {
                let _other = gate.enter(EntityKind::Sim, 2).unwrap();
            });
            scope.spawn(move || {
                let _same = gate.enter(EntityKind::Sim, 1).unwrap();
                done_tx.send(()).unwrap();
            });

            assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
            drop(held);
            done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        });
    }
}
