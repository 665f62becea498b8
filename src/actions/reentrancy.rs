//! Per-entity reconciliation scopes
//!
//! While an entity is being reconciled it owns a FIFO of registrations that
//! still have to run on it. Firings for that entity land in the queue instead
//! of running on top of the action that is currently executing.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::model::entity::EntityId;
use crate::model::error::{DispatchError, DispatchResult};

#[derive(Debug, Default)]
struct Scope {
    queue: VecDeque<EntityId>,
    // Last registration handed out by `pop`; never queued again.
    running: Option<EntityId>,
}

/// Open scopes, keyed by the entity being reconciled
#[derive(Debug, Default)]
pub struct ReentrancyScope {
    open: HashMap<EntityId, Scope>,
}

impl ReentrancyScope {
    /// Create an empty scope table
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope for `entity`, seeded with `initial`
    ///
    /// Fails when a scope for the entity is already open.
    pub fn open(
        &mut self,
        entity: EntityId,
        initial: impl IntoIterator<Item = EntityId>,
    ) -> DispatchResult<()> {
        if self.open.contains_key(&entity) {
            return Err(DispatchError::ReentrantReconciliation(entity));
        }

        let mut scope = Scope::default();
        for registration in initial {
            if !scope.queue.contains(&registration) {
                scope.queue.push_back(registration);
            }
        }
        self.open.insert(entity, scope);
        Ok(())
    }

    /// Queue a registration for an entity with an open scope
    ///
    /// Returns false when no scope is open, the registration is already
    /// queued, or it is the one currently running.
    pub fn defer(&mut self, entity: EntityId, registration: EntityId) -> bool {
        match self.open.get_mut(&entity) {
            Some(scope)
                if scope.running != Some(registration) && !scope.queue.contains(&registration) =>
            {
                scope.queue.push_back(registration);
                true
            }
            _ => false,
        }
    }

    /// Next queued registration for the entity; it becomes the running one
    pub fn pop(&mut self, entity: EntityId) -> Option<EntityId> {
        let scope = self.open.get_mut(&entity)?;
        let next = scope.queue.pop_front();
        scope.running = next;
        next
    }

    /// Close the entity's scope, dropping anything still queued
    pub fn close(&mut self, entity: EntityId) {
        self.open.remove(&entity);
    }

    /// Whether the entity is being reconciled
    pub fn is_open(&self, entity: EntityId) -> bool {
        self.open.contains_key(&entity)
    }

    /// Number of registrations waiting for the entity
    pub fn pending(&self, entity: EntityId) -> usize {
        self.open.get(&entity).map_or(0, |scope| scope.queue.len())
    }
}

/// An open scope that closes itself when dropped, including during unwinding
#[must_use]
pub struct ScopeGuard<'a> {
    scopes: &'a Mutex<ReentrancyScope>,
    entity: EntityId,
}

impl<'a> ScopeGuard<'a> {
    /// Open a scope for `entity` on the shared table
    pub fn open(
        scopes: &'a Mutex<ReentrancyScope>,
        entity: EntityId,
        initial: impl IntoIterator<Item = EntityId>,
    ) -> DispatchResult<Self> {
        scopes.lock().open(entity, initial)?;
        Ok(Self { scopes, entity })
    }

    /// Entity the scope belongs to
    pub fn entity(&self) -> EntityId {
        self.entity
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.scopes.lock().close(self.entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> EntityId {
        EntityId::new(n)
    }

    #[test]
    fn test_fifo_order() {
        let mut scopes = ReentrancyScope::new();
        scopes.open(id(1), [id(10), id(11)]).unwrap();
        assert!(scopes.defer(id(1), id(12)));

        assert_eq!(scopes.pop(id(1)), Some(id(10)));
        assert_eq!(scopes.pop(id(1)), Some(id(11)));
        assert_eq!(scopes.pop(id(1)), Some(id(12)));
        assert_eq!(scopes.pop(id(1)), None);
    }

    #[test]
    fn test_defer_deduplicates() {
        let mut scopes = ReentrancyScope::new();
        scopes.open(id(1), [id(10), id(10)]).unwrap();
        assert!(!scopes.defer(id(1), id(10)));
        assert_eq!(scopes.pending(id(1)), 1);
    }

    #[test]
    fn test_defer_without_scope() {
        let mut scopes = ReentrancyScope::new();
        assert!(!scopes.defer(id(1), id(10)));
        assert!(!scopes.is_open(id(1)));
    }

    #[test]
    fn test_open_twice_fails() {
        let mut scopes = ReentrancyScope::new();
        scopes.open(id(1), Vec::new()).unwrap();
        assert!(matches!(
            scopes.open(id(1), Vec::new()),
            Err(DispatchError::ReentrantReconciliation(_))
        ));

        scopes.close(id(1));
        assert!(scopes.open(id(1), Vec::new()).is_ok());
    }

    #[test]
    fn test_scopes_are_per_entity() {
        let mut scopes = ReentrancyScope::new();
        scopes.open(id(1), [id(10)]).unwrap();
        scopes.open(id(2), [id(20)]).unwrap();

        scopes.close(id(1));
        assert!(!scopes.is_open(id(1)));
        assert_eq!(scopes.pop(id(2)), Some(id(20)));
    }

    #[test]
    fn test_running_registration_is_not_requeued() {
        let mut scopes = ReentrancyScope::new();
        scopes.open(id(1), [id(10)]).unwrap();

        assert_eq!(scopes.pop(id(1)), Some(id(10)));
        assert!(!scopes.defer(id(1), id(10)));
        assert!(scopes.defer(id(1), id(11)));
        assert_eq!(scopes.pending(id(1)), 1);

        // Once something else runs, the earlier one may be queued again.
        assert_eq!(scopes.pop(id(1)), Some(id(11)));
        assert!(scopes.defer(id(1), id(10)));
    }

    #[test]
    fn test_guard_closes_on_drop() {
        let scopes = Mutex::new(ReentrancyScope::new());
        {
            let guard = ScopeGuard::open(&scopes, id(1), [id(10)]).unwrap();
            assert_eq!(guard.entity(), id(1));
            assert!(scopes.lock().is_open(id(1)));
            assert!(ScopeGuard::open(&scopes, id(1), Vec::new()).is_err());
        }
        assert!(!scopes.lock().is_open(id(1)));
    }

    #[test]
    fn test_guard_closes_on_unwind() {
        let scopes = Mutex::new(ReentrancyScope::new());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ScopeGuard::open(&scopes, id(1), Vec::new()).unwrap();
            panic!("action panicked");
        }));

        assert!(result.is_err());
        assert!(!scopes.lock().is_open(id(1)));
    }
}
