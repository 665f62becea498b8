//! Per-entity record of executed action registrations

use std::collections::BTreeSet;

use crate::model::entity::{Component, EntityId};
use crate::model::error::Result;
use crate::model::graph::ModelGraph;

/// Registrations that already ran on the entity carrying this component
///
/// Only grows; an action never runs twice on the same entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutedActions(BTreeSet<EntityId>);

impl ExecutedActions {
    /// Whether the registration already ran
    pub fn contains(&self, registration: EntityId) -> bool {
        self.0.contains(&registration)
    }

    /// Copy with one more registration
    pub fn with(&self, registration: EntityId) -> Self {
        let mut executed = self.0.clone();
        executed.insert(registration);
        Self(executed)
    }

    /// Executed registrations in id order
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.0.iter().copied()
    }

    /// Number of executed registrations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing ran yet
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Component for ExecutedActions {}

/// Registrations already executed on `entity`
pub fn executed_actions(graph: &ModelGraph, entity: EntityId) -> ExecutedActions {
    graph
        .find::<ExecutedActions>(entity)
        .cloned()
        .unwrap_or_default()
}

/// Whether `registration` already ran on `entity`
pub fn has_executed(graph: &ModelGraph, entity: EntityId, registration: EntityId) -> bool {
    graph
        .find::<ExecutedActions>(entity)
        .is_some_and(|executed| executed.contains(registration))
}

pub(crate) fn record_executed(
    graph: &mut ModelGraph,
    entity: EntityId,
    registration: EntityId,
) -> Result<()> {
    let executed = executed_actions(graph, entity).with(registration);
    graph.add_component(entity, executed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_idempotent() {
        let mut graph = ModelGraph::new();
        let entity = graph.create_entity();
        let action = EntityId::new(10);

        assert!(!has_executed(&graph, entity, action));
        record_executed(&mut graph, entity, action).unwrap();
        record_executed(&mut graph, entity, action).unwrap();

        assert!(has_executed(&graph, entity, action));
        assert_eq!(executed_actions(&graph, entity).len(), 1);
    }

    #[test]
    fn test_unknown_entity_has_empty_ledger() {
        let graph = ModelGraph::new();
        assert!(executed_actions(&graph, EntityId::new(1)).is_empty());
    }
}
