//! Entity lifecycle states
//!
//! States form a total order. The transition helpers only move an entity
//! forward and pull its parent along first, the same way every collaborator
//! expects: a child is never registered before its parent is, nor realized or
//! finalized before its parent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::entity::{Component, EntityId, ParentComponent};
use super::error::Result;
use super::graph::ModelGraph;

/// Lifecycle state of an entity, in lifecycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelState {
    /// Entity exists
    Created,
    /// Initial components are attached
    Initialized,
    /// Entity is known to the model
    Registered,
    /// Entity's projections are realized
    Realized,
    /// Entity may no longer be configured
    Finalized,
}

impl ModelState {
    /// Whether this state is `other` or later
    pub fn is_at_least(&self, other: ModelState) -> bool {
        *self >= other
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Component for ModelState {}

/// Move an entity to at least [`ModelState::Created`]
pub fn create(graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
    transition(graph, entity, ModelState::Created)
}

/// Move an entity to at least [`ModelState::Initialized`]
pub fn initialize(graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
    create(graph, entity)?;
    transition(graph, entity, ModelState::Initialized)
}

/// Move an entity to at least [`ModelState::Registered`], registering its parents first
pub fn register(graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
    initialize(graph, entity)?;
    for node in lineage(graph, entity).into_iter().rev() {
        initialize(graph, node)?;
        transition(graph, node, ModelState::Registered)?;
    }
    Ok(())
}

/// Move an entity to at least [`ModelState::Realized`], realizing its parents first
pub fn realize(graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
    register(graph, entity)?;
    advance_lineage(graph, entity, ModelState::Realized)
}

/// Move an entity to [`ModelState::Finalized`], finalizing its parents first
pub fn finalize(graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
    realize(graph, entity)?;
    advance_lineage(graph, entity, ModelState::Finalized)
}

/// Current state, if any was written
pub fn state_of(graph: &ModelGraph, entity: EntityId) -> Option<ModelState> {
    graph.find::<ModelState>(entity).copied()
}

/// The entity followed by its parents up to a root
///
/// Stops before the first entity seen twice, so a parent cycle terminates.
fn lineage(graph: &ModelGraph, entity: EntityId) -> Vec<EntityId> {
    let mut seen = BTreeSet::from([entity]);
    let mut chain = vec![entity];
    let mut current = entity;
    while let Some(parent) = graph.find::<ParentComponent>(current).map(ParentComponent::get) {
        if !seen.insert(parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

fn advance_lineage(graph: &mut ModelGraph, entity: EntityId, target: ModelState) -> Result<()> {
    for node in lineage(graph, entity).into_iter().rev() {
        transition(graph, node, target)?;
    }
    Ok(())
}

fn transition(graph: &mut ModelGraph, entity: EntityId, target: ModelState) -> Result<()> {
    // Parent transitions may already have moved this entity along.
    if state_of(graph, entity).is_some_and(|current| current.is_at_least(target)) {
        return Ok(());
    }
    tracing::debug!("Entity {} entering state {}", entity, target);
    graph.add_component(entity, target)
}
