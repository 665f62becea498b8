//! Mutable handle on a single entity
//!
//! Actions receive a [`ModelNode`] for the entity they run on. Through it they
//! read the realized projections and write further facts; every write goes
//! back through the graph so rules observe it.

use std::sync::Arc;

use super::entity::{Component, EntityId};
use super::error::Result;
use super::graph::{ModelGraph, ModelRegistration};
use super::state::ModelState;
use super::types::{ModelProjection, Projection, Projections};

/// Handle on one entity of a [`ModelGraph`]
pub struct ModelNode<'a> {
    graph: &'a mut ModelGraph,
    id: EntityId,
}

impl<'a> ModelNode<'a> {
    pub(crate) fn new(graph: &'a mut ModelGraph, id: EntityId) -> Self {
        Self { graph, id }
    }

    /// Entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Find a component on this entity
    pub fn find<C: Component>(&self) -> Option<&C> {
        self.graph.find::<C>(self.id)
    }

    /// Check for a component on this entity
    pub fn has<C: Component>(&self) -> bool {
        self.graph.has::<C>(self.id)
    }

    /// Write a component on this entity
    pub fn add_component<C: Component>(&mut self, component: C) -> Result<()> {
        self.graph.add_component(self.id, component)
    }

    /// Declare another projection on this entity
    pub fn add_projection(&mut self, projection: Projection) -> Result<()> {
        self.graph.add_projection(self.id, projection)
    }

    /// First realized projection instance of type `T`
    pub fn projection<T: ModelProjection>(&self) -> Option<Arc<T>> {
        self.find::<Projections>().and_then(Projections::get::<T>)
    }

    /// Current lifecycle state
    pub fn state(&self) -> Option<ModelState> {
        self.find::<ModelState>().copied()
    }

    /// Register something else in the graph, e.g. another action
    pub fn register(&mut self, registration: ModelRegistration) -> Result<EntityId> {
        self.graph.register(registration)
    }

    /// Shared access to the whole graph
    pub fn graph(&self) -> &ModelGraph {
        &*self.graph
    }

    /// Mutable access to the whole graph
    pub fn graph_mut(&mut self) -> &mut ModelGraph {
        &mut *self.graph
    }
}
