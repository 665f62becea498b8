//! In-process entity graph with reactive rules
//!
//! The graph owns every entity and its components. Writing a component runs,
//! synchronously and in configuration order, every rule that reads that
//! component type and whose other inputs are present on the entity.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::entity::{Component, ComponentType, Components, EntityId, EntityRef, ErasedComponent};
use super::error::{ModelError, Result};
use super::node::ModelNode;
use super::rule::Rule;
use super::types::{Projection, Projections};

/// A set of components to attach to a freshly created entity
pub struct ModelRegistration {
    components: Vec<(ComponentType, ErasedComponent)>,
}

impl ModelRegistration {
    /// Start building a registration
    pub fn builder() -> ModelRegistrationBuilder {
        ModelRegistrationBuilder {
            components: Vec::new(),
        }
    }

    /// Component types carried by this registration, in insertion order
    pub fn component_types(&self) -> impl Iterator<Item = &ComponentType> {
        self.components.iter().map(|(ty, _)| ty)
    }
}

impl std::fmt::Debug for ModelRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.components.iter().map(|(ty, _)| ty.name()))
            .finish()
    }
}

/// Builder for [`ModelRegistration`]
pub struct ModelRegistrationBuilder {
    components: Vec<(ComponentType, ErasedComponent)>,
}

impl ModelRegistrationBuilder {
    /// Attach a component; written in the order given
    pub fn with_component<C: Component>(mut self, component: C) -> Self {
        self.components
            .push((ComponentType::of::<C>(), Box::new(component)));
        self
    }

    /// Finish the registration
    pub fn build(self) -> ModelRegistration {
        ModelRegistration {
            components: self.components,
        }
    }
}

/// Entity/component store with a reactive rule facility
#[derive(Default)]
pub struct ModelGraph {
    next_id: u64,
    entities: BTreeMap<EntityId, Components>,
    rules: Vec<Arc<Rule>>,
    rules_by_input: HashMap<TypeId, Vec<Arc<Rule>>>,
}

impl ModelGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new entity without components
    pub fn create_entity(&mut self) -> EntityId {
        self.next_id += 1;
        let id = EntityId::new(self.next_id);
        self.entities.insert(id, Components::default());
        id
    }

    /// Create an entity and write every component of the registration
    pub fn register(&mut self, registration: ModelRegistration) -> Result<EntityId> {
        let id = self.create_entity();
        for (component, value) in registration.components {
            self.insert(id, component, value)?;
        }
        Ok(id)
    }

    /// Write a component onto an entity, replacing any previous value
    ///
    /// Rules reading this component type run before this returns; their
    /// errors are propagated.
    pub fn add_component<C: Component>(&mut self, entity: EntityId, component: C) -> Result<()> {
        self.insert(entity, ComponentType::of::<C>(), Box::new(component))
    }

    /// Declare an additional projection on an entity
    pub fn add_projection(&mut self, entity: EntityId, projection: Projection) -> Result<()> {
        let projections = self
            .find::<Projections>(entity)
            .cloned()
            .unwrap_or_default()
            .with(projection);
        self.add_component(entity, projections)
    }

    /// Find a component by type
    pub fn find<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.entities.get(&entity).and_then(|c| c.find::<C>())
    }

    /// Check whether an entity carries a component of type `C`
    pub fn has<C: Component>(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|c| c.has::<C>())
    }

    /// Whether the entity exists
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Read-only view of an entity
    pub fn entity(&self, entity: EntityId) -> Option<EntityRef<'_>> {
        self.entities
            .get(&entity)
            .map(|components| EntityRef::new(entity, components))
    }

    /// Mutable handle on an entity
    pub fn node(&mut self, entity: EntityId) -> Result<ModelNode<'_>> {
        if !self.contains(entity) {
            return Err(ModelError::EntityNotFound(entity));
        }
        Ok(ModelNode::new(self, entity))
    }

    /// All entity ids in creation order
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the graph has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Snapshot of the entities satisfying the predicate, in creation order
    pub fn query<P>(&self, predicate: P) -> Vec<EntityId>
    where
        P: Fn(EntityRef<'_>) -> bool,
    {
        self.entities
            .iter()
            .map(|(id, components)| EntityRef::new(*id, components))
            .filter(|entity| predicate(*entity))
            .map(|entity| entity.id())
            .collect()
    }

    /// Register a reactive rule
    ///
    /// The rule immediately runs against every existing entity carrying all
    /// of its inputs, then on every later write of one of its inputs.
    pub fn configure(&mut self, rule: Rule) -> Result<()> {
        let rule = Arc::new(rule);
        for input in rule.inputs() {
            self.rules_by_input
                .entry(input.id())
                .or_default()
                .push(Arc::clone(&rule));
        }
        self.rules.push(Arc::clone(&rule));
        tracing::debug!("Configured rule '{}'", rule.name());

        let existing: Vec<EntityId> = self.entities.keys().copied().collect();
        for entity in existing {
            if self.accepts(&rule, entity) {
                rule.execute(self, entity)?;
            }
        }
        Ok(())
    }

    /// Rules configured so far
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    fn insert(&mut self, entity: EntityId, component: ComponentType, value: ErasedComponent) -> Result<()> {
        let components = self
            .entities
            .get_mut(&entity)
            .ok_or(ModelError::EntityNotFound(entity))?;
        components.insert(component, value);
        tracing::trace!("Component {} written on entity {}", component.name(), entity);
        self.notify(entity, component)
    }

    fn notify(&mut self, entity: EntityId, component: ComponentType) -> Result<()> {
        // Rules may configure further rules; iterate over a snapshot.
        let Some(rules) = self.rules_by_input.get(&component.id()).cloned() else {
            return Ok(());
        };

        for rule in rules {
            if self.accepts(&rule, entity) {
                rule.execute(self, entity)?;
            }
        }
        Ok(())
    }

    fn accepts(&self, rule: &Rule, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|components| rule.accepts(components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{Configurable, ParentComponent};
    use parking_lot::Mutex;

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut graph = ModelGraph::new();
        let first = graph.create_entity();
        let second = graph
            .register(ModelRegistration::builder().with_component(Configurable).build())
            .unwrap();

        assert!(first < second);
        assert!(graph.has::<Configurable>(second));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_rule_runs_when_all_inputs_present() {
        let mut graph = ModelGraph::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        graph
            .configure(
                Rule::builder("parent-seen")
                    .input::<Configurable>()
                    .input::<ParentComponent>()
                    .execute(move |graph, entity| {
                        let parent = graph.find::<ParentComponent>(entity).unwrap().get();
                        sink.lock().push((entity, parent));
                        Ok(())
                    }),
            )
            .unwrap();

        let root = graph.create_entity();
        let child = graph.create_entity();
        graph.add_component(child, ParentComponent(root)).unwrap();
        assert!(seen.lock().is_empty());

        graph.add_component(child, Configurable).unwrap();
        assert_eq!(seen.lock().as_slice(), &[(child, root)]);
    }

    #[test]
    fn test_late_rule_sees_existing_entities() {
        let mut graph = ModelGraph::new();
        let a = graph.create_entity();
        let b = graph.create_entity();
        graph.add_component(a, Configurable).unwrap();
        graph.add_component(b, Configurable).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        graph
            .configure(Rule::builder("late").input::<Configurable>().execute(
                move |_, entity| {
                    sink.lock().push(entity);
                    Ok(())
                },
            ))
            .unwrap();

        assert_eq!(seen.lock().as_slice(), &[a, b]);
    }

    #[test]
    fn test_rule_error_propagates_to_writer() {
        let mut graph = ModelGraph::new();
        graph
            .configure(
                Rule::builder("failing")
                    .input::<Configurable>()
                    .execute(|_, _| Err(ModelError::Config("nope".into()))),
            )
            .unwrap();

        let entity = graph.create_entity();
        let result = graph.add_component(entity, Configurable);
        assert!(matches!(result, Err(ModelError::Config(_))));
    }

    #[test]
    fn test_query_in_creation_order() {
        let mut graph = ModelGraph::new();
        let a = graph.create_entity();
        let _ = graph.create_entity();
        let c = graph.create_entity();
        graph.add_component(c, Configurable).unwrap();
        graph.add_component(a, Configurable).unwrap();

        assert_eq!(graph.query(|e| e.has::<Configurable>()), vec![a, c]);
    }

    #[test]
    fn test_missing_entity() {
        let mut graph = ModelGraph::new();
        let result = graph.add_component(EntityId::new(99), Configurable);
        assert!(matches!(result, Err(ModelError::EntityNotFound(_))));
        assert!(graph.node(EntityId::new(99)).is_err());
    }
}
