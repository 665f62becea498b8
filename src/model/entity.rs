//! Entities and their typed components
//!
//! An entity is nothing more than an id; everything known about it lives in
//! components keyed by their Rust type. Components are facts written by
//! collaborators (names, states, parents, projections) or records the action
//! system attaches to the same entity (identity, executed actions).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Entity identifier, allocated by the graph in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an id from its raw value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Marker for values that can be attached to an entity
pub trait Component: Any + Send + Sync {}

/// Runtime key of a component type
#[derive(Debug, Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
}

impl ComponentType {
    /// Key for the component type `C`
    pub fn of<C: Component>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// Underlying type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Rust type name, for diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl std::hash::Hash for ComponentType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Type-erased component value
pub(crate) type ErasedComponent = Box<dyn Any + Send + Sync>;

/// Component storage of a single entity
#[derive(Default)]
pub struct Components {
    values: HashMap<TypeId, ErasedComponent>,
}

impl Components {
    /// Find a component by type
    pub fn find<C: Component>(&self) -> Option<&C> {
        self.values
            .get(&TypeId::of::<C>())
            .and_then(|value| value.downcast_ref::<C>())
    }

    /// Check whether a component of type `C` is present
    pub fn has<C: Component>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<C>())
    }

    /// Check presence by runtime key
    pub fn contains(&self, component: &ComponentType) -> bool {
        self.values.contains_key(&component.id)
    }

    /// Number of components attached
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the entity has no components at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Insert or replace a component
    pub(crate) fn insert(&mut self, component: ComponentType, value: ErasedComponent) {
        self.values.insert(component.id, value);
    }
}

/// Read-only view of an entity, used by graph queries
#[derive(Clone, Copy)]
pub struct EntityRef<'a> {
    id: EntityId,
    components: &'a Components,
}

impl<'a> EntityRef<'a> {
    pub(crate) fn new(id: EntityId, components: &'a Components) -> Self {
        Self { id, components }
    }

    /// Entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Find a component by type
    pub fn find<C: Component>(&self) -> Option<&'a C> {
        self.components.find::<C>()
    }

    /// Check whether a component of type `C` is present
    pub fn has<C: Component>(&self) -> bool {
        self.components.has::<C>()
    }
}

/// Tag marking an entity as a target for configuration actions
///
/// Only tagged entities get an identity and take part in dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configurable;

impl Component for Configurable {}

/// Direct parent of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentComponent(pub EntityId);

impl ParentComponent {
    /// Parent entity id
    pub fn get(&self) -> EntityId {
        self.0
    }
}

impl Component for ParentComponent {}
