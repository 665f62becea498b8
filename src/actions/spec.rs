//! Predicates over identities
//!
//! `ModelSpec` is a closed set of predicates. Conjunctions are kept flat and
//! ordered, so specs built through different `and` chains compare equal.

use std::collections::BTreeSet;
use std::fmt;

use super::identity::{Fact, Identity};
use crate::model::entity::EntityId;
use crate::model::names::{ElementName, FullyQualifiedName, RelativeName};
use crate::model::state::ModelState;
use crate::model::types::ModelType;

/// A predicate over an entity's [`Identity`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelSpec {
    /// Any declared projection type is a subtype of this type
    Subtype(ModelType),
    /// Element name equals
    Named(ElementName),
    /// Fully qualified name equals
    Qualified(FullyQualifiedName),
    /// One of the relative names equals
    RelativeName(RelativeName),
    /// Lifecycle state is at least
    StateAtLeast(ModelState),
    /// Direct parent equals
    OwnedBy(EntityId),
    /// Entity is a descendant of
    DescendantOf(EntityId),
    /// Entity is exactly
    SelfRef(EntityId),
    /// Every member is satisfied
    And(BTreeSet<ModelSpec>),
}

impl ModelSpec {
    /// Evaluate the predicate
    pub fn is_satisfied_by(&self, identity: &Identity) -> bool {
        match self {
            ModelSpec::Subtype(ty) => identity.capabilities().any(|it| it.is_subtype_of(ty)),
            ModelSpec::Named(name) => identity.name() == Some(name),
            ModelSpec::Qualified(name) => identity.qualified_name() == Some(name),
            ModelSpec::RelativeName(name) => identity.contains(&Fact::RelativeName(name.clone())),
            ModelSpec::StateAtLeast(state) => identity
                .state()
                .is_some_and(|current| current.is_at_least(*state)),
            ModelSpec::OwnedBy(parent) => identity.parent() == Some(*parent),
            ModelSpec::DescendantOf(ancestor) => identity.contains(&Fact::Ancestor(*ancestor)),
            ModelSpec::SelfRef(id) => identity.contains(&Fact::SelfRef(*id)),
            ModelSpec::And(specs) => specs.iter().all(|spec| spec.is_satisfied_by(identity)),
        }
    }

    /// Conjunction, flattened and deduplicated
    pub fn and(self, other: ModelSpec) -> ModelSpec {
        let mut members = BTreeSet::new();
        for spec in [self, other] {
            match spec {
                ModelSpec::And(inner) => members.extend(inner),
                spec => {
                    members.insert(spec);
                }
            }
        }

        if members.len() == 1 {
            if let Some(only) = members.pop_first() {
                return only;
            }
        }
        ModelSpec::And(members)
    }

    /// Members of a conjunction, or this predicate alone
    pub fn members(&self) -> Vec<&ModelSpec> {
        match self {
            ModelSpec::And(specs) => specs.iter().collect(),
            spec => vec![spec],
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::Subtype(ty) => write!(f, "subtypeOf({})", ty),
            ModelSpec::Named(name) => write!(f, "named({})", name),
            ModelSpec::Qualified(name) => write!(f, "qualified({})", name),
            ModelSpec::RelativeName(name) => write!(f, "relativeName({})", name),
            ModelSpec::StateAtLeast(state) => write!(f, "stateAtLeast({})", state),
            ModelSpec::OwnedBy(id) => write!(f, "ownedBy({})", id),
            ModelSpec::DescendantOf(id) => write!(f, "descendantOf({})", id),
            ModelSpec::SelfRef(id) => write!(f, "self({})", id),
            ModelSpec::And(specs) => {
                for (index, spec) in specs.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" and ")?;
                    }
                    write!(f, "{}", spec)?;
                }
                Ok(())
            }
        }
    }
}

/// Entities whose element name is `name`
pub fn named(name: impl Into<String>) -> ModelSpec {
    ModelSpec::Named(ElementName::new(name))
}

/// Entities whose fully qualified name is `name`
pub fn qualified(name: impl Into<String>) -> ModelSpec {
    ModelSpec::Qualified(FullyQualifiedName::new(name))
}

/// Entities declaring a projection that is a subtype of `ty`
pub fn subtype_of(ty: ModelType) -> ModelSpec {
    ModelSpec::Subtype(ty)
}

/// Entities at `state` or later
pub fn state_at_least(state: ModelState) -> ModelSpec {
    ModelSpec::StateAtLeast(state)
}

/// Direct children of `parent`
pub fn owned_by(parent: EntityId) -> ModelSpec {
    ModelSpec::OwnedBy(parent)
}

/// Transitive descendants of `ancestor`
pub fn descendant_of(ancestor: EntityId) -> ModelSpec {
    ModelSpec::DescendantOf(ancestor)
}

/// Exactly the entity `id`
pub fn self_ref(id: EntityId) -> ModelSpec {
    ModelSpec::SelfRef(id)
}

/// Entities named `name` relative to `owner`
pub fn relative_name(owner: EntityId, name: impl Into<String>) -> ModelSpec {
    ModelSpec::RelativeName(RelativeName::new(owner, name))
}
