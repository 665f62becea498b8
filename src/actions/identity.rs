//! Identity: the facts of an entity that specs match against
//!
//! An identity maps each fact kind to an ordered set of facts. It is a value:
//! every update returns a new identity and leaves the receiver untouched, so
//! the caller decides when to publish the result back onto the entity.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::entity::{Component, EntityId};
use crate::model::names::{ElementName, FullyQualifiedName, RelativeName};
use crate::model::state::ModelState;
use crate::model::types::ModelType;

/// Kind of a fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactKind {
    /// Element name (single-valued)
    Name,
    /// Fully qualified name (single-valued)
    QualifiedName,
    /// Lifecycle state (single-valued)
    State,
    /// Direct parent (single-valued)
    Parent,
    /// Every ancestor up to the root
    Ancestor,
    /// The entity itself (single-valued)
    SelfRef,
    /// Declared projection types
    Capability,
    /// Names relative to owners
    RelativeName,
}

/// A single fact about an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fact {
    /// Element name
    Name(ElementName),
    /// Fully qualified name
    QualifiedName(FullyQualifiedName),
    /// Lifecycle state
    State(ModelState),
    /// Direct parent
    Parent(EntityId),
    /// One ancestor
    Ancestor(EntityId),
    /// Self reference
    SelfRef(EntityId),
    /// One declared projection type
    Capability(ModelType),
    /// One relative name
    RelativeName(RelativeName),
}

impl Fact {
    /// Kind of this fact
    pub fn kind(&self) -> FactKind {
        match self {
            Fact::Name(_) => FactKind::Name,
            Fact::QualifiedName(_) => FactKind::QualifiedName,
            Fact::State(_) => FactKind::State,
            Fact::Parent(_) => FactKind::Parent,
            Fact::Ancestor(_) => FactKind::Ancestor,
            Fact::SelfRef(_) => FactKind::SelfRef,
            Fact::Capability(_) => FactKind::Capability,
            Fact::RelativeName(_) => FactKind::RelativeName,
        }
    }
}

/// Immutable snapshot of an entity's facts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    facts: BTreeMap<FactKind, BTreeSet<Fact>>,
}

impl Identity {
    /// The identity without any fact
    pub fn empty() -> Self {
        Self::default()
    }

    /// Identity holding a single fact
    pub fn of(fact: Fact) -> Self {
        Self::empty().plus(fact)
    }

    /// Identity holding every given fact, of any kinds
    pub fn of_all(facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut identity = Self::empty();
        for fact in facts {
            identity.insert(fact);
        }
        identity
    }

    /// Copy where the fact's kind holds only this fact
    pub fn with(&self, fact: Fact) -> Self {
        let kind = fact.kind();
        self.with_all(kind, [fact])
    }

    /// Copy where `kind` holds exactly the given facts
    ///
    /// Panics when a fact is not of `kind`.
    pub fn with_all(&self, kind: FactKind, facts: impl IntoIterator<Item = Fact>) -> Self {
        let values: BTreeSet<Fact> = facts
            .into_iter()
            .inspect(|fact| {
                assert_eq!(fact.kind(), kind, "fact {:?} is not of kind {:?}", fact, kind)
            })
            .collect();

        let mut result = self.clone();
        if values.is_empty() {
            result.facts.remove(&kind);
        } else {
            result.facts.insert(kind, values);
        }
        result
    }

    /// Copy with the fact added next to the existing facts of its kind
    pub fn plus(&self, fact: Fact) -> Self {
        let mut result = self.clone();
        result.insert(fact);
        result
    }

    /// The only fact of a single-valued kind
    ///
    /// Panics when the kind holds more than one fact; use [`Identity::get_all`]
    /// for multi-valued kinds.
    pub fn get(&self, kind: FactKind) -> Option<&Fact> {
        let values = self.facts.get(&kind)?;
        assert!(
            values.len() <= 1,
            "fact kind {:?} holds {} values",
            kind,
            values.len()
        );
        values.iter().next()
    }

    /// Every fact of a kind, in order
    pub fn get_all(&self, kind: FactKind) -> impl Iterator<Item = &Fact> {
        self.facts.get(&kind).into_iter().flatten()
    }

    /// Whether this exact fact is present
    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts
            .get(&fact.kind())
            .is_some_and(|values| values.contains(fact))
    }

    /// Whether the identity holds no fact
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Element name
    pub fn name(&self) -> Option<&ElementName> {
        match self.get(FactKind::Name) {
            Some(Fact::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Fully qualified name
    pub fn qualified_name(&self) -> Option<&FullyQualifiedName> {
        match self.get(FactKind::QualifiedName) {
            Some(Fact::QualifiedName(name)) => Some(name),
            _ => None,
        }
    }

    /// Lifecycle state
    pub fn state(&self) -> Option<ModelState> {
        match self.get(FactKind::State) {
            Some(Fact::State(state)) => Some(*state),
            _ => None,
        }
    }

    /// Direct parent
    pub fn parent(&self) -> Option<EntityId> {
        match self.get(FactKind::Parent) {
            Some(Fact::Parent(parent)) => Some(*parent),
            _ => None,
        }
    }

    /// Declared projection types
    pub fn capabilities(&self) -> impl Iterator<Item = &ModelType> {
        self.get_all(FactKind::Capability).filter_map(|fact| match fact {
            Fact::Capability(ty) => Some(ty),
            _ => None,
        })
    }

    /// Ancestors, in id order
    pub fn ancestors(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.get_all(FactKind::Ancestor).filter_map(|fact| match fact {
            Fact::Ancestor(id) => Some(*id),
            _ => None,
        })
    }

    fn insert(&mut self, fact: Fact) {
        self.facts.entry(fact.kind()).or_default().insert(fact);
    }
}

impl Component for Identity {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::ModelProjection;

    struct Base;
    impl ModelProjection for Base {}

    struct Other;
    impl ModelProjection for Other {}

    #[test]
    fn test_with_replaces_only_its_kind() {
        let identity = Identity::of(Fact::Name(ElementName::new("foo")))
            .with(Fact::State(ModelState::Registered));
        let updated = identity.with(Fact::State(ModelState::Realized));

        assert_eq!(updated.state(), Some(ModelState::Realized));
        assert_eq!(updated.name().map(ElementName::as_str), Some("foo"));
        assert_eq!(identity.state(), Some(ModelState::Registered));
    }

    #[test]
    fn test_plus_accumulates() {
        let identity = Identity::of(Fact::Capability(ModelType::of::<Base>()))
            .plus(Fact::Capability(ModelType::of::<Other>()))
            .plus(Fact::Capability(ModelType::of::<Base>()));

        assert_eq!(identity.capabilities().count(), 2);
        assert!(identity.contains(&Fact::Capability(ModelType::of::<Other>())));
    }

    #[test]
    fn test_with_all_replaces_set() {
        let identity = Identity::of_all([
            Fact::Ancestor(EntityId::new(1)),
            Fact::Ancestor(EntityId::new(2)),
        ]);
        let updated = identity.with_all(FactKind::Ancestor, [Fact::Ancestor(EntityId::new(3))]);

        assert_eq!(updated.ancestors().collect::<Vec<_>>(), vec![EntityId::new(3)]);

        let cleared = updated.with_all(FactKind::Ancestor, Vec::new());
        assert!(cleared.is_empty());
    }

    #[test]
    #[should_panic(expected = "holds 2 values")]
    fn test_get_on_multi_valued_kind_panics() {
        let identity = Identity::of(Fact::Ancestor(EntityId::new(1)))
            .plus(Fact::Ancestor(EntityId::new(2)));
        let _ = identity.get(FactKind::Ancestor);
    }

    #[test]
    fn test_empty_identity() {
        let identity = Identity::empty();
        assert!(identity.is_empty());
        assert_eq!(identity.get(FactKind::Name), None);
        assert_eq!(identity.get_all(FactKind::Capability).count(), 0);
    }
}
