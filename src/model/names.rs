//! Name facts written by naming collaborators

use std::fmt;

use super::entity::{Component, EntityId};

/// Short name of an element within its owner
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementName(String);

impl ElementName {
    /// Create an element name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Component for ElementName {}

/// Name of an element unique across the whole model, e.g. `testDebugLink`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullyQualifiedName(String);

impl FullyQualifiedName {
    /// Create a fully qualified name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Component for FullyQualifiedName {}

/// Name of an element as seen from one of its owners
///
/// An element may have one relative name per ancestor; each is published
/// separately and accumulates in the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativeName {
    owner: EntityId,
    name: String,
}

impl RelativeName {
    /// Relative name of an element within `owner`
    pub fn new(owner: EntityId, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }

    /// Owner the name is relative to
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// The name itself
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RelativeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.owner)
    }
}

impl Component for RelativeName {}
