//! Action bodies and the components that make an entity an action registration

use std::fmt;
use std::sync::Arc;

use super::spec::ModelSpec;
use crate::model::entity::Component;
use crate::model::node::ModelNode;

/// Body of a registered action
pub trait ModelAction: Send + Sync {
    /// Run against the matched entity
    fn execute(&self, node: &mut ModelNode<'_>) -> anyhow::Result<()>;
}

impl<F> ModelAction for F
where
    F: Fn(&mut ModelNode<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self, node: &mut ModelNode<'_>) -> anyhow::Result<()> {
        self(node)
    }
}

/// The spec an action registration fires on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpecComponent(pub ModelSpec);

impl ModelSpecComponent {
    /// The spec
    pub fn get(&self) -> &ModelSpec {
        &self.0
    }
}

impl Component for ModelSpecComponent {}

/// The body of an action registration
#[derive(Clone)]
pub struct ModelActionComponent(pub Arc<dyn ModelAction>);

impl ModelActionComponent {
    /// Wrap an action body
    pub fn new(action: impl ModelAction + 'static) -> Self {
        Self(Arc::new(action))
    }

    /// Shared handle on the body
    pub fn get(&self) -> Arc<dyn ModelAction> {
        Arc::clone(&self.0)
    }
}

impl fmt::Debug for ModelActionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModelActionComponent(..)")
    }
}

impl Component for ModelActionComponent {}

/// Marks an entity as an action registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelActionTag;

impl Component for ModelActionTag {}
