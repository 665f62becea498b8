//! Reactive rules over the entity graph
//!
//! A rule names the component types it reads. The graph runs it on an
//! entity whenever one of those components is written and all of them are
//! present, and once for every matching entity at the moment the rule is
//! configured.

use super::entity::{Component, ComponentType, Components, EntityId};
use super::error::Result;
use super::graph::ModelGraph;

type RuleBody = dyn Fn(&mut ModelGraph, EntityId) -> Result<()> + Send + Sync;

/// A reactive rule registered with [`ModelGraph::configure`]
pub struct Rule {
    name: &'static str,
    inputs: Vec<ComponentType>,
    body: Box<RuleBody>,
}

impl Rule {
    /// Start building a rule with a diagnostic name
    pub fn builder(name: &'static str) -> RuleBuilder {
        RuleBuilder {
            name,
            inputs: Vec::new(),
        }
    }

    /// Diagnostic name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Component types this rule reads
    pub fn inputs(&self) -> &[ComponentType] {
        &self.inputs
    }

    /// Whether every input is present on the entity
    pub(crate) fn accepts(&self, components: &Components) -> bool {
        self.inputs.iter().all(|input| components.contains(input))
    }

    pub(crate) fn execute(&self, graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
        tracing::trace!("Rule '{}' triggered for entity {}", self.name, entity);
        (self.body)(graph, entity)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field(
                "inputs",
                &self.inputs.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`Rule`]
pub struct RuleBuilder {
    name: &'static str,
    inputs: Vec<ComponentType>,
}

impl RuleBuilder {
    /// Add a component type the rule depends on
    pub fn input<C: Component>(mut self) -> Self {
        let input = ComponentType::of::<C>();
        if !self.inputs.contains(&input) {
            self.inputs.push(input);
        }
        self
    }

    /// Finish the rule with its body
    pub fn execute<F>(self, body: F) -> Rule
    where
        F: Fn(&mut ModelGraph, EntityId) -> Result<()> + Send + Sync + 'static,
    {
        Rule {
            name: self.name,
            inputs: self.inputs,
            body: Box::new(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::Configurable;

    #[test]
    fn test_builder_deduplicates_inputs() {
        let rule = Rule::builder("dedup")
            .input::<Configurable>()
            .input::<Configurable>()
            .execute(|_, _| Ok(()));

        assert_eq!(rule.inputs().len(), 1);
        assert_eq!(rule.name(), "dedup");
    }
}
