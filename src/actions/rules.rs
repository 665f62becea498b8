//! Identity update rules
//!
//! One rule per fact kind. Each reads the entity's current identity, replaces
//! or extends the values of its kind and writes the identity back; that write
//! is what the dispatcher reacts to. Only [`Configurable`] entities get an
//! identity.

use std::collections::BTreeSet;

use super::identity::{Fact, FactKind, Identity};
use crate::model::entity::{Configurable, EntityId, ParentComponent};
use crate::model::error::Result;
use crate::model::graph::ModelGraph;
use crate::model::names::{ElementName, FullyQualifiedName, RelativeName};
use crate::model::rule::Rule;
use crate::model::state::ModelState;
use crate::model::types::Projections;

/// Configure every identity update rule on the graph
pub fn install(graph: &mut ModelGraph) -> Result<()> {
    graph.configure(
        Rule::builder("identity-self")
            .input::<Configurable>()
            .execute(|graph, entity| publish(graph, entity, |identity| {
                identity.with(Fact::SelfRef(entity))
            })),
    )?;

    graph.configure(
        Rule::builder("identity-name")
            .input::<Configurable>()
            .input::<ElementName>()
            .execute(|graph, entity| {
                let Some(name) = graph.find::<ElementName>(entity).cloned() else {
                    return Ok(());
                };
                publish(graph, entity, |identity| identity.with(Fact::Name(name)))
            }),
    )?;

    graph.configure(
        Rule::builder("identity-qualified-name")
            .input::<Configurable>()
            .input::<FullyQualifiedName>()
            .execute(|graph, entity| {
                let Some(name) = graph.find::<FullyQualifiedName>(entity).cloned() else {
                    return Ok(());
                };
                publish(graph, entity, |identity| {
                    identity.with(Fact::QualifiedName(name))
                })
            }),
    )?;

    graph.configure(
        Rule::builder("identity-relative-name")
            .input::<Configurable>()
            .input::<RelativeName>()
            .execute(|graph, entity| {
                let Some(name) = graph.find::<RelativeName>(entity).cloned() else {
                    return Ok(());
                };
                publish(graph, entity, |identity| {
                    identity.plus(Fact::RelativeName(name))
                })
            }),
    )?;

    graph.configure(
        Rule::builder("identity-state")
            .input::<Configurable>()
            .input::<ModelState>()
            .execute(|graph, entity| {
                let Some(state) = graph.find::<ModelState>(entity).copied() else {
                    return Ok(());
                };
                publish(graph, entity, |identity| identity.with(Fact::State(state)))
            }),
    )?;

    graph.configure(
        Rule::builder("identity-parent")
            .input::<Configurable>()
            .input::<ParentComponent>()
            .execute(|graph, entity| {
                let Some(parent) = graph.find::<ParentComponent>(entity).map(ParentComponent::get)
                else {
                    return Ok(());
                };
                let ancestors = ancestors_of(graph, entity)
                    .into_iter()
                    .map(Fact::Ancestor)
                    .collect::<Vec<_>>();
                publish(graph, entity, |identity| {
                    identity
                        .with(Fact::Parent(parent))
                        .with_all(FactKind::Ancestor, ancestors)
                })
            }),
    )?;

    graph.configure(
        Rule::builder("identity-capabilities")
            .input::<Configurable>()
            .input::<Projections>()
            .execute(|graph, entity| {
                let Some(types) = graph
                    .find::<Projections>(entity)
                    .map(|p| p.types().cloned().map(Fact::Capability).collect::<Vec<_>>())
                else {
                    return Ok(());
                };
                publish(graph, entity, |identity| {
                    identity.with_all(FactKind::Capability, types)
                })
            }),
    )?;

    Ok(())
}

/// Every ancestor of `entity`, following parents up to a root
///
/// Stops at the first entity seen twice, so a parent cycle terminates.
pub fn ancestors_of(graph: &ModelGraph, entity: EntityId) -> BTreeSet<EntityId> {
    let mut ancestors = BTreeSet::new();
    let mut current = entity;
    while let Some(parent) = graph.find::<ParentComponent>(current).map(ParentComponent::get) {
        if parent == entity || !ancestors.insert(parent) {
            break;
        }
        current = parent;
    }
    ancestors
}

fn publish<F>(graph: &mut ModelGraph, entity: EntityId, update: F) -> Result<()>
where
    F: FnOnce(&Identity) -> Identity,
{
    let current = graph.find::<Identity>(entity);
    let next = update(current.unwrap_or(&Identity::empty()));
    if current == Some(&next) {
        return Ok(());
    }
    tracing::trace!("Identity of entity {} updated", entity);
    graph.add_component(entity, next)
}
