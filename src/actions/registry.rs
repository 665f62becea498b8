//! Action registrations
//!
//! These functions are the way other subsystems say "run this once an entity
//! looks like that". Each builds a [`ModelRegistration`] carrying the [`ModelSpec`],
//! the action body and the [`ModelActionTag`]; registering it with the graph
//! creates the registry entity the dispatcher discovers.

use std::sync::Arc;

use super::action::{ModelAction, ModelActionComponent, ModelActionTag, ModelSpecComponent};
use super::identity::Identity;
use super::spec::{qualified, self_ref, state_at_least, subtype_of, ModelSpec};
use crate::model::entity::EntityId;
use crate::model::error::Result;
use crate::model::graph::{ModelGraph, ModelRegistration};
use crate::model::names::ElementName;
use crate::model::node::ModelNode;
use crate::model::state::ModelState;
use crate::model::types::ModelType;

/// Registration for an arbitrary action body
pub fn action_registration(spec: ModelSpec, action: Arc<dyn ModelAction>) -> ModelRegistration {
    ModelRegistration::builder()
        .with_component(ModelSpecComponent(spec))
        .with_component(ModelActionComponent(action))
        .with_component(ModelActionTag)
        .build()
}

/// Run `action` on every entity satisfying `spec`
pub fn configure_matching<F>(spec: ModelSpec, action: F) -> ModelRegistration
where
    F: Fn(&mut ModelNode<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    action_registration(spec, Arc::new(action))
}

/// Run `action` on every realized entity projected as `ty`
pub fn configure_each<F>(ty: ModelType, action: F) -> ModelRegistration
where
    F: Fn(&mut ModelNode<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    configure_matching(
        state_at_least(ModelState::Realized).and(subtype_of(ty)),
        action,
    )
}

/// [`configure_each`], restricted to entities also satisfying `spec`
pub fn configure_each_matching<F>(spec: ModelSpec, ty: ModelType, action: F) -> ModelRegistration
where
    F: Fn(&mut ModelNode<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    configure_matching(
        spec.and(state_at_least(ModelState::Realized))
            .and(subtype_of(ty)),
        action,
    )
}

/// Run `action` on the realized entity with this fully qualified name
pub fn configure<F>(name: impl Into<String>, ty: ModelType, action: F) -> ModelRegistration
where
    F: Fn(&mut ModelNode<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    configure_matching(
        state_at_least(ModelState::Realized)
            .and(qualified(name))
            .and(subtype_of(ty)),
        action,
    )
}

/// Run `action` on the entity `id` once it is realized
pub fn configure_ref<F>(id: EntityId, ty: ModelType, action: F) -> ModelRegistration
where
    F: Fn(&mut ModelNode<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    configure_matching(
        self_ref(id)
            .and(state_at_least(ModelState::Realized))
            .and(subtype_of(ty)),
        action,
    )
}

/// Run `action` on every entity projected as `ty` as soon as it is registered
///
/// The entity may not be realized yet; the action only sees a [`KnownElement`].
pub fn when_element_known<F>(ty: ModelType, action: F) -> ModelRegistration
where
    F: Fn(KnownElement<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    known_registration(
        state_at_least(ModelState::Registered).and(subtype_of(ty.clone())),
        ty,
        action,
    )
}

/// [`when_element_known`], restricted to entities also satisfying `spec`
pub fn when_element_known_matching<F>(spec: ModelSpec, ty: ModelType, action: F) -> ModelRegistration
where
    F: Fn(KnownElement<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    known_registration(
        spec.and(state_at_least(ModelState::Registered))
            .and(subtype_of(ty.clone())),
        ty,
        action,
    )
}

fn known_registration<F>(spec: ModelSpec, ty: ModelType, action: F) -> ModelRegistration
where
    F: Fn(KnownElement<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    configure_matching(spec, move |node: &mut ModelNode<'_>| {
        let id = node.id();
        action(KnownElement {
            graph: node.graph_mut(),
            id,
            ty: ty.clone(),
        })
    })
}

/// Every action registration in the graph, in creation order
pub fn registrations(graph: &ModelGraph) -> Vec<EntityId> {
    graph.query(|entity| entity.has::<ModelActionTag>())
}

/// Registrations whose spec the identity satisfies, in creation order
pub fn matching_registrations(graph: &ModelGraph, identity: &Identity) -> Vec<EntityId> {
    graph.query(|entity| {
        entity.has::<ModelActionTag>()
            && entity
                .find::<ModelSpecComponent>()
                .is_some_and(|spec| spec.get().is_satisfied_by(identity))
    })
}

/// An entity known to the model but possibly not realized yet
pub struct KnownElement<'a> {
    graph: &'a mut ModelGraph,
    id: EntityId,
    ty: ModelType,
}

impl<'a> KnownElement<'a> {
    /// Entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The projection type the action was registered for
    pub fn ty(&self) -> &ModelType {
        &self.ty
    }

    /// Snapshot of the entity's identity
    pub fn identity(&self) -> Identity {
        self.graph
            .find::<Identity>(self.id)
            .cloned()
            .unwrap_or_default()
    }

    /// Element name, if one was written
    pub fn name(&self) -> Option<&ElementName> {
        self.graph.find::<ElementName>(self.id)
    }

    /// Current lifecycle state
    pub fn state(&self) -> Option<ModelState> {
        self.graph.find::<ModelState>(self.id).copied()
    }

    /// Read access to the graph
    pub fn graph(&self) -> &ModelGraph {
        &*self.graph
    }

    /// Configure this element once it is realized
    pub fn configure<F>(&mut self, action: F) -> Result<EntityId>
    where
        F: Fn(&mut ModelNode<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let registration = configure_ref(self.id, self.ty.clone(), action);
        self.graph.register(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::ModelProjection;

    struct Library;
    impl ModelProjection for Library {}

    #[test]
    fn test_registration_components_in_order() {
        let registration = configure_each(ModelType::of::<Library>(), |_| Ok(()));
        let names: Vec<_> = registration.component_types().map(|ty| ty.name()).collect();

        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with("ModelSpecComponent"));
        assert!(names[1].ends_with("ModelActionComponent"));
        assert!(names[2].ends_with("ModelActionTag"));
    }

    #[test]
    fn test_canned_specs() {
        let ty = ModelType::of::<Library>();
        let id = EntityId::new(4);

        let mut graph = ModelGraph::new();
        let each = graph.register(configure_each(ty.clone(), |_| Ok(()))).unwrap();
        let by_ref = graph.register(configure_ref(id, ty.clone(), |_| Ok(()))).unwrap();
        let known = graph.register(when_element_known(ty.clone(), |_| Ok(()))).unwrap();

        let spec_of = |entity| graph.find::<ModelSpecComponent>(entity).unwrap().get().clone();
        assert_eq!(
            spec_of(each),
            subtype_of(ty.clone()).and(state_at_least(ModelState::Realized))
        );
        assert_eq!(
            spec_of(by_ref),
            state_at_least(ModelState::Realized)
                .and(subtype_of(ty.clone()))
                .and(self_ref(id))
        );
        assert_eq!(
            spec_of(known),
            subtype_of(ty).and(state_at_least(ModelState::Registered))
        );
        assert_eq!(registrations(&graph), vec![each, by_ref, known]);
    }
}
