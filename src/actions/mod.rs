//! Reactive action dispatch
//!
//! Subsystems register actions together with a [`ModelSpec`]. Every
//! configurable entity carries an [`Identity`] rebuilt from its facts, and the
//! [`Dispatcher`] runs each action exactly once on every entity whose identity
//! satisfies the action's spec.

pub mod action;
pub mod dispatcher;
pub mod identity;
pub mod ledger;
pub mod reentrancy;
pub mod registry;
pub mod rules;
pub mod spec;

// Re-export commonly used types
pub use action::{ModelAction, ModelActionComponent, ModelActionTag, ModelSpecComponent};
pub use dispatcher::Dispatcher;
pub use identity::{Fact, FactKind, Identity};
pub use ledger::{executed_actions, has_executed, ExecutedActions};
pub use reentrancy::ReentrancyScope;
pub use registry::{
    action_registration, configure, configure_each, configure_each_matching, configure_matching,
    configure_ref, registrations, when_element_known, when_element_known_matching, KnownElement,
};
pub use spec::{
    descendant_of, named, owned_by, qualified, relative_name, self_ref, state_at_least,
    subtype_of, ModelSpec,
};
