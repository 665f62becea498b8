//! Action dispatcher
//!
//! The dispatcher reacts to two events through graph rules:
//! - an entity's [`Identity`] was written: run every registration it now
//!   satisfies and has not run yet
//! - an action registration was added: run it on every entity that already
//!   satisfies its spec
//!
//! Execution for one entity happens inside a reconciliation scope. Writes an
//! action makes on its own entity only queue further registrations on that
//! scope; the drain loop picks them up after the current action returns.

use std::sync::Arc;

use parking_lot::Mutex;

use super::action::{ModelActionComponent, ModelActionTag, ModelSpecComponent};
use super::identity::Identity;
use super::ledger::{has_executed, record_executed};
use super::reentrancy::{ReentrancyScope, ScopeGuard};
use super::registry::matching_registrations;
use super::rules;
use crate::model::entity::EntityId;
use crate::model::error::{DispatchError, ModelError, Result};
use crate::model::graph::ModelGraph;
use crate::model::rule::Rule;
use crate::model::ModelConfig;

/// Runs matching actions on entities, exactly once per entity and registration
#[derive(Clone)]
pub struct Dispatcher {
    scopes: Arc<Mutex<ReentrancyScope>>,
    drain_limit: usize,
    debug: bool,
}

impl Dispatcher {
    /// Create a dispatcher that is not yet wired to a graph
    ///
    /// Fails when the configuration is invalid, e.g. a zero drain limit.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scopes: Arc::new(Mutex::new(ReentrancyScope::new())),
            drain_limit: config.drain_limit,
            debug: config.debug,
        })
    }

    /// Create a dispatcher and configure its rules on the graph
    ///
    /// Installs the identity update rules, then the two dispatch rules.
    pub fn install(graph: &mut ModelGraph, config: &ModelConfig) -> Result<Self> {
        let dispatcher = Self::new(config)?;
        rules::install(graph)?;

        let on_identity = dispatcher.clone();
        graph.configure(
            Rule::builder("dispatch-identity-changed")
                .input::<Identity>()
                .execute(move |graph, entity| on_identity.identity_changed(graph, entity)),
        )?;

        let on_registration = dispatcher.clone();
        graph.configure(
            Rule::builder("dispatch-action-registered")
                .input::<ModelSpecComponent>()
                .input::<ModelActionComponent>()
                .input::<ModelActionTag>()
                .execute(move |graph, registration| {
                    on_registration.registration_added(graph, registration)
                }),
        )?;

        tracing::debug!("Dispatcher installed with drain limit {}", config.drain_limit);
        Ok(dispatcher)
    }

    /// Run every pending registration matching the entity's identity
    ///
    /// Fails with [`DispatchError::ReentrantReconciliation`] when the entity is
    /// already being reconciled, e.g. when called from one of its own actions.
    pub fn reconcile(&self, graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
        if self.is_reconciling(entity) {
            return Err(DispatchError::ReentrantReconciliation(entity).into());
        }
        let candidates = self.candidates(graph, entity);
        if candidates.is_empty() {
            return Ok(());
        }
        self.reconcile_with(graph, entity, candidates)
    }

    /// Whether a reconciliation scope is open for the entity
    pub fn is_reconciling(&self, entity: EntityId) -> bool {
        self.scopes.lock().is_open(entity)
    }

    /// Registrations queued for an entity that is being reconciled
    pub fn pending(&self, entity: EntityId) -> usize {
        self.scopes.lock().pending(entity)
    }

    fn identity_changed(&self, graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
        let candidates = self.candidates(graph, entity);

        let deferred = {
            let mut scopes = self.scopes.lock();
            if scopes.is_open(entity) {
                for registration in &candidates {
                    if scopes.defer(entity, *registration) {
                        tracing::trace!(
                            "Deferred registration {} on entity {}",
                            registration,
                            entity
                        );
                    }
                }
                true
            } else {
                false
            }
        };

        if deferred || candidates.is_empty() {
            return Ok(());
        }
        self.reconcile_with(graph, entity, candidates)
    }

    fn registration_added(&self, graph: &mut ModelGraph, registration: EntityId) -> Result<()> {
        let Some(spec) = graph
            .find::<ModelSpecComponent>(registration)
            .map(|spec| spec.get().clone())
        else {
            return Ok(());
        };
        tracing::debug!("Registration {} added for {}", registration, spec);

        let targets = graph.query(|entity| {
            entity
                .find::<Identity>()
                .is_some_and(|identity| spec.is_satisfied_by(identity))
        });

        for entity in targets {
            if has_executed(graph, entity, registration) {
                continue;
            }
            let deferred = self.scopes.lock().defer(entity, registration);
            if deferred {
                tracing::trace!(
                    "Deferred registration {} on entity {}",
                    registration,
                    entity
                );
                continue;
            }
            if self.is_reconciling(entity) {
                // Already queued on the open scope.
                continue;
            }
            self.reconcile_with(graph, entity, vec![registration])?;
        }
        Ok(())
    }

    fn candidates(&self, graph: &ModelGraph, entity: EntityId) -> Vec<EntityId> {
        let Some(identity) = graph.find::<Identity>(entity) else {
            return Vec::new();
        };
        matching_registrations(graph, identity)
            .into_iter()
            .filter(|registration| !has_executed(graph, entity, *registration))
            .collect()
    }

    fn reconcile_with(
        &self,
        graph: &mut ModelGraph,
        entity: EntityId,
        initial: Vec<EntityId>,
    ) -> Result<()> {
        let scope = ScopeGuard::open(&self.scopes, entity, initial)?;
        let result = self.drain(graph, entity);
        drop(scope);

        if let Err(err) = &result {
            tracing::warn!("Reconciliation of entity {} aborted: {}", entity, err);
        }
        result
    }

    fn drain(&self, graph: &mut ModelGraph, entity: EntityId) -> Result<()> {
        let mut executed = 0usize;

        loop {
            let next = self.scopes.lock().pop(entity);
            let Some(registration) = next else {
                return Ok(());
            };
            if has_executed(graph, entity, registration) {
                continue;
            }

            executed += 1;
            if executed > self.drain_limit {
                return Err(DispatchError::DrainLimitExceeded {
                    entity,
                    limit: self.drain_limit,
                }
                .into());
            }

            let Some(action) = graph
                .find::<ModelActionComponent>(registration)
                .map(ModelActionComponent::get)
            else {
                tracing::warn!("Registration {} has no action", registration);
                continue;
            };

            if self.debug {
                tracing::debug!("Running action {} on entity {}", registration, entity);
            } else {
                tracing::trace!("Running action {} on entity {}", registration, entity);
            }

            let mut node = graph.node(entity)?;
            action
                .execute(&mut node)
                .map_err(|source| ModelError::Action {
                    entity,
                    registration,
                    source,
                })?;
            record_executed(graph, entity, registration)?;
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("drain_limit", &self.drain_limit)
            .field("debug", &self.debug)
            .finish()
    }
}
