//! Model orchestrator and public API
//!
//! This module provides the `Model` struct that owns the entity graph and the
//! action dispatcher, and exposes the interface build logic embeds.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

// Submodules
pub mod entity;
pub mod error;
pub mod graph;
pub mod names;
pub mod node;
pub mod rule;
pub mod state;
pub mod types;

use crate::actions::dispatcher::Dispatcher;

/// Configuration for a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Diagnostic name of the model
    pub name: String,

    /// Maximum number of actions one reconciliation scope may run
    pub drain_limit: usize,

    /// Log every action execution at debug level instead of trace
    pub debug: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            drain_limit: 10_000,
            debug: false,
        }
    }
}

impl ModelConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: ModelConfig =
            serde_json::from_slice(&data).context("Failed to deserialize config")?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Check the values a model cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.drain_limit == 0 {
            return Err(ModelError::Config("drain_limit must be at least 1".into()));
        }
        Ok(())
    }
}

/// An entity graph wired to an action dispatcher
///
/// Creating a model installs the identity and dispatch rules, so every
/// registration and every fact written afterwards takes part in dispatch.
pub struct Model {
    config: ModelConfig,
    graph: ModelGraph,
    dispatcher: Dispatcher,
}

impl Model {
    /// Create a model with the given configuration
    pub fn new(config: ModelConfig) -> Result<Self> {
        let mut graph = ModelGraph::new();
        let dispatcher = Dispatcher::install(&mut graph, &config)?;
        tracing::debug!("Model '{}' ready", config.name);

        Ok(Self {
            config,
            graph,
            dispatcher,
        })
    }

    /// Create a model from a configuration file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = ModelConfig::load(path)?;
        Ok(Self::new(config)?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Get the entity graph
    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Get mutable access to the entity graph
    pub fn graph_mut(&mut self) -> &mut ModelGraph {
        &mut self.graph
    }

    /// Get the dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Register an entity, typically an action built by [`crate::actions::registry`]
    pub fn register(&mut self, registration: ModelRegistration) -> Result<EntityId> {
        self.graph.register(registration)
    }

    /// Create an entity that takes part in dispatch
    pub fn create_entity(&mut self) -> Result<EntityId> {
        let id = self.graph.create_entity();
        self.graph.add_component(id, Configurable)?;
        Ok(id)
    }

    /// Mutable handle on an entity
    pub fn node(&mut self, id: EntityId) -> Result<ModelNode<'_>> {
        self.graph.node(id)
    }
}

// Re-export commonly used types
pub use entity::{Component, ComponentType, Configurable, EntityId, EntityRef, ParentComponent};
pub use error::{DispatchError, ModelError, Result};
pub use graph::{ModelGraph, ModelRegistration};
pub use names::{ElementName, FullyQualifiedName, RelativeName};
pub use node::ModelNode;
pub use rule::Rule;
pub use state::ModelState;
pub use types::{ModelProjection, ModelType, Projection, Projections};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.drain_limit, 10_000);
        assert!(!config.debug);
    }

    #[test]
    fn test_zero_drain_limit_rejected() {
        let config = ModelConfig {
            drain_limit: 0,
            ..ModelConfig::default()
        };
        assert!(matches!(Model::new(config), Err(ModelError::Config(_))));
    }

    #[test]
    fn test_created_entities_are_configurable() {
        let mut model = Model::new(ModelConfig::default()).unwrap();
        let id = model.create_entity().unwrap();
        assert!(model.graph().has::<Configurable>(id));
    }
}
