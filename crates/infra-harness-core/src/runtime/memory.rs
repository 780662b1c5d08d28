// crates/infra-harness-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Provisioning Engine
// Description: Deterministic backend simulation with fault injection.
// Purpose: Exercise lifecycle and coordination paths without real infrastructure.
// Dependencies: async-trait, tokio, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryEngine`] keeps a map of deployments keyed by instance and a
//! shared resource namespace. Each module definition is described by a
//! [`ModuleBlueprint`]: output templates and resource-name templates whose
//! `{param}` placeholders are filled from the parameter set (`{instance}` is
//! the instance key). Claiming a resource name already owned by another
//! instance is rejected, which is how isolation failures show up.
//!
//! Faults are injected per module name: failed applies (which still claim
//! their resources, like a half-finished real apply), a number of failed
//! destroys, and delays before apply or destroy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::InstanceId;
use crate::core::ModuleTarget;
use crate::core::ParameterSet;
use crate::interfaces::EngineError;
use crate::interfaces::ProvisioningEngine;

// ============================================================================
// SECTION: Blueprints
// ============================================================================

/// Simulated module definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleBlueprint {
    /// Output name to value template.
    outputs: BTreeMap<String, String>,
    /// Resource-name templates claimed in the shared namespace.
    resources: Vec<String>,
}

impl ModuleBlueprint {
    /// Creates an empty blueprint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an output rendered from `template`.
    #[must_use]
    pub fn output(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.outputs.insert(name.into(), template.into());
        self
    }

    /// Declares a resource name claimed in the shared namespace.
    #[must_use]
    pub fn resource(mut self, template: impl Into<String>) -> Self {
        self.resources.push(template.into());
        self
    }
}

/// Fills `{name}` placeholders from parameters and the instance key.
fn render(
    template: &str,
    parameters: &ParameterSet,
    instance: &InstanceId,
) -> Result<String, EngineError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[.. open]);
        let after = &rest[open + 1 ..];
        let Some(close) = after.find('}') else {
            return Err(EngineError::Rejected(format!("unterminated placeholder in `{template}`")));
        };
        let key = &after[.. close];
        if key == "instance" {
            rendered.push_str(instance.as_str());
        } else {
            let value = parameters.get(key).ok_or_else(|| {
                EngineError::Rejected(format!("missing required parameter `{key}`"))
            })?;
            rendered.push_str(&value.to_plain_string());
        }
        rest = &after[close + 1 ..];
    }
    rendered.push_str(rest);
    Ok(rendered)
}

// ============================================================================
// SECTION: Backend State
// ============================================================================

/// One simulated deployment.
#[derive(Debug, Clone)]
struct Deployment {
    /// Rendered outputs; empty for a failed apply.
    outputs: BTreeMap<String, String>,
    /// Resource names claimed by this deployment.
    resources: Vec<String>,
}

/// Mutable backend and fault state.
#[derive(Debug, Default)]
struct BackendState {
    /// Blueprints keyed by definition path.
    blueprints: BTreeMap<String, ModuleBlueprint>,
    /// Live deployments keyed by instance.
    deployments: BTreeMap<InstanceId, Deployment>,
    /// Resource name to owning instance.
    namespace: BTreeMap<String, InstanceId>,
    /// Apply calls per instance.
    apply_calls: BTreeMap<String, u32>,
    /// Destroy calls per instance.
    destroy_calls: BTreeMap<String, u32>,
    /// Modules whose apply fails after claiming resources.
    failing_applies: BTreeSet<String>,
    /// Remaining injected destroy failures per module.
    failing_destroys: BTreeMap<String, u32>,
    /// Delay before apply per module.
    apply_delays: BTreeMap<String, Duration>,
    /// Delay before destroy per module.
    destroy_delays: BTreeMap<String, Duration>,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Deterministic in-process provisioning engine.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    /// Backend and fault state.
    state: Mutex<BackendState>,
}

impl InMemoryEngine {
    /// Creates an engine with no blueprints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a blueprint for a definition path.
    #[must_use]
    pub fn with_blueprint(mut self, definition: impl Into<String>, blueprint: ModuleBlueprint) -> Self {
        self.state_mut().blueprints.insert(definition.into(), blueprint);
        self
    }

    /// Makes every apply of `module` fail after claiming its resources.
    #[must_use]
    pub fn fail_apply_for(mut self, module: impl Into<String>) -> Self {
        self.state_mut().failing_applies.insert(module.into());
        self
    }

    /// Makes the next `times` destroys of `module` fail.
    #[must_use]
    pub fn fail_destroy_for(mut self, module: impl Into<String>, times: u32) -> Self {
        self.state_mut().failing_destroys.insert(module.into(), times);
        self
    }

    /// Delays every apply of `module`.
    #[must_use]
    pub fn delay_apply_for(mut self, module: impl Into<String>, delay: Duration) -> Self {
        self.state_mut().apply_delays.insert(module.into(), delay);
        self
    }

    /// Delays every destroy of `module`.
    #[must_use]
    pub fn delay_destroy_for(mut self, module: impl Into<String>, delay: Duration) -> Self {
        self.state_mut().destroy_delays.insert(module.into(), delay);
        self
    }

    /// Returns the number of apply calls for an instance.
    #[must_use]
    pub fn apply_calls(&self, instance: &str) -> u32 {
        self.lock().apply_calls.get(instance).copied().unwrap_or(0)
    }

    /// Returns the number of destroy calls for an instance.
    #[must_use]
    pub fn destroy_calls(&self, instance: &str) -> u32 {
        self.lock().destroy_calls.get(instance).copied().unwrap_or(0)
    }

    /// Returns true when an instance has a deployment (complete or partial).
    #[must_use]
    pub fn is_deployed(&self, instance: &str) -> bool {
        self.lock().deployments.keys().any(|key| key.as_str() == instance)
    }

    /// Returns the instance owning a resource name.
    #[must_use]
    pub fn resource_owner(&self, resource: &str) -> Option<String> {
        self.lock().namespace.get(resource).map(|owner| owner.as_str().to_string())
    }

    /// Returns the number of live deployments.
    #[must_use]
    pub fn deployed_count(&self) -> usize {
        self.lock().deployments.len()
    }

    /// Locks the backend state.
    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Borrows the backend state during construction.
    fn state_mut(&mut self) -> &mut BackendState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the configured delay for a module, if any.
    fn delay(&self, module: &str, destroy: bool) -> Option<Duration> {
        let state = self.lock();
        let delays = if destroy { &state.destroy_delays } else { &state.apply_delays };
        delays.get(module).copied()
    }
}

#[async_trait]
impl ProvisioningEngine for InMemoryEngine {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn init_and_apply(&self, target: &ModuleTarget) -> Result<(), EngineError> {
        if let Some(delay) = self.delay(target.name.as_str(), false) {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        *state.apply_calls.entry(target.instance.as_str().to_string()).or_insert(0) += 1;
        let definition = target.definition.to_string();
        let blueprint = state.blueprints.get(&definition).cloned().ok_or_else(|| {
            EngineError::Rejected(format!("no module definition at `{definition}`"))
        })?;

        let resources = blueprint
            .resources
            .iter()
            .map(|template| render(template, &target.parameters, &target.instance))
            .collect::<Result<Vec<_>, _>>()?;
        for resource in &resources {
            if let Some(owner) = state.namespace.get(resource)
                && owner != &target.instance
            {
                return Err(EngineError::Rejected(format!(
                    "resource `{resource}` already exists (owned by `{owner}`)"
                )));
            }
        }
        let failing = state.failing_applies.contains(target.name.as_str());
        let outputs = if failing {
            BTreeMap::new()
        } else {
            blueprint
                .outputs
                .iter()
                .map(|(name, template)| {
                    render(template, &target.parameters, &target.instance)
                        .map(|value| (name.clone(), value))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?
        };

        for resource in &resources {
            state.namespace.insert(resource.clone(), target.instance.clone());
        }
        state.deployments.insert(target.instance.clone(), Deployment {
            outputs,
            resources,
        });
        if failing {
            return Err(EngineError::Backend("apply failed after creating resources".to_string()));
        }
        Ok(())
    }

    async fn output(&self, target: &ModuleTarget, name: &str) -> Result<String, EngineError> {
        let state = self.lock();
        state
            .deployments
            .get(&target.instance)
            .and_then(|deployment| deployment.outputs.get(name))
            .cloned()
            .ok_or_else(|| EngineError::OutputNotFound {
                name: name.to_string(),
            })
    }

    async fn destroy(&self, target: &ModuleTarget) -> Result<(), EngineError> {
        if let Some(delay) = self.delay(target.name.as_str(), true) {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        *state.destroy_calls.entry(target.instance.as_str().to_string()).or_insert(0) += 1;
        if let Some(remaining) = state.failing_destroys.get_mut(target.name.as_str())
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(EngineError::Backend("destroy failed: dependency still in use".to_string()));
        }
        if let Some(deployment) = state.deployments.remove(&target.instance) {
            for resource in deployment.resources {
                if state.namespace.get(&resource) == Some(&target.instance) {
                    state.namespace.remove(&resource);
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
