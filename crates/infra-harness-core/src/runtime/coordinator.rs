// crates/infra-harness-core/src/runtime/coordinator.rs
// ============================================================================
// Module: Concurrent Test Coordinator
// Description: Runs one lifecycle task per module and aggregates outcomes.
// Purpose: Isolate module failures and resource names across a concurrent run.
// Dependencies: tokio, crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`ConcurrentTestCoordinator::run_all`] validates every [`ModuleSpec`]
//! before anything is provisioned, then spawns one lifecycle per module on a
//! [`JoinSet`]. Modules never cancel each other: every lifecycle runs to a
//! terminal state and the report holds one outcome per module.
//!
//! Isolation is enforced by naming. Parameters a spec lists as isolated get
//! the run id appended, and two modules resolving to the same resource name
//! are rejected before dispatch. Each lifecycle runs inside its own nested
//! task so that a lifecycle that dies still yields a leak-suspected outcome
//! for its module instead of a missing entry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::naming::isolate_value;
use crate::audit::LifecycleAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::SuiteAuditEvent;
use crate::core::InstanceId;
use crate::core::ModuleDefinitionRef;
use crate::core::ModuleHandle;
use crate::core::ModuleName;
use crate::core::ModuleOutcome;
use crate::core::ModuleTarget;
use crate::core::ParameterSet;
use crate::core::RunId;
use crate::core::SuiteReport;
use crate::interfaces::ModuleTest;
use crate::interfaces::ProvisioningEngine;
use crate::runtime::LifecycleManager;
use crate::runtime::LifecycleTimeouts;

// ============================================================================
// SECTION: Module Specs
// ============================================================================

/// One module to run: definition, parameters, isolation keys, and test body.
#[derive(Clone)]
pub struct ModuleSpec {
    /// Module name (unique within a suite).
    pub name: ModuleName,
    /// Declarative source locator.
    pub definition: ModuleDefinitionRef,
    /// Parameters before isolation.
    pub parameters: ParameterSet,
    /// Parameters that name externally visible resources.
    pub isolated_parameters: Vec<String>,
    /// Test body run against the provisioned module.
    pub test: Arc<dyn ModuleTest>,
}

impl ModuleSpec {
    /// Creates a spec with no parameters.
    #[must_use]
    pub fn new(
        name: ModuleName,
        definition: impl Into<ModuleDefinitionRef>,
        test: Arc<dyn ModuleTest>,
    ) -> Self {
        Self {
            name,
            definition: definition.into(),
            parameters: ParameterSet::new(),
            isolated_parameters: Vec::new(),
            test,
        }
    }

    /// Replaces the parameter set.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    /// Marks a parameter as a resource name that must carry the run id.
    #[must_use]
    pub fn isolate(mut self, key: impl Into<String>) -> Self {
        self.isolated_parameters.push(key.into());
        self
    }
}

/// A validated module ready for dispatch.
pub struct PreparedModule {
    /// Idle handle with isolated parameters applied.
    pub handle: ModuleHandle,
    /// Test body.
    pub test: Arc<dyn ModuleTest>,
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Coordinator settings for one run.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Run id appended to isolated names and instance keys.
    pub run_id: RunId,
    /// Upper bound on concurrently running lifecycles; unbounded when unset.
    pub max_parallel: Option<NonZeroUsize>,
    /// Timeouts applied to every lifecycle.
    pub timeouts: LifecycleTimeouts,
}

impl CoordinatorConfig {
    /// Creates settings with default timeouts and no parallelism bound.
    #[must_use]
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            max_parallel: None,
            timeouts: LifecycleTimeouts::default(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pre-dispatch validation failures. Nothing is provisioned when these occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// Two specs share a module name.
    #[error("duplicate module `{module}`")]
    DuplicateModule {
        /// Module name.
        module: ModuleName,
    },
    /// An isolated parameter is not set.
    #[error("module `{module}` isolates parameter `{key}` but does not set it")]
    MissingIsolatedParameter {
        /// Module name.
        module: ModuleName,
        /// Parameter name.
        key: String,
    },
    /// An isolated parameter is not a string.
    #[error("module `{module}` isolates parameter `{key}` but its value is not a string")]
    NonStringIsolatedParameter {
        /// Module name.
        module: ModuleName,
        /// Parameter name.
        key: String,
    },
    /// Two modules would create the same named resource.
    #[error("modules `{first}` and `{second}` both name a resource `{value}`")]
    ResourceNameCollision {
        /// Module that claimed the name first.
        first: ModuleName,
        /// Module that claimed it again.
        second: ModuleName,
        /// Isolated resource name.
        value: String,
    },
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Runs module lifecycles concurrently with fault isolation.
pub struct ConcurrentTestCoordinator {
    /// Engine shared by every lifecycle.
    engine: Arc<dyn ProvisioningEngine>,
    /// Run settings.
    config: CoordinatorConfig,
    /// Audit sink for lifecycle and suite events.
    audit: Arc<dyn LifecycleAuditSink>,
}

impl ConcurrentTestCoordinator {
    /// Creates a coordinator with no audit output.
    #[must_use]
    pub fn new(engine: Arc<dyn ProvisioningEngine>, config: CoordinatorConfig) -> Self {
        Self {
            engine,
            config,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn LifecycleAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the run id.
    #[must_use]
    pub const fn run_id(&self) -> &RunId {
        &self.config.run_id
    }

    /// Validates specs and applies run-scoped isolation.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] on duplicate names, missing or non-string
    /// isolated parameters, or colliding isolated resource names.
    pub fn prepare(&self, specs: Vec<ModuleSpec>) -> Result<Vec<PreparedModule>, CoordinatorError> {
        let run_id = &self.config.run_id;
        let mut names = BTreeSet::new();
        let mut claimed: BTreeMap<String, ModuleName> = BTreeMap::new();
        let mut prepared = Vec::with_capacity(specs.len());

        for spec in specs {
            if !names.insert(spec.name.clone()) {
                return Err(CoordinatorError::DuplicateModule {
                    module: spec.name,
                });
            }
            let mut parameters = spec.parameters;
            for key in &spec.isolated_parameters {
                let value = parameters
                    .get(key)
                    .ok_or_else(|| CoordinatorError::MissingIsolatedParameter {
                        module: spec.name.clone(),
                        key: key.clone(),
                    })?
                    .as_str()
                    .ok_or_else(|| CoordinatorError::NonStringIsolatedParameter {
                        module: spec.name.clone(),
                        key: key.clone(),
                    })?;
                let isolated = isolate_value(value, run_id);
                if let Some(first) = claimed.get(&isolated)
                    && first != &spec.name
                {
                    return Err(CoordinatorError::ResourceNameCollision {
                        first: first.clone(),
                        second: spec.name.clone(),
                        value: isolated,
                    });
                }
                claimed.insert(isolated.clone(), spec.name.clone());
                parameters.insert(key.clone(), isolated);
            }
            prepared.push(PreparedModule {
                handle: ModuleHandle::new(ModuleTarget {
                    instance: InstanceId::derive(&spec.name, run_id),
                    name: spec.name,
                    definition: spec.definition,
                    parameters,
                }),
                test: spec.test,
            });
        }
        Ok(prepared)
    }

    /// Runs every module to a terminal state and aggregates the outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] when validation fails; in that case no
    /// module is provisioned. Module failures never produce an error: they
    /// are reported in the returned [`SuiteReport`].
    pub async fn run_all(&self, specs: Vec<ModuleSpec>) -> Result<SuiteReport, CoordinatorError> {
        let prepared = self.prepare(specs)?;
        let run_id = self.config.run_id.clone();
        let expected: BTreeMap<ModuleName, InstanceId> = prepared
            .iter()
            .map(|module| (module.handle.name().clone(), module.handle.instance().clone()))
            .collect();
        self.audit.record_suite(&SuiteAuditEvent::started(&run_id, expected.keys().cloned().collect()));

        let manager = Arc::new(
            LifecycleManager::new(Arc::clone(&self.engine), run_id.clone())
                .with_timeouts(self.config.timeouts.clone())
                .with_audit(Arc::clone(&self.audit)),
        );
        let limiter = self.config.max_parallel.map(|limit| Arc::new(Semaphore::new(limit.get())));

        let mut tasks = JoinSet::new();
        for module in prepared {
            let manager = Arc::clone(&manager);
            let limiter = limiter.clone();
            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                let name = module.handle.name().clone();
                let instance = module.handle.instance().clone();
                let lifecycle =
                    tokio::spawn(async move { manager.run(module.handle, module.test).await });
                match lifecycle.await {
                    Ok(outcome) => outcome,
                    Err(err) => ModuleOutcome::aborted(
                        name,
                        instance,
                        format!("lifecycle task failed: {err}"),
                    ),
                }
            });
        }

        let mut outcomes = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            if let Ok(outcome) = joined {
                outcomes.insert(outcome.module.clone(), outcome);
            }
        }
        for (name, instance) in expected {
            outcomes.entry(name.clone()).or_insert_with(|| {
                ModuleOutcome::aborted(name, instance, "lifecycle task did not report an outcome")
            });
        }

        let report = SuiteReport::new(run_id, outcomes);
        self.audit.record_suite(&SuiteAuditEvent::finished(&report));
        Ok(report)
    }
}
