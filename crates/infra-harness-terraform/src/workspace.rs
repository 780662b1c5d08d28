// crates/infra-harness-terraform/src/workspace.rs
// ============================================================================
// Module: Instance Workspace
// Description: Per-instance state, variable, and plugin directories.
// Purpose: Keep concurrent instances of one definition from sharing state.
// Dependencies: infra-harness-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Two instances of the same module definition run against one source
//! directory. Giving each instance its own state file, variable file, and
//! `TF_DATA_DIR` keeps their plans, locks, and outputs apart.

use std::path::Path;
use std::path::PathBuf;

use infra_harness_core::InstanceId;
use infra_harness_core::ParameterSet;

use crate::command::TerraformError;

/// Files owned by one module instance.
#[derive(Debug, Clone)]
pub(crate) struct InstanceWorkspace {
    /// `<work_root>/<instance>`.
    root: PathBuf,
}

impl InstanceWorkspace {
    /// Locates the workspace of an instance under an absolute work root.
    pub(crate) fn new(work_root: &Path, instance: &InstanceId) -> Self {
        Self {
            root: work_root.join(instance.as_str()),
        }
    }

    /// State file passed with `-state`.
    pub(crate) fn state_path(&self) -> PathBuf {
        self.root.join("terraform.tfstate")
    }

    /// Variable file passed with `-var-file`.
    pub(crate) fn var_file(&self) -> PathBuf {
        self.root.join("terraform.tfvars.json")
    }

    /// Marker present while an apply is in flight.
    pub(crate) fn apply_marker(&self) -> PathBuf {
        self.root.join("apply.started")
    }

    /// Directory exported as `TF_DATA_DIR`.
    pub(crate) fn data_dir(&self) -> PathBuf {
        self.root.join(".terraform")
    }

    /// Creates the directory and writes the variable file.
    pub(crate) async fn prepare(&self, parameters: &ParameterSet) -> Result<(), TerraformError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|err| io_error(&self.root, &err))?;
        let vars = serde_json::to_vec_pretty(&parameters.to_json())
            .map_err(|err| TerraformError::Io(err.to_string()))?;
        let var_file = self.var_file();
        tokio::fs::write(&var_file, vars).await.map_err(|err| io_error(&var_file, &err))
    }

    /// Returns true when a state file exists for the instance.
    pub(crate) async fn has_state(&self) -> Result<bool, TerraformError> {
        let state = self.state_path();
        tokio::fs::try_exists(&state).await.map_err(|err| io_error(&state, &err))
    }

    /// Writes the apply marker. Call after `prepare`.
    pub(crate) async fn mark_apply_started(&self) -> Result<(), TerraformError> {
        let marker = self.apply_marker();
        tokio::fs::write(&marker, b"").await.map_err(|err| io_error(&marker, &err))
    }

    /// Removes the apply marker if present.
    pub(crate) async fn clear_apply_marker(&self) -> Result<(), TerraformError> {
        let marker = self.apply_marker();
        match tokio::fs::remove_file(&marker).await {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(io_error(&marker, &err)),
            _ => Ok(()),
        }
    }

    /// Returns true when an apply started and never returned.
    pub(crate) async fn apply_interrupted(&self) -> Result<bool, TerraformError> {
        let marker = self.apply_marker();
        tokio::fs::try_exists(&marker).await.map_err(|err| io_error(&marker, &err))
    }

    /// Returns true when providers were already installed for the instance.
    pub(crate) async fn is_initialized(&self) -> bool {
        tokio::fs::try_exists(self.data_dir()).await.unwrap_or(false)
    }
}

/// Formats an I/O error with its path.
fn io_error(path: &Path, err: &std::io::Error) -> TerraformError {
    TerraformError::Io(format!("{}: {err}", path.display()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
