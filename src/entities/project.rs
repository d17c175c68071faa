//! Project persistence: JSON save/load of the target pool.
//!
//! The on-disk format is the documented per-target JSON (camelCase field
//! names); runtime-only state (trim windows for video, tap latches, sound
//! slots) is re-derived on load.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::core::runtime::Runtime;
use crate::entities::target::TargetKind;

/// A saved project: the target pool.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub targets: Vec<TargetKind>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a runtime's targets into a saveable project.
    pub fn from_runtime(runtime: &Runtime) -> Self {
        Self {
            targets: runtime.targets.clone(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing project")
    }

    /// Parse from JSON and re-establish runtime invariants.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut project: Project = serde_json::from_str(json).context("parsing project JSON")?;
        for target in &mut project.targets {
            target.normalize_after_load();
        }
        Ok(project)
    }

    /// Write the project to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).with_context(|| format!("writing project to {}", path.display()))?;
        info!("saved project with {} targets to {}", self.targets.len(), path.display());
        Ok(())
    }

    /// Load a project from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading project from {}", path.display()))?;
        let project = Self::from_json(&json)?;
        info!("loaded project with {} targets from {}", project.targets.len(), path.display());
        Ok(project)
    }

    /// Build a runtime seeded with this project's targets.
    pub fn into_runtime(self, step_time_ms: f64) -> Result<Runtime> {
        let mut runtime = Runtime::new(step_time_ms)?;
        for target in self.targets {
            runtime.add_target(target);
        }
        Ok(runtime)
    }
}
