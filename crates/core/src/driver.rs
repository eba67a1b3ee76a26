// SigWired - Architectural Compliance Run Orchestrator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Parallel execution driver.
//!
//! Delegates all scheduling to the external build tool: `make -k -j<N>` over
//! the generated description. `-k` keeps sibling targets running past a
//! failed one; the driver only observes the aggregate exit status and never
//! parses tool output or retries targets.

use crate::registry::BuildDescription;
use crate::{DriverError, RunOutcome};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct ExecutionDriver {
    make: String,
    jobs: u32,
}

impl ExecutionDriver {
    pub fn new(make: impl Into<String>, jobs: u32) -> Self {
        Self {
            make: make.into(),
            jobs: jobs.max(1),
        }
    }

    /// Run every target of the build description, blocking until the build
    /// tool returns. Stdio is inherited; per-test output lands in the log
    /// files the recipes redirect to.
    pub fn execute(&self, build: &BuildDescription) -> Result<RunOutcome, DriverError> {
        if build.targets.is_empty() {
            tracing::info!("Build description has no targets; nothing to execute");
            return Ok(RunOutcome::Completed);
        }

        let mut cmd = Command::new(&self.make);
        cmd.arg("-k")
            .arg(format!("-j{}", self.jobs))
            .arg("-f")
            .arg(&build.path)
            .args(&build.targets);
        if let Some(dir) = build.path.parent() {
            cmd.current_dir(dir);
        }

        tracing::info!(
            "Executing {} targets via '{} -k -j{}' on {:?}",
            build.targets.len(),
            self.make,
            self.jobs,
            build.path
        );

        let status = cmd.status().map_err(|source| DriverError::Spawn {
            make: self.make.clone(),
            source,
        })?;

        if status.success() {
            Ok(RunOutcome::Completed)
        } else {
            tracing::warn!("Build tool reported failed targets (status {})", status);
            Ok(RunOutcome::TargetFailures)
        }
    }
}
