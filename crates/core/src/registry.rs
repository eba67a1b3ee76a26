// SigWired - Architectural Compliance Run Orchestrator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Target registry and build-description serialization.
//!
//! Each registered pipeline becomes one named Makefile target whose recipe
//! is the pipeline's command list, chained with `&&` after an initial `cd`
//! into the test's work directory. Target names come from a counter owned by
//! this registry instance, never a process-wide one. Writing fully replaces
//! any stale description at the output path.

use crate::pipeline::CommandPipeline;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Target {
    pub name: String,
    pub test_name: String,
    pub work_dir: PathBuf,
    commands: Vec<String>,
}

/// The written build description: input to the execution driver.
#[derive(Debug, Clone)]
pub struct BuildDescription {
    pub path: PathBuf,
    pub targets: Vec<String>,
}

#[derive(Debug)]
pub struct TargetRegistry {
    makefile_path: PathBuf,
    targets: Vec<Target>,
}

impl TargetRegistry {
    /// Registry for one run; the description is written to
    /// `<work_dir>/Makefile.<dut>`.
    pub fn new(work_dir: &Path, dut: &str) -> Self {
        Self {
            makefile_path: work_dir.join(format!("Makefile.{}", dut)),
            targets: Vec::new(),
        }
    }

    pub fn makefile_path(&self) -> &Path {
        &self.makefile_path
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Register a pipeline under a fresh, unique target name.
    pub fn add_target(&mut self, pipeline: CommandPipeline) -> &str {
        let name = format!("TARGET{}", self.targets.len());
        tracing::debug!("Registered {} for test '{}'", name, pipeline.test_name);
        self.targets.push(Target {
            name,
            test_name: pipeline.test_name,
            work_dir: pipeline.work_dir,
            commands: pipeline.commands,
        });
        &self.targets[self.targets.len() - 1].name
    }

    /// Serialize all targets. Any stale description at the output path is
    /// removed first; the file is always rewritten whole, never merged.
    pub fn write(&self) -> io::Result<BuildDescription> {
        if self.makefile_path.exists() {
            std::fs::remove_file(&self.makefile_path)?;
        }

        let mut doc = String::new();
        doc.push_str(".PHONY :");
        for target in &self.targets {
            doc.push(' ');
            doc.push_str(&target.name);
        }
        doc.push_str("\n\n");

        for target in &self.targets {
            doc.push_str(&target.name);
            doc.push_str(" :\n");
            doc.push_str(&format!("\t@cd {} && \\\n", target.work_dir.display()));
            for (i, command) in target.commands.iter().enumerate() {
                doc.push('\t');
                doc.push_str(command);
                if i + 1 < target.commands.len() {
                    doc.push_str(" && \\");
                }
                doc.push('\n');
            }
            doc.push('\n');
        }

        std::fs::write(&self.makefile_path, doc)?;
        tracing::info!(
            "Wrote build description with {} targets to {:?}",
            self.targets.len(),
            self.makefile_path
        );

        Ok(BuildDescription {
            path: self.makefile_path.clone(),
            targets: self.targets.iter().map(|t| t.name.clone()).collect(),
        })
    }
}
