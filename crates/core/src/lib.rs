// SigWired - Architectural Compliance Run Orchestrator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod adapter;
pub mod command;
pub mod driver;
pub mod pipeline;
pub mod registry;

/// Fatal pre-execution configuration defects. Surfaced before any target is
/// registered; the run must not proceed past one of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration field '{0}'")]
    MissingField(&'static str),
    #[error("'{0}': executable not found. Please check environment setup.")]
    ExecutableNotFound(String),
}

/// A command template could not be fully substituted. Treated as a
/// configuration defect, never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("unresolved placeholder '{{{0}}}' in command template")]
    UnresolvedPlaceholder(String),
    #[error("unterminated placeholder near '{0}' in command template")]
    UnterminatedPlaceholder(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to spawn '{make}': {source}")]
    Spawn {
        make: String,
        #[source]
        source: std::io::Error,
    },
}

/// Aggregate outcome of one driver invocation. Per-target status is observed
/// through the filesystem artifacts, not in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    TargetFailures,
}

/// Run-level status as reported to the host framework. `BuildOnly` is a
/// deliberate early termination, distinct from failure: targets were built
/// but no comparison artifacts were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Passed,
    TargetFailures,
    BuildOnly,
}
