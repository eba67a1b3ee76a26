// SigWired - Architectural Compliance Run Orchestrator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use sigwired_config::{load_test_list, DutConfig, IsaSpec};
use sigwired_core::adapter::DutAdapter;
use sigwired_core::driver::ExecutionDriver;
use sigwired_core::pipeline::PipelineBuilder;
use sigwired_core::registry::{BuildDescription, TargetRegistry};
use sigwired_core::{RunOutcome, RunStatus};

const EXIT_PASS: u8 = 0;
const EXIT_TARGET_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;
const EXIT_BUILD_ONLY: u8 = 4;

const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "SigWired compliance run orchestrator",
    long_about = None
)]
struct Cli {
    /// Path to the DUT configuration (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Path to the riscv-config based ISA specification (YAML)
    #[arg(short, long)]
    ispec: PathBuf,

    /// Path to the test list: a YAML mapping of test name to descriptor
    #[arg(short, long)]
    testlist: PathBuf,

    /// Run-level work directory (receives Makefile.<dut> and report.json)
    #[arg(short, long)]
    work_dir: PathBuf,

    /// Override the configured parallelism degree
    #[arg(long)]
    jobs: Option<u32>,

    /// Build every target but replace the simulate stage with a no-op
    #[arg(long)]
    no_run: bool,

    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct TargetReport {
    target: String,
    test: String,
    work_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct RunReport {
    result_schema_version: String,
    dut: String,
    status: String,
    makefile: PathBuf,
    jobs: u32,
    target_run: bool,
    targets: Vec<TargetReport>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    run_compliance(cli)
}

fn run_compliance(cli: Cli) -> ExitCode {
    info!("Starting SigWired compliance run");

    let mut config = match DutConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
    }
    if cli.no_run {
        config.target_run = false;
    }
    // CLI overrides must satisfy the same rules as the file.
    if let Err(e) = config.validate() {
        error!("{:#}", e);
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let ispec = match IsaSpec::from_file(&cli.ispec) {
        Ok(ispec) => ispec,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let adapter = match DutAdapter::configure(&config, &ispec) {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if let Err(e) = adapter.probe_executables() {
        error!("{}", e);
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let tests = match load_test_list(&cli.testlist) {
        Ok(tests) => tests,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    info!("Loaded {} tests for DUT '{}'", tests.len(), adapter.dut);

    if let Err(e) = std::fs::create_dir_all(&cli.work_dir) {
        error!("Failed to create work directory {:?}: {}", cli.work_dir, e);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    let builder = PipelineBuilder::new(&adapter, &config, cli.work_dir.clone());
    let mut registry = TargetRegistry::new(&cli.work_dir, &adapter.dut);
    for test in &tests {
        match builder.build(test) {
            Ok(pipeline) => {
                registry.add_target(pipeline);
            }
            Err(e) => {
                error!("Failed to build pipeline for '{}': {:#}", test.name, e);
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        }
    }

    let build = match registry.write() {
        Ok(build) => build,
        Err(e) => {
            error!("Failed to write build description: {}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let driver = ExecutionDriver::new(config.make.as_str(), config.jobs);
    let outcome = match driver.execute(&build) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let status = if config.target_run {
        match outcome {
            RunOutcome::Completed => RunStatus::Passed,
            RunOutcome::TargetFailures => RunStatus::TargetFailures,
        }
    } else {
        RunStatus::BuildOnly
    };

    write_report(&cli.work_dir, &config, &registry, &build, status);

    match status {
        RunStatus::Passed => {
            info!("Run complete; signatures are in each test's work directory");
            ExitCode::from(EXIT_PASS)
        }
        RunStatus::TargetFailures => {
            error!("One or more targets failed; check the per-test logs");
            ExitCode::from(EXIT_TARGET_FAIL)
        }
        RunStatus::BuildOnly => {
            info!("Build-only run complete; no signatures were produced");
            ExitCode::from(EXIT_BUILD_ONLY)
        }
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Passed => "passed",
        RunStatus::TargetFailures => "target_failures",
        RunStatus::BuildOnly => "build_only",
    }
}

/// Best-effort run report for CI consumers; failures are logged, never fatal.
fn write_report(
    work_dir: &std::path::Path,
    config: &DutConfig,
    registry: &TargetRegistry,
    build: &BuildDescription,
    status: RunStatus,
) {
    let report = RunReport {
        result_schema_version: REPORT_SCHEMA_VERSION.to_string(),
        dut: config.dut.clone(),
        status: status_label(status).to_string(),
        makefile: build.path.clone(),
        jobs: config.jobs,
        target_run: config.target_run,
        targets: registry
            .targets()
            .iter()
            .map(|t| TargetReport {
                target: t.name.clone(),
                test: t.test_name.clone(),
                work_dir: t.work_dir.clone(),
            })
            .collect(),
    };

    let path = work_dir.join("report.json");
    match std::fs::File::create(&path) {
        Ok(f) => {
            if let Err(e) = serde_json::to_writer_pretty(f, &report) {
                error!("Failed to write run report {:?}: {}", path, e);
            }
        }
        Err(e) => error!("Failed to create run report {:?}: {}", path, e),
    }
}
