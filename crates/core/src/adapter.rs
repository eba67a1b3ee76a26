// SigWired - Architectural Compliance Run Orchestrator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! DUT adapter: the resolved per-run strategy record.
//!
//! One adapter per supported DUT family, selected by configuration. The
//! adapter carries concrete toolchain binary names, the derived ISA string
//! and the simulator argument-formatting convention; it never executes
//! anything itself beyond the pre-run executable probe.

use crate::command::{substitute, Vars};
use crate::ConfigError;
use anyhow::{Context, Result};
use sigwired_config::{DutConfig, IsaSpec, SimulatorFamily, Xlen};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DutAdapter {
    pub dut: String,
    pub xlen: Xlen,
    /// Derived DUT-level ISA string, e.g. `rv64imc`.
    pub isa: String,
    pub gcc: String,
    pub objcopy: String,
    pub objdump: String,
    pub nm: String,
    pub make: String,
    pub simulator: SimulatorFamily,
    pub dut_executable: Option<PathBuf>,
    pub extract_symbols: bool,
}

impl DutAdapter {
    /// Resolve the adapter from the DUT configuration and the loaded ISA
    /// specification. Register-width and ISA-string derivation happen here,
    /// once per run.
    pub fn configure(config: &DutConfig, ispec: &IsaSpec) -> Result<Self> {
        config.validate()?;
        let xlen = ispec.xlen()?;
        let isa = ispec.isa_string(xlen);

        let vars = Vars::new().set("xlen", xlen.bits().to_string());
        let prefix = substitute(&config.toolchain_prefix, &vars)
            .context("Failed to expand 'toolchain_prefix'")?;

        tracing::debug!(
            "DUT adapter configured: dut={} xlen={} isa={}",
            config.dut,
            xlen,
            isa
        );

        Ok(Self {
            dut: config.dut.clone(),
            xlen,
            isa,
            gcc: format!("{}gcc", prefix),
            objcopy: format!("{}objcopy", prefix),
            objdump: format!("{}objdump", prefix),
            nm: format!("{}nm", prefix),
            make: config.make.clone(),
            simulator: config.simulator,
            dut_executable: config.dut_executable.clone(),
            extract_symbols: config.extract_symbols,
        })
    }

    /// Verify that every external executable this adapter names resolves on
    /// the host. An unresolvable executable is fatal for the whole run and
    /// must be reported before any target is registered.
    pub fn probe_executables(&self) -> Result<(), ConfigError> {
        let mut tools = vec![
            self.gcc.clone(),
            self.objcopy.clone(),
            self.objdump.clone(),
        ];
        if self.extract_symbols {
            tools.push(self.nm.clone());
        }
        tools.push(self.make.clone());
        if let Some(exe) = &self.dut_executable {
            tools.push(exe.display().to_string());
        }

        for tool in &tools {
            match which::which(tool) {
                Ok(path) => tracing::debug!("Resolved '{}' -> {:?}", tool, path),
                Err(_) => return Err(ConfigError::ExecutableNotFound(tool.clone())),
            }
        }
        Ok(())
    }

    /// Simulator Makefile subdirectory for the HDL families; `None` for a
    /// directly invoked DUT executable.
    pub fn sim_subdir(&self) -> Option<&'static str> {
        match self.simulator {
            SimulatorFamily::Questa => Some("questa"),
            SimulatorFamily::Verilator => Some("verilator"),
            SimulatorFamily::Vivado => Some("vivado"),
            SimulatorFamily::Iss => None,
        }
    }

    /// Format HDL compile-time defines in the simulator's convention.
    /// Valueless defines are emitted as the bare key.
    pub fn format_defines(&self, defines: &[(&str, Option<&str>)]) -> String {
        let prefix = match self.simulator {
            SimulatorFamily::Questa => "-defineall",
            SimulatorFamily::Verilator => "-D",
            SimulatorFamily::Vivado | SimulatorFamily::Iss => "-d",
        };
        defines
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!("{} {}={}", prefix, key, value),
                None => format!("{} {}", prefix, key),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Format simulator launch plusargs in the family's convention.
    pub fn format_plusargs(&self, pairs: &[(&str, String)]) -> String {
        pairs
            .iter()
            .map(|(key, value)| match self.simulator {
                SimulatorFamily::Vivado => format!("-testplusarg {}={}", key, value),
                _ => format!("+{}={}", key, value),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
