// SigWired - Architectural Compliance Run Orchestrator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

fn default_jobs() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_make() -> String {
    "make".to_string()
}

fn default_toolchain_prefix() -> String {
    "riscv{xlen}-unknown-elf-".to_string()
}

/// Integer register width of the DUT. Only 32 and 64 are representable;
/// anything else is rejected while loading the ISA specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Xlen {
    Rv32,
    Rv64,
}

impl Xlen {
    pub const fn bits(self) -> u32 {
        match self {
            Self::Rv32 => 32,
            Self::Rv64 => 64,
        }
    }

    /// GCC calling-convention selector matching this register width.
    pub const fn abi(self) -> &'static str {
        match self {
            Self::Rv32 => "ilp32",
            Self::Rv64 => "lp64",
        }
    }
}

impl fmt::Display for Xlen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HartSpec {
    /// Architecture string as written in the riscv-config YAML, e.g. "RV64IMC".
    #[serde(rename = "ISA")]
    pub isa: String,
    pub supported_xlen: Vec<u32>,
}

/// The riscv-config based ISA specification. Only the `hart0` node is
/// consumed; the rest of the document is ignored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IsaSpec {
    pub hart0: HartSpec,
}

impl IsaSpec {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read ISA spec at {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse ISA specification YAML")
    }

    /// Derive the register width. 64 wins when both widths are listed; a spec
    /// listing neither 32 nor 64 (or any other width at all) is a
    /// configuration error, never a silent default.
    pub fn xlen(&self) -> Result<Xlen> {
        for &width in &self.hart0.supported_xlen {
            if width != 32 && width != 64 {
                bail!("Unsupported register width {}: expected 32 or 64", width);
            }
        }
        if self.hart0.supported_xlen.contains(&64) {
            Ok(Xlen::Rv64)
        } else if self.hart0.supported_xlen.contains(&32) {
            Ok(Xlen::Rv32)
        } else {
            bail!("ISA specification 'supported_xlen' lists neither 32 nor 64");
        }
    }

    /// Build the DUT-level ISA string: `rv<width>` followed by the ordered
    /// subset of {I, M, A, F, D, C} present in the spec's `ISA` field.
    pub fn isa_string(&self, xlen: Xlen) -> String {
        let mut isa = format!("rv{}", xlen.bits());
        let upper = self.hart0.isa.to_uppercase();
        for ext in ['I', 'M', 'A', 'F', 'D', 'C'] {
            if upper.contains(ext) {
                isa.push(ext.to_ascii_lowercase());
            }
        }
        isa
    }
}

/// Simulator invocation convention the DUT is driven through.
///
/// The HDL families (`questa`, `verilator`, `vivado`) are launched through a
/// per-simulator Makefile; `iss` invokes the DUT executable directly.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimulatorFamily {
    Questa,
    Verilator,
    Vivado,
    Iss,
}

/// Per-run DUT configuration, loaded once and shared by reference across all
/// pipeline builds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DutConfig {
    /// DUT name; artifact names (`<dut>.signature`, `Makefile.<dut>`) derive from it.
    pub dut: String,
    /// Directory with the DUT's link script and environment headers.
    pub env_dir: PathBuf,
    /// Architecture test-suite environment directory (include path).
    pub archtest_env: PathBuf,
    /// Parallelism degree handed to the build tool.
    #[serde(default = "default_jobs")]
    pub jobs: u32,
    /// When false, every simulate stage degrades to a no-op placeholder.
    #[serde(default = "default_true")]
    pub target_run: bool,
    pub simulator: SimulatorFamily,
    #[serde(default = "default_make")]
    pub make: String,
    /// Toolchain name template; `{xlen}` expands to the register width.
    #[serde(default = "default_toolchain_prefix")]
    pub toolchain_prefix: String,
    /// DUT executable, required for the `iss` family.
    #[serde(default)]
    pub dut_executable: Option<PathBuf>,
    /// Directory holding the simulator Makefiles. Defaults to
    /// `<work-dir>/../../sim/<family>` when unset.
    #[serde(default)]
    pub sim_dir: Option<PathBuf>,
    /// Emit an nm stage and pass signature-boundary symbol addresses to the
    /// simulator as plusargs.
    #[serde(default)]
    pub extract_symbols: bool,
    /// Forward a TRACE define to the simulator.
    #[serde(default)]
    pub debug: bool,
}

impl DutConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open DUT config at {:?}", path.as_ref()))?;
        let config: Self = serde_yaml::from_reader(f).context("Failed to parse DUT config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dut.trim().is_empty() {
            bail!("DUT name cannot be empty");
        }
        if self.jobs == 0 {
            bail!("'jobs' must be at least 1");
        }
        if self.toolchain_prefix.trim().is_empty() {
            bail!("'toolchain_prefix' cannot be empty");
        }
        if self.simulator == SimulatorFamily::Iss && self.dut_executable.is_none() {
            bail!("Simulator family 'iss' requires 'dut_executable'");
        }
        Ok(())
    }
}

/// One entry of the host framework's test list. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescriptor {
    pub name: String,
    pub test_path: PathBuf,
    pub work_dir: PathBuf,
    /// Preprocessor macros required by the test, order-preserving.
    pub macros: Vec<String>,
    /// Per-test march string, any casing.
    pub isa: String,
    pub coverage_labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TestEntry {
    test_path: PathBuf,
    work_dir: PathBuf,
    #[serde(default)]
    macros: Vec<String>,
    isa: String,
    #[serde(default)]
    coverage_labels: Vec<String>,
}

/// Load the test list: a YAML mapping of test name to descriptor. Document
/// order is preserved; it defines registration order downstream.
pub fn load_test_list<P: AsRef<Path>>(path: P) -> Result<Vec<TestDescriptor>> {
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read test list at {:?}", path.as_ref()))?;
    test_list_from_yaml(&contents)
}

pub fn test_list_from_yaml(yaml: &str) -> Result<Vec<TestDescriptor>> {
    let mapping: serde_yaml::Mapping =
        serde_yaml::from_str(yaml).context("Failed to parse test list YAML")?;
    let mut tests = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let name = key
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("Test list keys must be strings"))?;
        let entry: TestEntry = serde_yaml::from_value(value)
            .with_context(|| format!("Invalid test entry '{}'", name))?;
        tests.push(TestDescriptor {
            name,
            test_path: entry.test_path,
            work_dir: entry.work_dir,
            macros: entry.macros,
            isa: entry.isa,
            coverage_labels: entry.coverage_labels,
        });
    }
    Ok(tests)
}
