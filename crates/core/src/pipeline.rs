// SigWired - Architectural Compliance Run Orchestrator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Test pipeline builder.
//!
//! Turns one test descriptor plus the shared DUT adapter into the ordered
//! command sequence for that test: compile, binary extraction, disassembly,
//! optional symbol extraction, simulate. Artifact names are fixed and
//! relative; the registry's leading `cd` makes them resolve inside the
//! test's work directory.

use crate::adapter::DutAdapter;
use crate::command::{CommandTemplate, Vars};
use crate::ConfigError;
use anyhow::Result;
use sigwired_config::{DutConfig, TestDescriptor};
use std::path::PathBuf;

const ELF: &str = "dut.elf";
const BIN: &str = "dut.bin";
const DIS: &str = "dut.disass";
const SYM: &str = "dut.symbols";
const LOG: &str = "dut.log";

/// Signature-boundary symbols some simulators need as launch-time arguments.
const SIGNATURE_SYMBOLS: [&str; 4] = ["begin_signature", "end_signature", "tohost", "fromhost"];

/// Signature file name contract consumed by the host framework; must be
/// reproduced exactly.
pub fn signature_file_name(dut: &str) -> String {
    format!("{}.signature", dut)
}

/// Ordered, fully rendered command sequence for one test. Consumed by the
/// target registry immediately after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPipeline {
    pub test_name: String,
    pub work_dir: PathBuf,
    pub commands: Vec<String>,
}

pub struct PipelineBuilder<'a> {
    adapter: &'a DutAdapter,
    config: &'a DutConfig,
    run_work_dir: PathBuf,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(
        adapter: &'a DutAdapter,
        config: &'a DutConfig,
        run_work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            adapter,
            config,
            run_work_dir: run_work_dir.into(),
        }
    }

    /// Build the pipeline for one test. Stage order is fixed; the simulate
    /// stage degrades to a no-op placeholder when `target_run` is disabled,
    /// preserving the stage count.
    pub fn build(&self, test: &TestDescriptor) -> Result<CommandPipeline> {
        let sig = signature_file_name(&self.adapter.dut);

        let vars = Vars::new()
            .set("test_path", test.test_path.display().to_string())
            .set("work_dir", test.work_dir.display().to_string())
            .set("env_dir", self.config.env_dir.display().to_string())
            .set("archtest_env", self.config.archtest_env.display().to_string())
            .set("elf", ELF)
            .set("bin", BIN)
            .set("dis", DIS)
            .set("sym", SYM)
            .set("log", LOG)
            .set("sig", sig.as_str())
            .set("march", test.isa.to_lowercase())
            .set("abi", self.adapter.xlen.abi())
            .set("isa", self.adapter.isa.as_str());

        let mut compile = CommandTemplate::new(self.adapter.gcc.as_str())
            .arg("-mabi={abi}")
            .arg("-march={march}")
            .args([
                "-static",
                "-mcmodel=medany",
                "-fvisibility=hidden",
                "-nostdlib",
                "-nostartfiles",
                "-g",
            ])
            .arg("-T {env_dir}/link.ld")
            .arg("-I {env_dir}")
            .arg("-I {archtest_env}");
        for macro_name in &test.macros {
            compile = compile.arg(format!("-D{}", macro_name));
        }
        let compile = compile.arg("{test_path}").arg("-o {elf}");

        let objcopy = CommandTemplate::new(self.adapter.objcopy.as_str())
            .arg("-O binary")
            .arg("{elf}")
            .arg("{bin}");

        let objdump = CommandTemplate::new(self.adapter.objdump.as_str())
            .arg("-M no-aliases")
            .arg("-M numeric")
            .arg("-D {elf}")
            .stdout_to("{dis}");

        let mut commands = vec![
            compile.render(&vars)?,
            objcopy.render(&vars)?,
            objdump.render(&vars)?,
        ];

        if self.adapter.extract_symbols {
            let nm = CommandTemplate::new(self.adapter.nm.as_str())
                .arg("{elf}")
                .stdout_to("{sym}");
            commands.push(nm.render(&vars)?);
        }

        let simulate = if self.config.target_run {
            self.simulate_template(test, &sig)?
        } else {
            CommandTemplate::new("echo").arg_quoted("NO RUN")
        };
        commands.push(simulate.render(&vars)?);

        tracing::debug!(
            "Built pipeline for '{}': {} stages",
            test.name,
            commands.len()
        );

        Ok(CommandPipeline {
            test_name: test.name.clone(),
            work_dir: test.work_dir.clone(),
            commands,
        })
    }

    fn simulate_template(&self, test: &TestDescriptor, sig: &str) -> Result<CommandTemplate> {
        let Some(sim_subdir) = self.adapter.sim_subdir() else {
            // Directly invoked DUT executable (ISS family).
            let Some(exe) = &self.adapter.dut_executable else {
                return Err(ConfigError::MissingField("dut_executable").into());
            };
            return Ok(CommandTemplate::new(exe.display().to_string())
                .arg("--isa={isa}")
                .arg("--signature={sig}")
                .arg("{elf}")
                .stdout_to("{log}")
                .merge_stderr());
        };

        let sim_dir = self
            .config
            .sim_dir
            .clone()
            .unwrap_or_else(|| self.run_work_dir.join("../../sim").join(sim_subdir));

        let mut defines: Vec<(&str, Option<&str>)> = Vec::new();
        if self.config.debug {
            defines.push(("TRACE", None));
        }

        let work_dir = test.work_dir.display();
        let mut plusargs: Vec<(&str, String)> = vec![
            ("TEST_DIR", format!("{}/", work_dir)),
            ("firmware", format!("{}/{}", work_dir, BIN)),
            ("signature", format!("{}/{}", work_dir, sig)),
        ];
        if self.adapter.extract_symbols {
            // Addresses are resolved at recipe run time, after the nm stage.
            for symbol in SIGNATURE_SYMBOLS {
                plusargs.push((
                    symbol,
                    format!("`grep -w {} {} | cut -c 1-8`", symbol, SYM),
                ));
            }
        }

        Ok(
            CommandTemplate::new(format!("DUT={} {}", self.adapter.dut, self.adapter.make))
                .arg(format!("-C {}", sim_dir.display()))
                .arg("-f Makefile")
                .arg(format!(
                    "RISCOF_DEFINES=\"{}\"",
                    self.adapter.format_defines(&defines)
                ))
                .arg(format!(
                    "RISCOF_PLUSARGS=\"{}\"",
                    self.adapter.format_plusargs(&plusargs)
                )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::DutAdapter;
    use sigwired_config::{HartSpec, IsaSpec, SimulatorFamily, TestDescriptor};

    fn test_config(simulator: SimulatorFamily) -> DutConfig {
        DutConfig {
            dut: "mouse".to_string(),
            env_dir: "/plugins/mouse/env".into(),
            archtest_env: "/suite/env".into(),
            jobs: 2,
            target_run: true,
            simulator,
            make: "make".to_string(),
            toolchain_prefix: "riscv{xlen}-unknown-elf-".to_string(),
            dut_executable: (simulator == SimulatorFamily::Iss).then(|| "/opt/dut/iss".into()),
            sim_dir: None,
            extract_symbols: false,
            debug: false,
        }
    }

    fn test_ispec() -> IsaSpec {
        IsaSpec {
            hart0: HartSpec {
                isa: "RV64IMC".to_string(),
                supported_xlen: vec![64],
            },
        }
    }

    fn add_01() -> TestDescriptor {
        TestDescriptor {
            name: "add-01".to_string(),
            test_path: "/suite/add-01.S".into(),
            work_dir: "/work/add-01".into(),
            macros: vec!["RV64_M".to_string(), "RV64_C".to_string()],
            isa: "RV64IMC".to_string(),
            coverage_labels: vec![],
        }
    }

    fn build(config: &DutConfig, test: &TestDescriptor) -> CommandPipeline {
        let adapter = DutAdapter::configure(config, &test_ispec()).unwrap();
        PipelineBuilder::new(&adapter, config, "/run/mouse")
            .build(test)
            .unwrap()
    }

    #[test]
    fn test_compile_flag_ordering() {
        let config = test_config(SimulatorFamily::Verilator);
        let pipeline = build(&config, &add_01());
        let compile = &pipeline.commands[0];

        assert!(compile.starts_with("riscv64-unknown-elf-gcc "));
        let mabi = compile.find("-mabi=lp64").unwrap();
        let march = compile.find("-march=rv64imc").unwrap();
        let macro_m = compile.find("-DRV64_M").unwrap();
        let macro_c = compile.find("-DRV64_C").unwrap();
        assert!(mabi < march && march < macro_m && macro_m < macro_c);
        assert!(compile.ends_with("/suite/add-01.S -o dut.elf"));
        assert!(compile.contains("-I /plugins/mouse/env"));
        assert!(compile.contains("-I /suite/env"));
        assert!(compile.contains("-T /plugins/mouse/env/link.ld"));
    }

    #[test]
    fn test_empty_macro_list_emits_no_defines() {
        let config = test_config(SimulatorFamily::Verilator);
        let mut test = add_01();
        test.macros.clear();
        let pipeline = build(&config, &test);
        assert!(!pipeline.commands[0].contains("-D"));
    }

    #[test]
    fn test_isa_casing_is_normalized() {
        let config = test_config(SimulatorFamily::Verilator);
        let mut test = add_01();
        test.isa = "Rv64ImC".to_string();
        let pipeline = build(&config, &test);
        assert!(pipeline.commands[0].contains("-march=rv64imc"));
    }

    #[test]
    fn test_fixed_stage_order() {
        let config = test_config(SimulatorFamily::Verilator);
        let pipeline = build(&config, &add_01());
        assert_eq!(pipeline.commands.len(), 4);
        assert_eq!(
            pipeline.commands[1],
            "riscv64-unknown-elf-objcopy -O binary dut.elf dut.bin"
        );
        assert_eq!(
            pipeline.commands[2],
            "riscv64-unknown-elf-objdump -M no-aliases -M numeric -D dut.elf > dut.disass"
        );
    }

    #[test]
    fn test_hdl_simulate_stage() {
        let config = test_config(SimulatorFamily::Verilator);
        let pipeline = build(&config, &add_01());
        let simulate = pipeline.commands.last().unwrap();
        assert!(simulate.starts_with("DUT=mouse make -C "));
        assert!(simulate.contains("/run/mouse/../../sim/verilator"));
        assert!(simulate.contains("-f Makefile"));
        assert!(simulate.contains("RISCOF_DEFINES=\"\""));
        assert!(simulate.contains("+TEST_DIR=/work/add-01/"));
        assert!(simulate.contains("+firmware=/work/add-01/dut.bin"));
        assert!(simulate.contains("+signature=/work/add-01/mouse.signature"));
    }

    #[test]
    fn test_symbol_extraction_stage_and_plusargs() {
        let mut config = test_config(SimulatorFamily::Questa);
        config.extract_symbols = true;
        let pipeline = build(&config, &add_01());
        assert_eq!(pipeline.commands.len(), 5);
        assert_eq!(
            pipeline.commands[3],
            "riscv64-unknown-elf-nm dut.elf > dut.symbols"
        );
        let simulate = pipeline.commands.last().unwrap();
        assert!(
            simulate.contains("+begin_signature=`grep -w begin_signature dut.symbols | cut -c 1-8`")
        );
        assert!(simulate.contains("+tohost=`grep -w tohost dut.symbols | cut -c 1-8`"));
    }

    #[test]
    fn test_vivado_uses_testplusarg_convention() {
        let config = test_config(SimulatorFamily::Vivado);
        let pipeline = build(&config, &add_01());
        let simulate = pipeline.commands.last().unwrap();
        assert!(simulate.contains("-testplusarg signature=/work/add-01/mouse.signature"));
        assert!(!simulate.contains("+signature="));
    }

    #[test]
    fn test_debug_adds_trace_define() {
        let mut config = test_config(SimulatorFamily::Verilator);
        config.debug = true;
        let pipeline = build(&config, &add_01());
        assert!(pipeline.commands.last().unwrap().contains("RISCOF_DEFINES=\"-D TRACE\""));
    }

    #[test]
    fn test_iss_simulate_stage() {
        let config = test_config(SimulatorFamily::Iss);
        let pipeline = build(&config, &add_01());
        assert_eq!(
            pipeline.commands.last().unwrap(),
            "/opt/dut/iss --isa=rv64imc --signature=mouse.signature dut.elf > dut.log 2>&1"
        );
    }

    #[test]
    fn test_disabled_execution_degrades_to_placeholder() {
        let mut config = test_config(SimulatorFamily::Verilator);
        config.target_run = false;
        let pipeline = build(&config, &add_01());
        assert_eq!(pipeline.commands.len(), 4);
        assert_eq!(pipeline.commands.last().unwrap(), "echo \"NO RUN\"");
    }

    #[test]
    fn test_build_is_idempotent() {
        let config = test_config(SimulatorFamily::Verilator);
        let first = build(&config, &add_01());
        let second = build(&config, &add_01());
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_sim_dir_override() {
        let mut config = test_config(SimulatorFamily::Verilator);
        config.sim_dir = Some("/opt/sim/tb".into());
        let pipeline = build(&config, &add_01());
        assert!(pipeline.commands.last().unwrap().contains("-C /opt/sim/tb"));
    }
}
