// SigWired - Architectural Compliance Run Orchestrator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Command template renderer.
//!
//! A command is an ordered list of argument pieces rather than a free-form
//! format string: flag order is preserved exactly as declared, and every
//! `{placeholder}` token must resolve or rendering fails. Rendering is a pure
//! function of the template and the variable set.

use crate::RenderError;
use std::collections::HashMap;

/// Placeholder values available to a render call.
#[derive(Debug, Clone, Default)]
pub struct Vars(HashMap<String, String>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        let _ = self.0.insert(key.to_string(), value.into());
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Substitute every `{name}` token in `template` from `vars`.
///
/// Unknown tokens are hard errors; an unresolved token is never passed
/// through to the shell.
pub fn substitute(template: &str, vars: &Vars) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(RenderError::UnterminatedPlaceholder(after.to_string()));
        };
        let name = &after[..close];
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => return Err(RenderError::UnresolvedPlaceholder(name.to_string())),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[derive(Debug, Clone)]
enum Arg {
    /// Emitted verbatim after substitution; the builder controls quoting.
    Raw(String),
    /// Wrapped in double quotes after substitution.
    Quoted(String),
}

/// One shell command: program, ordered arguments, optional stdout redirect.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    program: String,
    args: Vec<Arg>,
    stdout: Option<String>,
    merge_stderr: bool,
}

impl CommandTemplate {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout: None,
            merge_stderr: false,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Raw(arg.into()));
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.args.push(Arg::Raw(arg.into()));
        }
        self
    }

    #[must_use]
    pub fn arg_quoted(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Quoted(arg.into()));
        self
    }

    /// Redirect stdout to `path` (`> path`).
    #[must_use]
    pub fn stdout_to(mut self, path: impl Into<String>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    /// Fold stderr into the stdout redirect (`2>&1`).
    #[must_use]
    pub fn merge_stderr(mut self) -> Self {
        self.merge_stderr = true;
        self
    }

    pub fn render(&self, vars: &Vars) -> Result<String, RenderError> {
        let mut out = substitute(&self.program, vars)?;
        for arg in &self.args {
            out.push(' ');
            match arg {
                Arg::Raw(a) => out.push_str(&substitute(a, vars)?),
                Arg::Quoted(a) => {
                    out.push('"');
                    out.push_str(&substitute(a, vars)?);
                    out.push('"');
                }
            }
        }
        if let Some(path) = &self.stdout {
            out.push_str(" > ");
            out.push_str(&substitute(path, vars)?);
        }
        if self.merge_stderr {
            out.push_str(" 2>&1");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_resolves_tokens() {
        let vars = Vars::new().set("xlen", "64");
        assert_eq!(
            substitute("riscv{xlen}-unknown-elf-gcc", &vars).unwrap(),
            "riscv64-unknown-elf-gcc"
        );
    }

    #[test]
    fn test_substitute_rejects_unknown_token() {
        let vars = Vars::new().set("xlen", "64");
        let err = substitute("-march={march}", &vars).unwrap_err();
        assert_eq!(err, RenderError::UnresolvedPlaceholder("march".to_string()));
    }

    #[test]
    fn test_substitute_rejects_unterminated_token() {
        let err = substitute("-I {env_dir", &Vars::new()).unwrap_err();
        assert!(matches!(err, RenderError::UnterminatedPlaceholder(_)));
    }

    #[test]
    fn test_render_preserves_argument_order() {
        let vars = Vars::new().set("elf", "dut.elf").set("bin", "dut.bin");
        let cmd = CommandTemplate::new("objcopy")
            .arg("-O binary")
            .arg("{elf}")
            .arg("{bin}")
            .render(&vars)
            .unwrap();
        assert_eq!(cmd, "objcopy -O binary dut.elf dut.bin");
    }

    #[test]
    fn test_render_redirect_and_quoting() {
        let vars = Vars::new().set("dis", "dut.disass");
        let cmd = CommandTemplate::new("echo")
            .arg_quoted("NO RUN")
            .stdout_to("{dis}")
            .merge_stderr()
            .render(&vars)
            .unwrap();
        assert_eq!(cmd, "echo \"NO RUN\" > dut.disass 2>&1");
    }

    #[test]
    fn test_render_is_idempotent() {
        let vars = Vars::new().set("elf", "dut.elf");
        let template = CommandTemplate::new("nm").arg("{elf}").stdout_to("dut.symbols");
        let first = template.render(&vars).unwrap();
        let second = template.render(&vars).unwrap();
        assert_eq!(first, second);
    }
}
