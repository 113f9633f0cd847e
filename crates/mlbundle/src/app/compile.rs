//! External compiler invocation.

use std::process::Command;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::app::bundle::ExtensionRewrite;
use crate::domain::model::{CompileCommand, CompileResult};

/// OCaml compiler backend used to build the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum Backend {
    /// `ocamlopt`, linking `.cmxa` archives.
    #[default]
    Native,
    /// `ocamlc -custom`, linking `.cma` archives.
    Bytecode,
}

impl Backend {
    pub fn default_program(&self) -> &'static str {
        match self {
            Backend::Native => "ocamlopt",
            Backend::Bytecode => "ocamlc",
        }
    }

    pub fn flags(&self) -> &'static [&'static str] {
        match self {
            Backend::Native => &[],
            Backend::Bytecode => &["-custom"],
        }
    }

    /// `#load` directives name bytecode archives; native builds need the `.cmxa` twin.
    pub fn library_rewrite(&self) -> Option<ExtensionRewrite> {
        match self {
            Backend::Native => Some(ExtensionRewrite::new(".cma", ".cmxa")),
            Backend::Bytecode => None,
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = BackendParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "native" | "ocamlopt" => Ok(Backend::Native),
            "bytecode" | "byte" | "ocamlc" => Ok(Backend::Bytecode),
            other => Err(BackendParseError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BackendParseError {
    #[error("unknown compiler backend '{0}'")]
    UnknownBackend(String),
}

/// Run `command` to completion and capture its output.
///
/// Stdout lines come first, then stderr lines. A program that cannot be
/// started yields a failed result carrying the launch error as its only line.
pub fn run(command: &CompileCommand) -> CompileResult {
    tracing::info!(program = command.program(), args = ?command.args(), "invoking compiler");

    let output = match Command::new(command.program()).args(command.args()).output() {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(error = %err, program = command.program(), "compiler failed to start");
            return CompileResult {
                exit_code: None,
                output: vec![format!("failed to launch `{}`: {err}", command.program())],
            };
        }
    };

    let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_owned)
        .collect();
    lines.extend(
        String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_owned),
    );

    tracing::debug!(status = %output.status, lines = lines.len(), "compiler exited");
    CompileResult {
        exit_code: output.status.code(),
        output: lines,
    }
}
