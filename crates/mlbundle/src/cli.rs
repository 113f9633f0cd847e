//! Command line surface.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::app::build::{Build, BuildSettings};
use crate::app::compile::Backend;
use crate::domain::model::BuildOutcome;
use crate::infra::config::Config;

/// Bundle an OCaml program's `#use` files into one source and compile it.
///
/// `#use "file.ml";;` directives are replaced by the file's text and
/// `#load "lib.cma";;` directives become compiler library arguments.
#[derive(Debug, Parser)]
#[command(name = "mlbundle", author, version, long_about = None)]
pub struct Cli {
    /// Entry source file.
    #[arg(long, value_name = "FILE")]
    pub entry: Option<PathBuf>,

    /// Where the bundled source is written.
    #[arg(long, value_name = "FILE")]
    pub bundle: Option<PathBuf>,

    /// Directory receiving the compiled binary.
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// File name of the compiled binary.
    #[arg(long, value_name = "NAME")]
    pub binary: Option<String>,

    /// Compiler executable, overriding the backend default.
    #[arg(long, value_name = "PROGRAM")]
    pub compiler: Option<String>,

    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Resolve `#use` directives inside inlined files too.
    #[arg(long)]
    pub recursive: bool,

    /// Directory `#use` paths are relative to.
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Config file used instead of ./mlbundle.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print shell completions and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Print the effective configuration and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Layer flags on top of loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(entry) = &self.entry {
            config.paths.entry = Some(entry.clone());
        }
        if let Some(bundle) = &self.bundle {
            config.paths.bundle = Some(bundle.clone());
        }
        if let Some(bin_dir) = &self.bin_dir {
            config.paths.bin_dir = Some(bin_dir.clone());
        }
        if let Some(base_dir) = &self.base_dir {
            config.paths.base_dir = Some(base_dir.clone());
        }
        if let Some(backend) = self.backend {
            if config.compiler.backend != Some(backend) {
                config.compiler.program = None;
            }
            config.compiler.backend = Some(backend);
        }
        if let Some(compiler) = &self.compiler {
            config.compiler.program = Some(compiler.clone());
        }
        if let Some(binary) = &self.binary {
            config.compiler.binary = Some(binary.clone());
        }
        if self.recursive {
            config.bundle.recursive = Some(true);
        }
    }
}

/// Execute the parsed command line. Returns `None` when no build was run.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<Option<BuildOutcome>> {
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "mlbundle", out);
        return Ok(None);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    if cli.print_config {
        write!(out, "{}", config.to_toml()?)?;
        return Ok(None);
    }

    let settings = BuildSettings::from_config(&config);
    tracing::info!(entry = %settings.entry.display(), bundle = %settings.bundle.display(), "starting build");
    Build::new(settings).run(out).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "mlbundle",
            "--entry",
            "src/main.ml",
            "--backend",
            "bytecode",
            "--binary",
            "game",
            "--recursive",
        ]);
        let mut config = Config::default();
        config.compiler.program = Some("ocamlfind".into());
        cli.apply(&mut config);

        let settings = BuildSettings::from_config(&config);
        assert_eq!(settings.entry, PathBuf::from("src/main.ml"));
        assert_eq!(settings.backend, Backend::Bytecode);
        assert_eq!(settings.program, "ocamlc");
        assert_eq!(settings.binary, "game");
        assert!(config.bundle.recursive());
    }

    #[test]
    fn explicit_compiler_wins_over_backend_default() {
        let cli = Cli::parse_from(["mlbundle", "--backend", "bytecode", "--compiler", "my-ocamlc"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.compiler.program(), "my-ocamlc");
    }
}
