//! End-to-end build: bundle, write, compile, report.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::app::bundle::{Bundler, BundlerOptions, InlineMode};
use crate::app::command::CommandBuilder;
use crate::app::compile::{self, Backend};
use crate::domain::errors::BuildError;
use crate::domain::model::{Bundle, BuildOutcome, CompileCommand, Stage};
use crate::infra::config::Config;
use crate::infra::fs::write_bundle;

/// Everything a single build run needs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub entry: PathBuf,
    pub bundle: PathBuf,
    pub bin_dir: PathBuf,
    pub binary: String,
    pub program: String,
    pub backend: Backend,
    pub bundler: BundlerOptions,
}

impl BuildSettings {
    pub fn from_config(config: &Config) -> Self {
        let backend = config.compiler.backend();
        Self {
            entry: config.paths.entry(),
            bundle: config.paths.bundle(),
            bin_dir: config.paths.bin_dir(),
            binary: config.compiler.binary(),
            program: config.compiler.program(),
            backend,
            bundler: BundlerOptions {
                base_dir: config.paths.base_dir(),
                inline_mode: if config.bundle.recursive() {
                    InlineMode::Recursive
                } else {
                    InlineMode::Single
                },
                library_rewrite: backend.library_rewrite(),
            },
        }
    }

    pub fn binary_path(&self) -> PathBuf {
        self.bin_dir.join(&self.binary)
    }
}

/// One build run. Consumed by [`Build::run`].
pub struct Build {
    settings: BuildSettings,
    stage: Stage,
}

impl Build {
    pub fn new(settings: BuildSettings) -> Self {
        Self {
            settings,
            stage: Stage::Start,
        }
    }

    /// Run every stage, writing status lines to `out`.
    ///
    /// Bundling and writing errors abort the run. A failing compiler is not an
    /// error: it is reported to `out` and returned as [`BuildOutcome::Failure`].
    pub fn run(mut self, out: &mut impl Write) -> Result<BuildOutcome> {
        self.advance(Stage::Bundling)?;
        writeln!(out, "Preparing .ml files...")?;
        let bundler = Bundler::new(self.settings.bundler.clone());
        let resolved = bundler.bundle_file(&self.settings.entry)?;

        self.advance(Stage::Writing)?;
        let bundle = Bundle {
            text: resolved.text,
            destination: self.settings.bundle.clone(),
        };
        write_bundle(&bundle)?;

        let command = self.command(resolved.libraries);
        self.advance(Stage::Compiling)?;
        writeln!(out, "Compiling... (`{command}`)")?;
        let result = compile::run(&command);

        if result.success() {
            self.advance(Stage::Success)?;
            let binary = self.settings.binary_path();
            writeln!(out, "Success!!")?;
            writeln!(out, "Run `{}` to play", binary.display())?;
            Ok(BuildOutcome::Success { binary })
        } else {
            self.advance(Stage::Failure)?;
            tracing::warn!(exit_code = ?result.exit_code, "compilation failed");
            writeln!(out, "Something went wrong :(")?;
            if !result.output.is_empty() {
                writeln!(out, "{}", result.output.join("\n"))?;
            }
            Ok(BuildOutcome::Failure { result })
        }
    }

    fn command(&self, libraries: Vec<String>) -> CompileCommand {
        CommandBuilder::new(
            &self.settings.program,
            self.settings.backend.flags().iter().copied(),
            &self.settings.binary_path(),
        )
        .libraries(libraries)
        .finish(&self.settings.bundle)
    }

    fn advance(&mut self, next: Stage) -> Result<(), BuildError> {
        if !self.stage.can_advance_to(next) {
            return Err(BuildError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        tracing::debug!(from = ?self.stage, to = ?next, "stage");
        self.stage = next;
        Ok(())
    }
}
