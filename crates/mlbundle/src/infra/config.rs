//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::compile::Backend;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = "mlbundle.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub compiler: Compiler,
    #[serde(default)]
    pub bundle: Bundle,
}

/// Input, output, and lookup locations. Relative paths are taken from the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Paths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

impl Paths {
    pub fn entry(&self) -> PathBuf {
        self.entry.clone().unwrap_or_else(|| "./main.ml".into())
    }

    pub fn bundle(&self) -> PathBuf {
        self.bundle.clone().unwrap_or_else(|| "../bin/bcotp.ml".into())
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.bin_dir.clone().unwrap_or_else(|| "../bin".into())
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(|| ".".into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Compiler {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    /// Overrides the backend's default executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
}

impl Compiler {
    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn program(&self) -> String {
        self.program
            .clone()
            .unwrap_or_else(|| self.backend().default_program().to_owned())
    }

    pub fn binary(&self) -> String {
        self.binary
            .clone()
            .unwrap_or_else(|| "BigCitiesOnTinyPlanets.exe".to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
}

impl Bundle {
    pub fn recursive(&self) -> bool {
        self.recursive.unwrap_or(false)
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    compiler: Option<String>,
    backend: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            compiler: env::var("MLBUNDLE_COMPILER").ok(),
            backend: env::var("MLBUNDLE_BACKEND").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(compiler: &str, backend: &str) -> Self {
        Self {
            compiler: Some(compiler.to_owned()),
            backend: Some(backend.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user config, workspace config, and env overrides.
    ///
    /// `explicit` replaces the workspace layer and must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Some(PathBuf::from(DEFAULT_WORKSPACE_CONFIG_PATH)),
        };
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data).with_context(|| format!("in config file {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }

    fn merge(self, other: Self) -> Self {
        Self {
            paths: merge_paths(self.paths, other.paths),
            compiler: merge_compiler(self.compiler, other.compiler),
            bundle: Bundle {
                recursive: other.bundle.recursive.or(self.bundle.recursive),
            },
        }
    }
}

fn merge_paths(base: Paths, overlay: Paths) -> Paths {
    Paths {
        entry: overlay.entry.or(base.entry),
        bundle: overlay.bundle.or(base.bundle),
        bin_dir: overlay.bin_dir.or(base.bin_dir),
        base_dir: overlay.base_dir.or(base.base_dir),
    }
}

fn merge_compiler(mut base: Compiler, overlay: Compiler) -> Compiler {
    // A new backend invalidates a program inherited for the old one.
    if let Some(backend) = overlay.backend {
        if base.backend != Some(backend) && overlay.program.is_none() {
            base.program = None;
        }
        base.backend = Some(backend);
    }
    if let Some(program) = overlay.program {
        base.program = Some(program);
    }
    if let Some(binary) = overlay.binary {
        base.binary = Some(binary);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("mlbundle/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(backend) = env.backend {
        let backend: Backend = backend
            .parse()
            .context("invalid MLBUNDLE_BACKEND value")?;
        config.compiler = merge_compiler(
            config.compiler,
            Compiler {
                backend: Some(backend),
                ..Compiler::default()
            },
        );
    }
    if let Some(compiler) = env.compiler {
        config.compiler.program = Some(compiler);
    }
    Ok(config)
}
