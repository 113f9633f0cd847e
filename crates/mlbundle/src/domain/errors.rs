//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::model::Stage;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read `{path}` included at line {line}")]
    UnreadableInclude {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("include cycle detected: {}", format_chain(.chain))]
    IncludeCycle { chain: Vec<PathBuf> },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid build transition from {from:?} to {to:?}")]
    InvalidTransition { from: Stage, to: Stage },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
