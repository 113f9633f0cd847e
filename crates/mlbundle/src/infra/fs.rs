//! Bundle persistence.

use std::fs;

use anyhow::{Context, Result};

use crate::domain::model::Bundle;

/// Write `bundle` to its destination, replacing any previous contents.
pub fn write_bundle(bundle: &Bundle) -> Result<()> {
    let path = &bundle.destination;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create bundle directory: {}", parent.display()))?;
    }
    fs::write(path, &bundle.text)
        .with_context(|| format!("failed to write bundle to {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = bundle.text.len(), "bundle written");
    Ok(())
}
