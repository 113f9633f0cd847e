//! Directive resolution: turns an entry file into one bundled source text.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::directives;
use crate::domain::errors::BundleError;
use crate::domain::model::DirectiveKind;

/// How nested `#use` directives inside inlined files are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineMode {
    /// Inline each file once; directives in inlined text are left as written.
    Single,
    /// Re-scan inlined text, rejecting include cycles.
    Recursive,
}

/// Rewrites a library suffix, e.g. bytecode `.cma` to native `.cmxa`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRewrite {
    pub from: String,
    pub to: String,
}

impl ExtensionRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Paths without the `from` suffix pass through untouched.
    pub fn apply(&self, path: &str) -> String {
        match path.strip_suffix(self.from.as_str()) {
            Some(stem) => format!("{stem}{}", self.to),
            None => path.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BundlerOptions {
    /// Directory relative `#use` paths are resolved against.
    pub base_dir: PathBuf,
    pub inline_mode: InlineMode,
    pub library_rewrite: Option<ExtensionRewrite>,
}

impl Default for BundlerOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            inline_mode: InlineMode::Single,
            library_rewrite: None,
        }
    }
}

/// Bundled bytes and the libraries collected from `#load` directives, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub text: Vec<u8>,
    pub libraries: Vec<String>,
}

struct Edit {
    span: Range<usize>,
    replacement: Vec<u8>,
}

pub struct Bundler {
    options: BundlerOptions,
}

impl Bundler {
    pub fn new(options: BundlerOptions) -> Self {
        Self { options }
    }

    /// Read `entry` and resolve its directives.
    pub fn bundle_file(&self, entry: &Path) -> Result<Resolved> {
        let source = fs::read(entry)
            .with_context(|| format!("failed to read entry file {}", entry.display()))?;
        let mut stack = vec![canonical(entry)];
        self.finish(self.resolve(&source, &mut stack)?)
    }

    /// Resolve directives in already loaded source.
    pub fn bundle_source(&self, source: impl AsRef<[u8]>) -> Result<Resolved> {
        let mut stack = Vec::new();
        self.finish(self.resolve(source.as_ref(), &mut stack)?)
    }

    fn finish(&self, mut resolved: Resolved) -> Result<Resolved> {
        if self.options.inline_mode == InlineMode::Recursive {
            let mut seen = std::collections::HashSet::new();
            resolved.libraries.retain(|library| seen.insert(library.clone()));
        }
        tracing::debug!(
            bytes = resolved.text.len(),
            libraries = resolved.libraries.len(),
            "bundle resolved"
        );
        Ok(resolved)
    }

    fn resolve(&self, source: &[u8], stack: &mut Vec<PathBuf>) -> Result<Resolved> {
        let mut edits = Vec::new();
        let mut libraries = Vec::new();

        for directive in directives::scan(source) {
            match directive.kind {
                DirectiveKind::Inline => {
                    let path = self.options.base_dir.join(&directive.path);
                    let contents =
                        fs::read(&path).map_err(|source| BundleError::UnreadableInclude {
                            path: path.clone(),
                            line: directive.line,
                            source,
                        })?;
                    tracing::debug!(path = %path.display(), line = directive.line, "inlining");

                    let replacement = match self.options.inline_mode {
                        InlineMode::Single => contents,
                        InlineMode::Recursive => {
                            let key = canonical(&path);
                            if stack.contains(&key) {
                                let mut chain = stack.clone();
                                chain.push(key);
                                return Err(BundleError::IncludeCycle { chain }.into());
                            }
                            stack.push(key);
                            let nested = self.resolve(&contents, stack)?;
                            stack.pop();
                            libraries.extend(nested.libraries);
                            nested.text
                        }
                    };
                    edits.push(Edit {
                        span: directive.span,
                        replacement,
                    });
                }
                DirectiveKind::Link => {
                    let library = match &self.options.library_rewrite {
                        Some(rewrite) => rewrite.apply(&directive.path),
                        None => directive.path.clone(),
                    };
                    tracing::debug!(%library, line = directive.line, "linking");
                    libraries.push(library);
                    edits.push(Edit {
                        span: directive.span,
                        replacement: Vec::new(),
                    });
                }
            }
        }

        Ok(Resolved {
            text: apply_edits(source, &edits),
            libraries,
        })
    }
}

// Edits come from a left-to-right scan, so spans are ordered and disjoint.
fn apply_edits(source: &[u8], edits: &[Edit]) -> Vec<u8> {
    let mut output = Vec::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        output.extend_from_slice(&source[cursor..edit.span.start]);
        output.extend_from_slice(&edit.replacement);
        cursor = edit.span.end;
    }
    output.extend_from_slice(&source[cursor..]);
    output
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
