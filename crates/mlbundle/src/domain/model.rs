//! Domain models for directives, bundles, and compiler invocations.

use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

/// What a directive asks the bundler to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `#use "file.ml";;` — splice the file's text in place.
    Inline,
    /// `#load "lib.cma";;` — drop the text, pass the library to the compiler.
    Link,
}

impl DirectiveKind {
    /// Map a directive keyword to its kind, ignoring ASCII case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("use") {
            Some(DirectiveKind::Inline)
        } else if keyword.eq_ignore_ascii_case("load") {
            Some(DirectiveKind::Link)
        } else {
            None
        }
    }
}

/// A directive recognised in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub path: String,
    /// Byte range of the whole directive, `#` through the trailing `;;`.
    pub span: Range<usize>,
    /// 1-based line of the directive in the scanned text.
    pub line: usize,
}

/// Bundled source bytes and where they are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub text: Vec<u8>,
    pub destination: PathBuf,
}

/// Ordered argv handed to the external compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    tokens: Vec<String>,
}

impl CompileCommand {
    pub(crate) fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Executable name; empty when the command has no tokens.
    pub fn program(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }
}

impl fmt::Display for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, token) in self.tokens.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                write!(f, "\"{token}\"")?;
            } else {
                f.write_str(token)?;
            }
        }
        Ok(())
    }
}

/// Exit status and captured output of one compiler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    /// `None` when the process was killed by a signal or never started.
    pub exit_code: Option<i32>,
    pub output: Vec<String>,
}

impl CompileResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Build lifecycle. Each stage is entered at most once and only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Bundling,
    Writing,
    Compiling,
    Success,
    Failure,
}

impl Stage {
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Start, Stage::Bundling)
                | (Stage::Bundling, Stage::Writing)
                | (Stage::Writing, Stage::Compiling)
                | (Stage::Compiling, Stage::Success)
                | (Stage::Compiling, Stage::Failure)
        )
    }
}

/// Terminal result of a build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success { binary: PathBuf },
    Failure { result: CompileResult },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success { .. })
    }
}
