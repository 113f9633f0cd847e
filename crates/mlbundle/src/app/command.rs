//! Compiler command line construction.

use std::path::Path;

use crate::domain::model::CompileCommand;

/// Accumulates compiler arguments in invocation order.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    tokens: Vec<String>,
}

impl CommandBuilder {
    /// Start with `<program> [flags..] -o <binary>`.
    pub fn new<I, S>(program: &str, flags: I, binary: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = vec![program.to_owned()];
        tokens.extend(flags.into_iter().map(Into::into));
        tokens.push("-o".to_owned());
        tokens.push(binary.display().to_string());
        Self { tokens }
    }

    pub fn library(mut self, library: impl Into<String>) -> Self {
        self.tokens.push(library.into());
        self
    }

    pub fn libraries<I, S>(self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        libraries.into_iter().fold(self, |builder, library| builder.library(library))
    }

    /// Close the command with the bundle as the last positional argument.
    pub fn finish(mut self, bundle: &Path) -> CompileCommand {
        self.tokens.push(bundle.display().to_string());
        CompileCommand::from_tokens(self.tokens)
    }
}
