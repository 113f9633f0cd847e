//! Application layer: directive resolution, command building, and the build run.

pub mod build;
pub mod bundle;
pub mod command;
pub mod compile;
pub mod directives;
