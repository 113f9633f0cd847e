//! Core types shared by the bundling and compile stages.

pub mod errors;
pub mod model;
