//! biasctl library - exposes the interactive pieces for integration tests

pub mod bootstrap;
pub mod engine;
pub mod errors;
pub mod theme;
