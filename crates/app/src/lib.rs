//! repo-lookup application library
//!
//! Adapters, configuration and the CLI around the core lookup engine. This is
//! exposed as a library for testing.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod runner;
