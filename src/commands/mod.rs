//! # CLI Command Implementations
//!
//! Each subcommand of the `manifest-engine` tool lives in its own file and
//! contains:
//! - An `Args` struct defining the command's arguments, derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and calls into the
//!   `manifest_engine` library.

pub mod render;
