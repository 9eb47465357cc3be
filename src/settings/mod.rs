//! Settings are read from a TOML file chosen by build profile or `--settings`.
//! See `bin/settings_demo.rs` for a binary that loads and prints them.

mod cli;
pub use clap::{CommandFactory, Parser, Subcommand};
pub use cli::*;

mod settings;
pub use settings::*;
