//! Settings come from a TOML file (`--settings`, or the per-profile default)
//! layered with `TOLLGATE_*` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
