//! Configuration loader and schema types.
//!
//! Settings are layered: struct defaults, then `config.toml`, then
//! `NCEPLAY__*` environment variables.

mod load;
mod schema;

pub use load::default_log_path;
pub use schema::*;
