//! Persistent storage infrastructure.
//!
//! Stores application configuration as TOML in the platform config
//! directory.  See [`config`] for the schema and file locations.

pub mod config;
