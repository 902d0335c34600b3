//! CLI commands

pub mod apps;
pub mod cluster;
pub mod deploy;
pub mod outputs;
