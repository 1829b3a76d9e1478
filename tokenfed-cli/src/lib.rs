//! Library half of the `tokenfed` CLI: config loading and output rendering.

pub mod config;
pub mod output;
