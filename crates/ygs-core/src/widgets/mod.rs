//! Widgets shipped with the core.

pub mod exec;
pub mod static_blocks;
