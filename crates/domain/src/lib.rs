//! Shared types for the Wayfarer crates: errors, configuration, chat turns,
//! provider-agnostic messages and the decoded model delta stream.

pub mod config;
pub mod error;
pub mod stream;
pub mod text;
pub mod tool;
pub mod turn;
