//! Command implementations for the choro CLI

pub mod config;
pub mod render;
