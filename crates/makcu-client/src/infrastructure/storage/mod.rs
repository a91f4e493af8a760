//! Storage infrastructure: configuration persistence.

pub mod config;
