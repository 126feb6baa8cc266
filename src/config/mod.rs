// ABOUTME: Configuration module grouping environment-driven server settings
// ABOUTME: All configuration is read at process start and immutable afterwards
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Configuration management

/// Environment-based configuration loading
pub mod environment;

pub use environment::{
    Environment, KeyMaterialConfig, LogLevel, ReplayConfig, ServerConfig, SigningAlgorithm,
    TokenConfig,
};
