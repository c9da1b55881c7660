// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for the Satchel extraction pipeline.
//!
//! TOML files merged across the XDG hierarchy, overridden by `SATCHEL_*`
//! environment variables, validated after extraction.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SatchelConfig;
pub use validation::{ConfigError, validate_config};
