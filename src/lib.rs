// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Species Curator: image inventory and blacklist service
//!
//! Lists species folders with usable images, exposes each species' images
//! with their blacklist state, and records exclusions without touching the
//! image files themselves.

pub mod blacklist;
pub mod classifier;
pub mod config;
pub mod error;
pub mod inventory;
pub mod manifest;
pub mod metadata;
pub mod stats;
pub mod web;

pub use config::AppConfig;
pub use error::{CuratorError, Result};
