// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for species-curator

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Directory holding one sub-folder per species
    #[serde(default = "default_collection_root")]
    pub collection_root: String,

    /// Filename classification rules
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Sidecar file names inside each species folder
    #[serde(default)]
    pub files: FilesConfig,

    /// Manifest generation settings
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Web server settings
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifierConfig {
    /// Recognized image extensions, compared case-insensitively
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Suffix of the file stem that marks a thumbnail
    #[serde(default = "default_thumbnail_marker")]
    pub thumbnail_marker: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilesConfig {
    #[serde(default = "default_metadata_file")]
    pub metadata: String,
    #[serde(default = "default_blacklist_file")]
    pub blacklist: String,
    #[serde(default = "default_manifest_file")]
    pub manifest: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ManifestConfig {
    /// Glob patterns file, resolved relative to the collection root's parent
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,
    /// Prefix for the URLs written into each manifest
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Serve image bytes under `/species-images`
    #[serde(default = "default_true")]
    pub serve_images: bool,
}

// Default value functions
fn default_collection_root() -> String { "species-images".to_string() }
fn default_thumbnail_marker() -> String { "_thumb".to_string() }
fn default_metadata_file() -> String { "metadata.json".to_string() }
fn default_blacklist_file() -> String { "blacklist.json".to_string() }
fn default_manifest_file() -> String { "manifest.json".to_string() }
fn default_ignore_file() -> String { ".manifest-ignore".to_string() }
fn default_url_prefix() -> String { "species-images".to_string() }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

fn default_image_extensions() -> Vec<String> {
    vec!["jpg", "jpeg", "png", "gif", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            collection_root: default_collection_root(),
            classifier: ClassifierConfig::default(),
            files: FilesConfig::default(),
            manifest: ManifestConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
            thumbnail_marker: default_thumbnail_marker(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            metadata: default_metadata_file(),
            blacklist: default_blacklist_file(),
            manifest: default_manifest_file(),
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            ignore_file: default_ignore_file(),
            url_prefix: default_url_prefix(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            request_timeout_secs: default_request_timeout(),
            serve_images: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::CuratorError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings that would make every file classify the same way
    pub fn validate(&self) -> crate::Result<()> {
        if self.classifier.image_extensions.is_empty() {
            return Err(crate::CuratorError::Config(
                "classifier.image_extensions must not be empty".to_string(),
            ));
        }
        if self.classifier.thumbnail_marker.is_empty() {
            return Err(crate::CuratorError::Config(
                "classifier.thumbnail_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn collection_root(&self) -> PathBuf {
        PathBuf::from(&self.collection_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load(&tmp.path().join("nope.json")).unwrap();
        assert_eq!(config.collection_root, "species-images");
        assert_eq!(config.files.blacklist, "blacklist.json");
        assert_eq!(config.web.port, 8080);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"collection_root": "/data/birds", "web": {"port": 9000}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.collection_root, "/data/birds");
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.classifier.thumbnail_marker, "_thumb");
    }

    #[test]
    fn save_then_load_keeps_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let mut config = AppConfig::default();
        config.manifest.url_prefix = "media/species".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.manifest.url_prefix, "media/species");
    }

    #[test]
    fn empty_extension_list_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"classifier": {"image_extensions": []}}"#).unwrap();

        assert!(matches!(
            AppConfig::load(&path),
            Err(crate::CuratorError::Config(_))
        ));
    }
}
