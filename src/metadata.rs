// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-species metadata sidecar

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Descriptive fields for one species folder. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesMetadata {
    #[serde(default)]
    pub vernacular_name: Option<String>,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub default_image: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// Provenance of a single image file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    #[serde(default)]
    pub original_file: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub attribution: serde_json::Value,
    #[serde(default)]
    pub is_default_image: bool,
    #[serde(default)]
    pub thumbnail_file: Option<String>,
}

impl SpeciesMetadata {
    /// Find the provenance record for a file
    pub fn image(&self, filename: &str) -> Option<&ImageRecord> {
        self.images.iter().find(|r| r.original_file == filename)
    }

    /// `defaultImage`, falling back to the first record flagged as default
    pub fn default_image_name(&self) -> Option<&str> {
        self.default_image.as_deref().or_else(|| {
            self.images
                .iter()
                .find(|r| r.is_default_image && !r.original_file.is_empty())
                .map(|r| r.original_file.as_str())
        })
    }
}

/// Read `file_name` inside `species_path`.
///
/// Absence is normal. Anything unreadable or malformed is logged and
/// degraded to the empty metadata so a single bad folder never breaks a
/// full listing.
pub fn read_metadata(species_path: &Path, file_name: &str) -> SpeciesMetadata {
    let path = species_path.join(file_name);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SpeciesMetadata::default(),
        Err(e) => {
            warn!("Failed to read metadata {:?}: {}", path, e);
            return SpeciesMetadata::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Malformed metadata {:?}: {}", path, e);
            SpeciesMetadata::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_metadata(tmp.path(), "metadata.json"), SpeciesMetadata::default());
    }

    #[test]
    fn reads_camel_case_fields() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("metadata.json"),
            r#"{
                "vernacularName": "Red Fox",
                "scientificName": "Vulpes vulpes",
                "defaultImage": "default.jpg",
                "images": [
                    {"originalFile": "a.jpg", "source": "inaturalist",
                     "attribution": {"author": "J. Doe"}, "thumbnailFile": "a_thumb.jpg"}
                ]
            }"#,
        )
        .unwrap();

        let meta = read_metadata(tmp.path(), "metadata.json");
        assert_eq!(meta.vernacular_name.as_deref(), Some("Red Fox"));
        assert_eq!(meta.scientific_name.as_deref(), Some("Vulpes vulpes"));
        assert_eq!(meta.default_image.as_deref(), Some("default.jpg"));
        let record = meta.image("a.jpg").unwrap();
        assert_eq!(record.source, "inaturalist");
        assert_eq!(record.attribution["author"], "J. Doe");
        assert_eq!(record.thumbnail_file.as_deref(), Some("a_thumb.jpg"));
        assert!(meta.image("b.jpg").is_none());
    }

    #[test]
    fn default_image_falls_back_to_flagged_record() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("metadata.json"),
            r#"{"images": [{"originalFile": "a.jpg"}, {"originalFile": "b.jpg", "isDefaultImage": true}]}"#,
        )
        .unwrap();
        let meta = read_metadata(tmp.path(), "metadata.json");
        assert_eq!(meta.default_image, None);
        assert_eq!(meta.default_image_name(), Some("b.jpg"));
    }

    #[test]
    fn malformed_json_is_empty() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("metadata.json"), "{ not json").unwrap();
        assert_eq!(read_metadata(tmp.path(), "metadata.json"), SpeciesMetadata::default());
    }

    #[test]
    fn wrong_field_type_is_empty() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("metadata.json"), r#"{"vernacularName": 42}"#).unwrap();
        assert_eq!(read_metadata(tmp.path(), "metadata.json"), SpeciesMetadata::default());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("metadata.json"),
            r#"{"vernacularName": "Lynx", "habitat": "forest"}"#,
        )
        .unwrap();
        assert_eq!(read_metadata(tmp.path(), "metadata.json").vernacular_name.as_deref(), Some("Lynx"));
    }
}
