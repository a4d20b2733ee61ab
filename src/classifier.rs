// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filename classification for species folders
//!
//! Classification looks only at the filename and the species' recorded
//! default image. It never touches the filesystem or the blacklist.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ClassifierConfig;

/// What a file in a species folder is, by filename alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    /// Unrecognized extension
    NotImage,
    /// The species' designated representative image
    Default,
    /// Reduced-size rendition of another image
    Thumbnail,
    /// A curatable content image
    Content,
}

/// Raw classification flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_image: bool,
    pub is_thumbnail: bool,
    pub is_default: bool,
}

impl Classification {
    /// Collapse the flags into a single tag; default wins over thumbnail
    pub fn kind(&self) -> FileKind {
        if !self.is_image {
            FileKind::NotImage
        } else if self.is_default {
            FileKind::Default
        } else if self.is_thumbnail {
            FileKind::Thumbnail
        } else {
            FileKind::Content
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.kind() == FileKind::Content
    }
}

/// Filename classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: Vec<String>,
    thumbnail_marker: String,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            extensions: config
                .image_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            thumbnail_marker: config.thumbnail_marker.clone(),
        }
    }

    pub fn thumbnail_marker(&self) -> &str {
        &self.thumbnail_marker
    }

    /// Check the extension against the recognized image formats
    pub fn is_image(&self, filename: &str) -> bool {
        match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    /// The marker must sit immediately before the extension (`a_thumb.jpg`)
    pub fn is_thumbnail(&self, filename: &str) -> bool {
        let path = Path::new(filename);
        if path.extension().is_none() {
            return false;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|stem| stem.ends_with(self.thumbnail_marker.as_str()))
            .unwrap_or(false)
    }

    pub fn classify(&self, filename: &str, default_image: Option<&str>) -> Classification {
        Classification {
            is_image: self.is_image(filename),
            is_thumbnail: self.is_thumbnail(filename),
            is_default: default_image.map_or(false, |d| d == filename),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_images_are_content() {
        let c = Classifier::default();
        for name in ["a.jpg", "b.JPEG", "c.png", "d.Gif", "e.webp"] {
            let class = c.classify(name, Some("default.jpg"));
            assert_eq!(class.kind(), FileKind::Content, "{}", name);
            assert!(class.is_eligible());
        }
    }

    #[test]
    fn unknown_extensions_are_not_images() {
        let c = Classifier::default();
        assert_eq!(c.classify("notes.txt", None).kind(), FileKind::NotImage);
        assert_eq!(c.classify("metadata.json", None).kind(), FileKind::NotImage);
        assert_eq!(c.classify("README", None).kind(), FileKind::NotImage);
        assert_eq!(c.classify("raw.tiff", None).kind(), FileKind::NotImage);
    }

    #[test]
    fn thumbnail_marker_must_precede_extension() {
        let c = Classifier::default();
        assert!(c.classify("a_thumb.jpg", None).is_thumbnail);
        assert!(c.classify("a_thumb.PNG", None).is_thumbnail);
        assert!(!c.classify("a_thumbnail.jpg", None).is_thumbnail);
        assert!(!c.classify("_thumb_a.jpg", None).is_thumbnail);
        assert_eq!(c.classify("a_thumb.jpg", None).kind(), FileKind::Thumbnail);
    }

    #[test]
    fn default_requires_exact_match() {
        let c = Classifier::default();
        assert_eq!(c.classify("default.jpg", Some("default.jpg")).kind(), FileKind::Default);
        assert_eq!(c.classify("Default.jpg", Some("default.jpg")).kind(), FileKind::Content);
        assert_eq!(c.classify("default.jpg", None).kind(), FileKind::Content);
    }

    #[test]
    fn default_thumbnail_tags_as_default() {
        let c = Classifier::default();
        let class = c.classify("hero_thumb.jpg", Some("hero_thumb.jpg"));
        assert!(class.is_thumbnail && class.is_default);
        assert_eq!(class.kind(), FileKind::Default);
    }

    #[test]
    fn custom_config_is_honoured() {
        let c = Classifier::new(&ClassifierConfig {
            image_extensions: vec![".TIF".to_string()],
            thumbnail_marker: "-small".to_string(),
        });
        assert!(c.is_image("scan.tif"));
        assert!(!c.is_image("scan.jpg"));
        assert!(c.is_thumbnail("scan-small.tif"));
    }
}
