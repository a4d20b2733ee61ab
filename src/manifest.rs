// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Publication manifests
//!
//! Writes a `manifest.json` into every folder of the collection listing the
//! images that survive the blacklist, with their attribution. Meant to run
//! before a commit so the published site never needs to read blacklists.

use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::blacklist::read_list;
use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::metadata::{read_metadata, SpeciesMetadata};
use crate::Result;

/// One published image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestImage {
    pub large_url: String,
    pub attribution: serde_json::Value,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub preview_url: Option<String>,
}

/// Contents of one `manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub default_image: Option<ManifestImage>,
    pub images: Vec<ManifestImage>,
}

/// Summary of a generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestReport {
    pub directories: usize,
    pub images: usize,
}

/// Glob patterns from an ignore file, one per line, `#` for comments
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<IgnorePattern>,
}

#[derive(Debug, Clone)]
struct IgnorePattern {
    full: Pattern,
    name: Pattern,
    nested: Pattern,
    inside: Pattern,
}

impl IgnoreRules {
    pub fn parse(text: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let clean = line.trim_end_matches('/');
            patterns.push(IgnorePattern {
                full: Pattern::new(line)?,
                name: Pattern::new(clean)?,
                nested: Pattern::new(&format!("*/{}", clean))?,
                inside: Pattern::new(&format!("*/{}/*", clean))?,
            });
        }
        Ok(Self { patterns })
    }

    /// Load rules from a file; a missing file means nothing is ignored
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        let full = path.to_string_lossy();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.patterns.iter().any(|p| {
            p.full.matches(&full)
                || p.name.matches(&name)
                || p.nested.matches(&full)
                || p.inside.matches(&full)
        })
    }
}

/// Generates manifests for a collection root
#[derive(Debug, Clone)]
pub struct ManifestGenerator {
    root: PathBuf,
    classifier: Classifier,
    rules: IgnoreRules,
    metadata_file: String,
    blacklist_file: String,
    manifest_file: String,
    url_prefix: String,
}

impl ManifestGenerator {
    pub fn new(config: &AppConfig, rules: IgnoreRules) -> Self {
        Self {
            root: config.collection_root(),
            classifier: Classifier::new(&config.classifier),
            rules,
            metadata_file: config.files.metadata.clone(),
            blacklist_file: config.files.blacklist.clone(),
            manifest_file: config.files.manifest.clone(),
            url_prefix: config.manifest.url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Ignore file location: absolute, or next to the collection root
    pub fn ignore_file_path(config: &AppConfig) -> PathBuf {
        let ignore = PathBuf::from(&config.manifest.ignore_file);
        if ignore.is_absolute() {
            return ignore;
        }
        config
            .collection_root()
            .parent()
            .map(|p| p.join(&ignore))
            .unwrap_or(ignore)
    }

    /// Write manifests for the root and every non-ignored folder below it
    pub fn generate_all(&self) -> Result<ManifestReport> {
        let mut report = ManifestReport::default();
        for dir in &self.directories()? {
            let manifest = self.generate(dir)?;
            report.directories += 1;
            report.images += manifest.images.len() + usize::from(manifest.default_image.is_some());
        }

        info!(
            "Generated {} files for {} directories ({} images)",
            self.manifest_file, report.directories, report.images
        );
        Ok(report)
    }

    /// Every folder that receives a manifest: the root first, then nested
    /// folders in sorted order, minus ignored ones
    pub fn directories(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = vec![self.root.clone()];
        collect_dirs(&self.root, &self.rules, &mut dirs)?;
        Ok(dirs)
    }

    /// Build and write the manifest of one folder
    pub fn generate(&self, dir: &Path) -> Result<Manifest> {
        let manifest = self.build(dir)?;
        let payload = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(dir.join(&self.manifest_file), payload)?;
        debug!("Wrote manifest for {:?}", dir);
        Ok(manifest)
    }

    /// Compute the manifest of one folder without writing it
    pub fn build(&self, dir: &Path) -> Result<Manifest> {
        let blacklist = read_list(&dir.join(&self.blacklist_file));
        let metadata = read_metadata(dir, &self.metadata_file);
        let folder = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut entries: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == self.manifest_file || name == self.blacklist_file || name == ".git" {
                continue;
            }
            if self.rules.is_ignored(&path) {
                continue;
            }
            if self.is_blacklisted(&name, &blacklist) {
                debug!("Excluding blacklisted {}", name);
                continue;
            }
            entries.push((name, path));
        }
        entries.sort_by_key(|(name, _)| name.to_lowercase());

        let mut default_image = None;
        let mut images = Vec::new();
        for (name, path) in entries {
            if !path.is_file() || !self.classifier.is_image(&name) || self.classifier.is_thumbnail(&name) {
                continue;
            }
            let image = self.manifest_image(&folder, &name, &metadata);
            if metadata.default_image_name() == Some(name.as_str()) {
                default_image = Some(image);
            } else {
                images.push(image);
            }
        }
        images.sort_by(|a, b| a.large_url.cmp(&b.large_url));

        Ok(Manifest { default_image, images })
    }

    fn manifest_image(&self, folder: &str, name: &str, metadata: &SpeciesMetadata) -> ManifestImage {
        let record = metadata.image(name);
        let attribution = match record.map(|r| &r.attribution) {
            Some(value) if !value.is_null() => value.clone(),
            _ => serde_json::json!({}),
        };
        ManifestImage {
            large_url: self.url(folder, name),
            attribution,
            source: record.map(|r| r.source.clone()).unwrap_or_default(),
            preview_url: record
                .and_then(|r| r.thumbnail_file.as_deref())
                .filter(|t| !t.is_empty())
                .map(|t| self.url(folder, t)),
        }
    }

    fn url(&self, folder: &str, name: &str) -> String {
        if self.url_prefix.is_empty() {
            format!("{}/{}", folder, name)
        } else {
            format!("{}/{}/{}", self.url_prefix, folder, name)
        }
    }

    /// Listed verbatim, or sharing a base stem with a listed file.
    /// Thumbnails are compared by the stem of the image they belong to.
    fn is_blacklisted(&self, name: &str, blacklist: &[String]) -> bool {
        if blacklist.iter().any(|b| b == name) {
            return true;
        }
        let base = stem(&name.replace(self.classifier.thumbnail_marker(), ""));
        blacklist.iter().any(|b| stem(b) == base)
    }
}

fn stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Walk directories recursively, pruning ignored ones
fn collect_dirs(path: &Path, rules: &IgnoreRules, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read {:?}: {}", path, e);
            return Ok(());
        }
    };
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| p.file_name().map_or(true, |n| n != ".git"))
        .filter(|p| !rules.is_ignored(p))
        .collect();
    dirs.sort();

    for dir in dirs {
        out.push(dir.clone());
        collect_dirs(&dir, rules, out)?;
    }
    Ok(())
}
