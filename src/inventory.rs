// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Species and image inventory
//!
//! Everything here is derived fresh from the filesystem on every call.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::blacklist::{validate_name, BlacklistStore};
use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::metadata::read_metadata;
use crate::Result;

/// A curatable species folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Species {
    pub name: String,
    pub display_name: String,
    pub vernacular_name: Option<String>,
    pub scientific_name: Option<String>,
}

impl Species {
    fn sort_key(&self) -> String {
        self.vernacular_name
            .as_deref()
            .unwrap_or(&self.display_name)
            .to_lowercase()
    }
}

/// One eligible image in a species listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub name: String,
    pub is_blacklisted: bool,
    pub is_thumbnail: bool,
    pub is_default: bool,
}

/// Per-species image listing with counts over exactly `images`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageListing {
    pub species: String,
    pub images: Vec<ImageEntry>,
    pub total_images: usize,
    pub blacklisted_count: usize,
}

/// `red_fox` -> `Red Fox`
pub fn display_name(folder: &str) -> String {
    folder
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inventory service over one collection root
#[derive(Debug, Clone)]
pub struct Inventory {
    root: PathBuf,
    metadata_file: String,
    classifier: Classifier,
    store: BlacklistStore,
}

impl Inventory {
    pub fn new(config: &AppConfig) -> Self {
        let root = config.collection_root();
        Self {
            store: BlacklistStore::new(root.clone(), config.files.blacklist.clone()),
            metadata_file: config.files.metadata.clone(),
            classifier: Classifier::new(&config.classifier),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &BlacklistStore {
        &self.store
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// List every species folder holding at least one eligible image,
    /// sorted case-insensitively by vernacular name, else display name.
    pub fn list_species(&self) -> Result<Vec<Species>> {
        let entries = std::fs::read_dir(&self.root)?;
        let mut species = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {:?}: {}", self.root, e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) if !name.starts_with('.') => name,
                Ok(_) => continue,
                Err(raw) => {
                    warn!("Skipping species folder with non UTF-8 name: {:?}", raw);
                    continue;
                }
            };
            if let Err(e) = validate_name(&name) {
                warn!("Skipping species folder that cannot be addressed: {}", e);
                continue;
            }

            let metadata = read_metadata(&path, &self.metadata_file);
            let filenames = match list_files(&path) {
                Ok(files) => files,
                Err(e) => {
                    warn!("Skipping unreadable species folder {:?}: {}", path, e);
                    continue;
                }
            };

            let default_image = metadata.default_image_name();
            let has_content = filenames
                .iter()
                .any(|f| self.classifier.classify(f, default_image).is_eligible());
            if !has_content {
                debug!("No eligible images in {:?}", path);
                continue;
            }

            species.push(Species {
                display_name: display_name(&name),
                name,
                vernacular_name: metadata.vernacular_name,
                scientific_name: metadata.scientific_name,
            });
        }

        species.sort_by_cached_key(|s| (s.sort_key(), s.name.clone()));
        Ok(species)
    }

    /// List the eligible images of one species with blacklist state
    pub fn list_images(&self, species: &str) -> Result<ImageListing> {
        let dir = self.store.species_dir(species)?;
        let metadata = read_metadata(&dir, &self.metadata_file);
        let blacklist: HashSet<String> = self.store.read(species)?.into_iter().collect();
        let default_image = metadata.default_image_name();

        let mut images: Vec<ImageEntry> = list_files(&dir)?
            .into_iter()
            .filter_map(|name| {
                let class = self.classifier.classify(&name, default_image);
                if !class.is_eligible() {
                    return None;
                }
                Some(ImageEntry {
                    is_blacklisted: blacklist.contains(&name),
                    is_thumbnail: class.is_thumbnail,
                    is_default: class.is_default,
                    name,
                })
            })
            .collect();
        images.sort_by(|a, b| a.name.cmp(&b.name));

        let blacklisted_count = images.iter().filter(|i| i.is_blacklisted).count();
        Ok(ImageListing {
            species: species.to_string(),
            total_images: images.len(),
            blacklisted_count,
            images,
        })
    }

    /// Raw persisted blacklist, in stored order
    pub fn blacklist(&self, species: &str) -> Result<Vec<String>> {
        self.store.read(species)
    }
}

/// Names of the regular files directly inside `dir`
fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() && !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => files.push(name),
            Err(raw) => debug!("Ignoring non UTF-8 filename {:?} in {:?}", raw, dir),
        }
    }
    Ok(files)
}

impl From<&Path> for Inventory {
    fn from(root: &Path) -> Self {
        let mut config = AppConfig::default();
        config.collection_root = root.to_string_lossy().to_string();
        Self::new(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::ToggleAction;
    use crate::CuratorError;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        std::fs::create_dir_all(dir).unwrap();
        for name in names {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
    }

    fn red_fox() -> (TempDir, Inventory) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("red_fox");
        touch(&dir, &["a.jpg", "a_thumb.jpg", "default.jpg"]);
        std::fs::write(
            dir.join("metadata.json"),
            r#"{"vernacularName": "Red Fox", "defaultImage": "default.jpg"}"#,
        )
        .unwrap();
        let inventory = Inventory::from(tmp.path());
        (tmp, inventory)
    }

    #[test]
    fn display_name_capitalizes_words() {
        assert_eq!(display_name("red_fox"), "Red Fox");
        assert_eq!(display_name("european_pine_marten"), "European Pine Marten");
        assert_eq!(display_name("lynx"), "Lynx");
        assert_eq!(display_name("a__b"), "A  B");
    }

    #[test]
    fn red_fox_species_listing() {
        let (_tmp, inventory) = red_fox();
        let species = inventory.list_species().unwrap();
        assert_eq!(
            species,
            vec![Species {
                name: "red_fox".to_string(),
                display_name: "Red Fox".to_string(),
                vernacular_name: Some("Red Fox".to_string()),
                scientific_name: None,
            }]
        );
    }

    #[test]
    fn red_fox_image_listing() {
        let (_tmp, inventory) = red_fox();
        let listing = inventory.list_images("red_fox").unwrap();
        assert_eq!(listing.images.len(), 1);
        assert_eq!(listing.images[0].name, "a.jpg");
        assert!(!listing.images[0].is_blacklisted);
        assert_eq!(listing.total_images, 1);
        assert_eq!(listing.blacklisted_count, 0);
    }

    #[test]
    fn toggle_is_reflected_in_listing() {
        let (_tmp, inventory) = red_fox();
        assert!(inventory.store().toggle("red_fox", "a.jpg", ToggleAction::Add).unwrap());
        let listing = inventory.list_images("red_fox").unwrap();
        assert_eq!(listing.blacklisted_count, 1);
        assert!(listing.images[0].is_blacklisted);
    }

    #[test]
    fn blacklisted_count_ignores_entries_for_non_eligible_files() {
        let (_tmp, inventory) = red_fox();
        let store = inventory.store();
        store.toggle("red_fox", "a_thumb.jpg", ToggleAction::Add).unwrap();
        store.toggle("red_fox", "default.jpg", ToggleAction::Add).unwrap();
        store.toggle("red_fox", "gone.jpg", ToggleAction::Add).unwrap();

        let listing = inventory.list_images("red_fox").unwrap();
        assert_eq!(listing.total_images, 1);
        assert_eq!(listing.blacklisted_count, 0);
        assert_eq!(inventory.blacklist("red_fox").unwrap().len(), 3);
    }

    #[test]
    fn folders_without_content_are_hidden() {
        let (tmp, inventory) = red_fox();
        let wolf = tmp.path().join("grey_wolf");
        touch(&wolf, &["w_thumb.jpg", "hero.png", "notes.txt"]);
        std::fs::write(wolf.join("metadata.json"), r#"{"defaultImage": "hero.png"}"#).unwrap();
        std::fs::create_dir(tmp.path().join("empty")).unwrap();

        let names: Vec<_> = inventory.list_species().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["red_fox"]);
    }

    #[test]
    fn species_sorted_by_vernacular_then_display_name() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("vulpes_vulpes"), &["1.jpg"]);
        std::fs::write(
            tmp.path().join("vulpes_vulpes/metadata.json"),
            r#"{"vernacularName": "red fox", "scientificName": "Vulpes vulpes"}"#,
        )
        .unwrap();
        touch(&tmp.path().join("badger"), &["1.jpg"]);
        touch(&tmp.path().join("zebra"), &["1.jpg"]);
        std::fs::write(tmp.path().join("zebra/metadata.json"), r#"{"vernacularName": "Aardwolf"}"#).unwrap();

        let species = Inventory::from(tmp.path()).list_species().unwrap();
        let names: Vec<_> = species.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zebra", "badger", "vulpes_vulpes"]);
        assert_eq!(species[2].scientific_name.as_deref(), Some("Vulpes vulpes"));
    }

    #[test]
    fn malformed_metadata_does_not_break_listing() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("otter"), &["o.jpg"]);
        std::fs::write(tmp.path().join("otter/metadata.json"), "{{{").unwrap();

        let species = Inventory::from(tmp.path()).list_species().unwrap();
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].vernacular_name, None);
        assert_eq!(species[0].display_name, "Otter");
    }

    #[test]
    fn hidden_folders_and_loose_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join(".git"), &["a.jpg"]);
        touch(tmp.path(), &["stray.jpg"]);
        assert!(Inventory::from(tmp.path()).list_species().unwrap().is_empty());
    }

    #[test]
    fn images_sorted_by_filename() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("owl"), &["c.jpg", "a.png", "b.webp", "b_thumb.webp"]);
        let listing = Inventory::from(tmp.path()).list_images("owl").unwrap();
        let names: Vec<_> = listing.images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.webp", "c.jpg"]);
    }

    #[test]
    fn missing_species_is_not_found() {
        let (_tmp, inventory) = red_fox();
        assert!(inventory.list_images("grey_wolf").unwrap_err().is_not_found());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_species_folder_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let (tmp, inventory) = red_fox();
        let locked = tmp.path().join("badger");
        touch(&locked, &["x.png"]);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind root
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let names: Vec<_> = inventory.list_species().unwrap().into_iter().map(|s| s.name).collect();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(names, vec!["red_fox"]);
    }

    #[cfg(unix)]
    #[test]
    fn unaddressable_folder_names_are_not_listed() {
        let (tmp, inventory) = red_fox();
        touch(&tmp.path().join("grey\\wolf"), &["w.jpg"]);

        let species = inventory.list_species().unwrap();
        assert_eq!(species.len(), 1);
        for s in &species {
            assert!(inventory.list_images(&s.name).is_ok());
        }
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let inventory = Inventory::from(tmp.path().join("nowhere").as_path());
        assert!(matches!(inventory.list_species(), Err(CuratorError::FileSystem(_))));
    }
}
