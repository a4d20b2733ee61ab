// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Global curation statistics
//!
//! A [`StatsSession`] computes totals once with a full scan and then keeps
//! them current from per-species snapshots, so a single blacklist toggle
//! only re-reads the species it touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::inventory::{ImageListing, Inventory, Species};
use crate::Result;

/// Aggregate counts across all species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub species_count: usize,
    pub total_images: usize,
    pub total_blacklisted: usize,
    /// When the last full recompute happened
    pub computed_at: DateTime<Utc>,
}

/// Last known counts of one species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesSnapshot {
    pub total_images: usize,
    pub blacklisted_count: usize,
}

impl From<&ImageListing> for SpeciesSnapshot {
    fn from(listing: &ImageListing) -> Self {
        Self {
            total_images: listing.total_images,
            blacklisted_count: listing.blacklisted_count,
        }
    }
}

/// Caller-held statistics session
#[derive(Debug, Clone)]
pub struct StatsSession {
    stats: GlobalStats,
    snapshots: HashMap<String, SpeciesSnapshot>,
    stale: bool,
}

impl StatsSession {
    /// Full scan of every species
    pub fn initialize(inventory: &Inventory) -> Result<Self> {
        let species = inventory.list_species()?;
        Ok(Self::tally(inventory, &species))
    }

    /// Count the given species; one that can no longer be listed counts as empty
    fn tally(inventory: &Inventory, species: &[Species]) -> Self {
        let mut snapshots = HashMap::with_capacity(species.len());
        let mut total_images = 0;
        let mut total_blacklisted = 0;

        for s in species {
            let snapshot = match inventory.list_images(&s.name) {
                Ok(listing) => SpeciesSnapshot::from(&listing),
                Err(e) => {
                    warn!("Counting {} as empty: {}", s.name, e);
                    SpeciesSnapshot::default()
                }
            };
            total_images += snapshot.total_images;
            total_blacklisted += snapshot.blacklisted_count;
            snapshots.insert(s.name.clone(), snapshot);
        }

        let stats = GlobalStats {
            species_count: species.len(),
            total_images,
            total_blacklisted,
            computed_at: Utc::now(),
        };
        info!(
            "Stats initialized: {} species, {} images, {} blacklisted",
            stats.species_count, stats.total_images, stats.total_blacklisted
        );

        Self {
            stats,
            snapshots,
            stale: false,
        }
    }

    pub fn stats(&self) -> &GlobalStats {
        &self.stats
    }

    pub fn snapshot(&self, species: &str) -> Option<SpeciesSnapshot> {
        self.snapshots.get(species).copied()
    }

    /// Set when an incremental update failed and the totals can no longer be trusted
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Reconcile totals with a fresh snapshot of one species.
    ///
    /// The difference is taken against the stored snapshot for that species.
    /// A species seen for the first time counts from zero; a species whose
    /// images dropped to zero leaves the species count.
    pub fn apply_delta(&mut self, species: &str, new: SpeciesSnapshot) -> &GlobalStats {
        let old = self.snapshots.get(species).copied();
        let before = old.unwrap_or_default();

        self.stats.total_images = (self.stats.total_images + new.total_images)
            .saturating_sub(before.total_images);
        self.stats.total_blacklisted = (self.stats.total_blacklisted + new.blacklisted_count)
            .saturating_sub(before.blacklisted_count);

        match (old.is_some(), new.total_images > 0) {
            (false, true) => {
                self.stats.species_count += 1;
                self.snapshots.insert(species.to_string(), new);
            }
            (true, false) => {
                self.stats.species_count = self.stats.species_count.saturating_sub(1);
                self.snapshots.remove(species);
            }
            (true, true) => {
                self.snapshots.insert(species.to_string(), new);
            }
            (false, false) => {}
        }

        debug!(
            "Stats delta for {}: {:?} -> {:?} (images {}, blacklisted {})",
            species, before, new, self.stats.total_images, self.stats.total_blacklisted
        );
        &self.stats
    }

    /// Re-read one species and apply its delta.
    ///
    /// A vanished folder is applied as an empty snapshot. Any other failure
    /// marks the session stale and is returned.
    pub fn refresh_species(&mut self, inventory: &Inventory, species: &str) -> Result<&GlobalStats> {
        let snapshot = match inventory.list_images(species) {
            Ok(listing) => SpeciesSnapshot::from(&listing),
            Err(e) if e.is_not_found() => SpeciesSnapshot::default(),
            Err(e) => {
                warn!("Stats refresh for {} failed, marking stale: {}", species, e);
                self.stale = true;
                return Err(e);
            }
        };
        Ok(self.apply_delta(species, snapshot))
    }

    /// Current totals, recomputed from scratch first if the session is stale
    pub fn stats_or_rebuild(&mut self, inventory: &Inventory) -> Result<&GlobalStats> {
        if self.stale {
            info!("Stats session is stale, recomputing");
            *self = Self::initialize(inventory)?;
        }
        Ok(&self.stats)
    }
}
