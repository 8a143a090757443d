// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::bucket;
use crate::error::{KhojError, Result};

/// Variant every user gets from an unknown or inactive experiment.
pub const CONTROL: &str = "control";

/// The experiment that picks a retrieval strategy.
pub const SEARCH_ALGORITHM: &str = "search_algorithm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    /// Share of users, out of 100.
    pub weight: u8,
}

impl Variant {
    pub fn new(name: &str, weight: u8) -> Self {
        Self {
            name: name.to_string(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    pub variants: Vec<Variant>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Experiment {
    pub fn new(name: &str, variants: Vec<Variant>) -> Self {
        Self {
            name: name.to_string(),
            variants,
            active: true,
        }
    }

    /// Weights sum to exactly 100, names are non-empty and unique.
    pub fn validate(&self) -> Result<()> {
        let reject = |reason: String| KhojError::InvalidExperiment {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(reject("experiment name is empty".to_string()));
        }
        if self.variants.is_empty() {
            return Err(reject("no variants".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        for variant in &self.variants {
            if variant.name.trim().is_empty() {
                return Err(reject("variant name is empty".to_string()));
            }
            if !seen.insert(variant.name.as_str()) {
                return Err(reject(format!("variant '{}' listed twice", variant.name)));
            }
        }
        let total: u32 = self.variants.iter().map(|v| u32::from(v.weight)).sum();
        if total != 100 {
            return Err(reject(format!("variant weights sum to {total}, not 100")));
        }
        Ok(())
    }

    /// Variant for a bucket in `0..100`.
    fn variant_for(&self, bucket: u8) -> &str {
        let mut cumulative = 0u32;
        for variant in &self.variants {
            cumulative += u32::from(variant.weight);
            if u32::from(bucket) < cumulative {
                return &variant.name;
            }
        }
        // Unreachable for a validated experiment
        CONTROL
    }
}

/// Every experiment the process knows about.
///
/// Reads take a shared lock; the admin operations take it exclusively and are
/// rare. Assignment itself never writes.
#[derive(Debug, Default)]
pub struct ExperimentRegistry {
    experiments: RwLock<BTreeMap<String, Experiment>>,
}

impl ExperimentRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The `search_algorithm` experiment: `hybrid` 50 / `multi_stage` 50.
    pub fn seeded() -> Self {
        let registry = Self::empty();
        registry.insert(Experiment::new(
            SEARCH_ALGORITHM,
            vec![Variant::new("hybrid", 50), Variant::new("multi_stage", 50)],
        ));
        registry
    }

    /// Seed plus `experiments` (which replace seeded ones of the same name).
    pub fn from_experiments(experiments: &[Experiment]) -> Result<Self> {
        let registry = Self::seeded();
        for experiment in experiments {
            registry.add_experiment(experiment.clone())?;
        }
        Ok(registry)
    }

    fn insert(&self, experiment: Experiment) {
        self.experiments
            .write()
            .insert(experiment.name.clone(), experiment);
    }

    /// Register or replace. Rejects experiments whose weights don't sum to 100.
    pub fn add_experiment(&self, experiment: Experiment) -> Result<()> {
        experiment.validate()?;
        info!(
            experiment = %experiment.name,
            variants = experiment.variants.len(),
            active = experiment.active,
            "experiment registered"
        );
        self.insert(experiment);
        Ok(())
    }

    /// Returns false if no experiment has that name.
    pub fn set_experiment_active(&self, name: &str, active: bool) -> bool {
        match self.experiments.write().get_mut(name) {
            Some(experiment) => {
                experiment.active = active;
                info!(experiment = name, active, "experiment toggled");
                true
            }
            None => false,
        }
    }

    /// The user's variant, or [`CONTROL`] for unknown/inactive experiments.
    pub fn get_variant(&self, experiment: &str, user_id: &str) -> String {
        let experiments = self.experiments.read();
        match experiments.get(experiment) {
            Some(e) if e.active => e.variant_for(bucket(user_id, experiment)).to_string(),
            _ => CONTROL.to_string(),
        }
    }

    pub fn experiment(&self, name: &str) -> Option<Experiment> {
        self.experiments.read().get(name).cloned()
    }

    /// All experiments, by name.
    pub fn list_experiments(&self) -> Vec<Experiment> {
        self.experiments.read().values().cloned().collect()
    }

    /// `(experiment, variant)` for every active experiment.
    pub fn assignments(&self, user_id: &str) -> Vec<(String, String)> {
        self.experiments
            .read()
            .values()
            .filter(|e| e.active)
            .map(|e| (e.name.clone(), e.variant_for(bucket(user_id, &e.name)).to_string()))
            .collect()
    }
}
