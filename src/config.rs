// Category lookup configuration
//
// The engine classifies bare tokens by membership in two disjoint lookup
// lists. The lists are fixed for the duration of a parse; hosts can replace
// the compiled-in defaults programmatically or from a YAML file.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::flags::{Category, FlagSet};

/// Default tokens resolved as `CategoryA` (entity identifiers).
const DEFAULT_CATEGORY_A: &[&str] = &["NAME", "ID", "USERID", "SESSION", "TOKEN"];

/// Default tokens resolved as `CategoryB` (environment values).
const DEFAULT_CATEGORY_B: &[&str] = &["DATE", "TIME", "HOSTNAME", "LOCALE", "VERSION"];

/// Serde shape for loading the lookup lists from YAML.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct CategorySettings {
    pub category_a: Vec<String>,
    pub category_b: Vec<String>,
}

/// The two disjoint token lookup lists.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    category_a: HashSet<String>,
    category_b: HashSet<String>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORY_A.iter().map(|s| s.to_string()),
            DEFAULT_CATEGORY_B.iter().map(|s| s.to_string()),
        )
        .expect("default category lists are disjoint")
    }
}

impl CategoryTable {
    /// Build a table from two token lists. Fails if the lists overlap.
    pub fn new(
        category_a: impl IntoIterator<Item = String>,
        category_b: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let category_a: HashSet<String> = category_a.into_iter().collect();
        let category_b: HashSet<String> = category_b.into_iter().collect();

        if let Some(token) = category_a.intersection(&category_b).next() {
            bail!("token '{}' appears in both category lists", token);
        }

        Ok(Self {
            category_a,
            category_b,
        })
    }

    pub fn from_settings(settings: CategorySettings) -> Result<Self> {
        Self::new(settings.category_a, settings.category_b)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: CategorySettings =
            serde_yaml::from_str(yaml).context("failed to parse category settings")?;
        Self::from_settings(settings)
    }

    /// Classify a bare token. The literal flag overrides membership.
    pub fn classify(&self, token: &str, flags: &FlagSet) -> Category {
        if flags.literal {
            Category::Literal
        } else if self.category_a.contains(token) {
            Category::CategoryA
        } else if self.category_b.contains(token) {
            Category::CategoryB
        } else {
            Category::Unknown
        }
    }
}
