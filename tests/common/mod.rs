// Common test utilities shared across test files

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use urlweave::{Category, CategoryResolver, CategoryTable, Collaborators, Obfuscator};

/// Resolver backed by a fixed token map; unmapped tokens fail.
pub struct MapResolver {
    map: HashMap<String, String>,
}

impl MapResolver {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            map: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl CategoryResolver for MapResolver {
    async fn resolve(&self, token: &str, _category: Category) -> anyhow::Result<String> {
        match self.map.get(token) {
            Some(value) => Ok(value.clone()),
            None => bail!("no mapping for token '{}'", token),
        }
    }
}

/// Obfuscator that wraps values in `ENC[...]`.
pub struct TagObfuscator;

#[async_trait]
impl Obfuscator for TagObfuscator {
    async fn obfuscate(&self, value: &str) -> anyhow::Result<String> {
        Ok(format!("ENC[{}]", value))
    }
}

/// Obfuscator that always fails.
#[allow(dead_code)]
pub struct BrokenObfuscator;

#[async_trait]
impl Obfuscator for BrokenObfuscator {
    async fn obfuscate(&self, _value: &str) -> anyhow::Result<String> {
        bail!("cipher offline")
    }
}

/// Category table used across the test files: NAME/A/PROC in the first
/// list, DATE/HOST in the second.
pub fn table() -> CategoryTable {
    CategoryTable::new(
        ["NAME", "A", "PROC"].iter().map(|s| s.to_string()),
        ["DATE", "HOST"].iter().map(|s| s.to_string()),
    )
    .unwrap()
}

/// Resolver mapping the table tokens to `<TOKEN>_VALUE`.
pub fn standard_resolver() -> Arc<MapResolver> {
    Arc::new(MapResolver::new(&[
        ("NAME", "NAME_VALUE"),
        ("A", "A_VALUE"),
        ("PROC", "PROC_VALUE"),
        ("DATE", "DATE_VALUE"),
        ("HOST", "HOST_VALUE"),
    ]))
}

#[allow(dead_code)]
pub fn resolver_only() -> Collaborators {
    Collaborators::new().with_resolver(standard_resolver())
}

#[allow(dead_code)]
pub fn full_collaborators() -> Collaborators {
    Collaborators::new()
        .with_resolver(standard_resolver())
        .with_obfuscator(Arc::new(TagObfuscator))
}
