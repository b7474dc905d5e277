// Async collaborator contracts
//
// The two suspension points of the whole engine. Both may fail; a failure is
// recorded on the trace and never aborts a parse.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::flags::Category;

/// Maps an abstract token to a concrete value, e.g. by remote lookup.
#[async_trait]
pub trait CategoryResolver: Send + Sync {
    async fn resolve(&self, token: &str, category: Category) -> Result<String>;
}

/// Encrypts a resolved value.
#[async_trait]
pub trait Obfuscator: Send + Sync {
    async fn obfuscate(&self, value: &str) -> Result<String>;
}

/// Optional collaborator handles, clonable across concurrent branches.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub resolver: Option<Arc<dyn CategoryResolver>>,
    pub obfuscator: Option<Arc<dyn Obfuscator>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn CategoryResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_obfuscator(mut self, obfuscator: Arc<dyn Obfuscator>) -> Self {
        self.obfuscator = Some(obfuscator);
        self
    }
}
