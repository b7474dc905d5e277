//! Parsing and resolution of bracket-grammar tokens embedded in URL-like
//! strings.
//!
//! A `flags{content}` token (flags drawn from `e` encrypted, `r` required,
//! `v` literal) can appear as a whole path segment or query value
//! (PARAMETER) or embedded anywhere inside one (SUBSTITUTION). Tokens are
//! resolved through two pluggable async collaborators; every attempt is
//! recorded on a structured trace, and nothing a collaborator does can fail
//! the parse itself.

mod collaborators;
mod components;
mod config;
mod error;
mod flags;
mod pattern;
mod query;
mod reconstruct;
mod resolve;
mod segment;
mod substitution;
mod trace;
mod value;

use std::sync::Arc;

use serde::Serialize;

pub use collaborators::{CategoryResolver, Collaborators, Obfuscator};
pub use components::{split_components, UrlComponents};
pub use config::{CategorySettings, CategoryTable};
pub use error::ResolveFailure;
pub use flags::{Category, FlagSet, ProcessingMode};
pub use pattern::classify;
pub use query::{depth_aware_split, GlobalQueryEntry, PlainQueryEntry, QueryEntry};
pub use reconstruct::FilterMode;
pub use segment::Segment;
pub use trace::{TraceLocation, TraceRecord};
pub use value::{ResolvedItem, Resolution};

/// Everything one parse-and-resolve invocation produced. Fresh per call;
/// nothing is shared across invocations.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub base_url: String,
    pub reconstructed_path: String,
    pub segments: Vec<Segment>,
    pub query: Vec<QueryEntry>,
    pub traces: Vec<TraceRecord>,
    /// `base_url + path + '?' + joined query parts`, filtered per the
    /// selected mode.
    pub output: String,
}

/// Reusable entry point holding the collaborators and category lists.
#[derive(Clone, Default)]
pub struct Processor {
    collaborators: Collaborators,
    categories: CategoryTable,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn CategoryResolver>) -> Self {
        self.collaborators.resolver = Some(resolver);
        self
    }

    pub fn with_obfuscator(mut self, obfuscator: Arc<dyn Obfuscator>) -> Self {
        self.collaborators.obfuscator = Some(obfuscator);
        self
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }

    /// Parse `input`, resolve every embedded token, and reconstruct the
    /// output under `mode`. Infallible: collaborator problems surface on the
    /// traces, never as an error.
    pub async fn process(&self, input: &str, mode: FilterMode) -> ParseResult {
        let components = split_components(input);
        let query = components.query.as_deref().unwrap_or("");

        // Path segments and query entries are independent.
        let (segments, entries) = futures::join!(
            segment::process_path(&components.path, &self.categories, &self.collaborators),
            query::process_query(query, &self.categories, &self.collaborators),
        );

        let (reconstructed_path, output) = reconstruct::reconstruct(
            &components.base,
            &components.path,
            &segments,
            &entries,
            mode,
        );

        let mut traces = Vec::new();
        let segments = segments
            .into_iter()
            .map(|(segment, segment_traces)| {
                traces.extend(segment_traces);
                segment
            })
            .collect();
        let query = entries
            .into_iter()
            .map(|(entry, entry_traces)| {
                traces.extend(entry_traces);
                entry
            })
            .collect();

        ParseResult {
            base_url: components.base,
            reconstructed_path,
            segments,
            query,
            traces,
            output,
        }
    }
}

/// One-shot parse with the default category table.
pub async fn parse_and_resolve(
    input: &str,
    collaborators: &Collaborators,
    mode: FilterMode,
) -> ParseResult {
    Processor::new()
        .with_collaborators(collaborators.clone())
        .process(input, mode)
        .await
}
