// Query pipeline
//
// Splits the query on `&` at bracket depth zero, parses `key=value` pairs,
// detects the whole-query global wrapper, and runs the two-stage global
// processor: resolve inner entries individually, reassemble, then obfuscate
// the block as a unit when the wrapper asks for it.

use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use tracing::{debug, warn};

use crate::collaborators::Collaborators;
use crate::config::CategoryTable;
use crate::error::ResolveFailure;
use crate::flags::{Category, FlagSet, ProcessingMode};
use crate::pattern;
use crate::resolve::{resolve_pattern, TraceContext};
use crate::substitution::substitute;
use crate::trace::{TraceLocation, TraceRecord};
use crate::value::{Resolution, ResolvedItem};

/// Identifier used on traces for the keyless whole-query wrapper.
const GLOBAL_IDENTIFIER: &str = "global";

/// A parsed query entry. Matched exhaustively; only `Global` carries inner
/// results.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryEntry {
    Plain(PlainQueryEntry),
    Global(GlobalQueryEntry),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlainQueryEntry {
    pub key: String,
    pub raw_value: String,
    #[serde(flatten)]
    pub item: ResolvedItem,
}

/// A bracket group treated as a unit: the whole-query wrapper (no key) or a
/// keyed `key={k2=v2&...}` group.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalQueryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub raw_value: String,
    #[serde(flatten)]
    pub item: ResolvedItem,
    pub inner: Vec<QueryEntry>,
    /// The inner entries rejoined as `key=value&...`, before obfuscation.
    pub reassembled: String,
}

impl QueryEntry {
    pub fn item(&self) -> &ResolvedItem {
        match self {
            QueryEntry::Plain(entry) => &entry.item,
            QueryEntry::Global(entry) => &entry.item,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            QueryEntry::Plain(entry) => Some(&entry.key),
            QueryEntry::Global(entry) => entry.key.as_deref(),
        }
    }

    pub fn final_value(&self) -> &str {
        &self.item().final_value
    }
}

/// Split on `sep`, but only where no bracket group is open. A separator
/// inside `{...}` is content, not a boundary.
pub fn depth_aware_split(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: u32 = 0;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ if ch == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }

    parts.push(&s[start..]);
    parts
}

/// Parse and resolve a whole query string. Top-level entries are independent
/// and resolve concurrently; order is preserved.
pub async fn process_query(
    query: &str,
    table: &CategoryTable,
    collaborators: &Collaborators,
) -> Vec<(QueryEntry, Vec<TraceRecord>)> {
    if query.is_empty() {
        return Vec::new();
    }

    if let Some(wrapper) = pattern::extract_global(query) {
        debug!(query, "query matched global wrapper");
        let result =
            process_global(None, wrapper.flags, wrapper.content, query, table, collaborators)
                .await;
        return vec![result];
    }

    let futures = depth_aware_split(query, '&')
        .into_iter()
        .filter(|pair| !pair.is_empty())
        .map(|pair| parse_pair(pair, false, table, collaborators));

    join_all(futures).await
}

/// Parse one `key=value` pair. Boxed because keyed groups recurse.
fn parse_pair<'a>(
    pair: &'a str,
    inherited_required: bool,
    table: &'a CategoryTable,
    collaborators: &'a Collaborators,
) -> BoxFuture<'a, (QueryEntry, Vec<TraceRecord>)> {
    Box::pin(async move {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let ctx = TraceContext::new(TraceLocation::Query, key);

        match pattern::extract_parameter(value) {
            Some(found) => {
                let mut flags = found.flags;
                // The parent's required flag travels down; encrypted must be
                // set at each level explicitly.
                flags.required |= inherited_required;

                if found.content.contains('=') {
                    process_global(
                        Some(key),
                        flags,
                        found.content,
                        value,
                        table,
                        collaborators,
                    )
                    .await
                } else {
                    let token = resolve_pattern(
                        value,
                        flags,
                        found.content,
                        ProcessingMode::Parameter,
                        table,
                        collaborators,
                        &ctx,
                    )
                    .await;
                    (
                        QueryEntry::Plain(PlainQueryEntry {
                            key: key.to_string(),
                            raw_value: value.to_string(),
                            item: token.item,
                        }),
                        vec![token.trace],
                    )
                }
            }
            None => {
                let (resolved, traces) = substitute(value, table, collaborators, &ctx).await;
                let mut item = ResolvedItem::substituted(value, resolved);
                // The parent's required flag reaches substitution pairs too.
                item.flags.required = inherited_required;
                (
                    QueryEntry::Plain(PlainQueryEntry {
                        key: key.to_string(),
                        raw_value: value.to_string(),
                        item,
                    }),
                    traces,
                )
            }
        }
    })
}

/// Two-stage global resolution: resolve inner entries individually, drop the
/// empty ones, reassemble, and obfuscate the block when the wrapper carries
/// the encrypted flag.
async fn process_global(
    key: Option<&str>,
    flags: FlagSet,
    content: &str,
    raw_value: &str,
    table: &CategoryTable,
    collaborators: &Collaborators,
) -> (QueryEntry, Vec<TraceRecord>) {
    let futures = depth_aware_split(content, '&')
        .into_iter()
        .filter(|pair| !pair.is_empty())
        .map(|pair| parse_pair(pair, flags.required, table, collaborators));

    let mut inner = Vec::new();
    let mut traces = Vec::new();
    for (entry, entry_traces) in join_all(futures).await {
        traces.extend(entry_traces);
        inner.push(entry);
    }

    let reassembled = inner
        .iter()
        .filter(|entry| !entry.final_value().is_empty())
        .map(|entry| match entry.key() {
            Some(key) => format!("{}={}", key, entry.final_value()),
            None => entry.final_value().to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    let mut failure = None;
    let encrypted = if flags.encrypted && !reassembled.is_empty() {
        match &collaborators.obfuscator {
            Some(obfuscator) => match obfuscator.obfuscate(&reassembled).await {
                Ok(value) => Resolution::Resolved(value),
                Err(err) => {
                    warn!(error = %err, "obfuscator failed on global block");
                    failure = Some(ResolveFailure::ObfuscatorFailed(err.to_string()));
                    Resolution::Failed
                }
            },
            None => {
                failure = Some(ResolveFailure::MissingObfuscator);
                Resolution::Absent
            }
        }
    } else {
        Resolution::Absent
    };

    // Either the reassembled inner content or its obfuscated form as a
    // whole, never a partial mix.
    let final_value = encrypted
        .value()
        .unwrap_or(reassembled.as_str())
        .to_string();

    traces.push(TraceRecord {
        category: Category::Global,
        target: content.to_string(),
        converted_value: None,
        encrypted_value: encrypted.value().map(str::to_string),
        result: final_value.clone(),
        location: TraceLocation::Query,
        identifier: key.unwrap_or(GLOBAL_IDENTIFIER).to_string(),
        flags,
        processing_mode: ProcessingMode::Parameter,
        success: failure.is_none(),
        failure_reason: failure.as_ref().map(|f| f.to_string()),
    });

    let entry = QueryEntry::Global(GlobalQueryEntry {
        key: key.map(str::to_string),
        raw_value: raw_value.to_string(),
        item: ResolvedItem {
            original_value: raw_value.to_string(),
            flags,
            category: Category::Global,
            extracted_value: Some(content.to_string()),
            converted_value: Resolution::Absent,
            encrypted_value: encrypted,
            final_value,
            processing_mode: ProcessingMode::Parameter,
        },
        inner,
        reassembled,
    });

    (entry, traces)
}
