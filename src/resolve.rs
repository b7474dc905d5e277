// Per-token resolution through the collaborators
//
// Shared by the parameter path, the nested substitution engine, and the
// query pipelines. Collaborator failures are recorded, never propagated.

use tracing::warn;

use crate::collaborators::Collaborators;
use crate::config::CategoryTable;
use crate::error::ResolveFailure;
use crate::flags::{Category, FlagSet, ProcessingMode};
use crate::trace::{TraceLocation, TraceRecord};
use crate::value::{final_value, Resolution, ResolvedItem};

/// Where traces produced by a resolution belong.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub location: TraceLocation,
    pub identifier: String,
}

impl TraceContext {
    pub fn new(location: TraceLocation, identifier: impl Into<String>) -> Self {
        Self {
            location,
            identifier: identifier.into(),
        }
    }
}

/// Raw collaborator outcomes for one token.
pub struct TokenOutcome {
    pub category: Category,
    pub converted: Resolution,
    pub encrypted: Resolution,
    pub failure: Option<ResolveFailure>,
}

/// Run the category resolver and obfuscator for one bracket token.
pub async fn resolve_token(
    content: &str,
    flags: &FlagSet,
    table: &CategoryTable,
    collaborators: &Collaborators,
) -> TokenOutcome {
    let category = table.classify(content, flags);
    let mut failure = None;

    let converted = match category {
        // Literal tokens skip the resolver entirely.
        Category::Literal => Resolution::Absent,
        Category::CategoryA | Category::CategoryB => match &collaborators.resolver {
            Some(resolver) => match resolver.resolve(content, category).await {
                Ok(value) => Resolution::Resolved(value),
                Err(err) => {
                    warn!(token = content, error = %err, "category resolver failed");
                    failure = Some(ResolveFailure::ResolverFailed(err.to_string()));
                    Resolution::Failed
                }
            },
            None => {
                failure = Some(ResolveFailure::MissingResolver);
                Resolution::Absent
            }
        },
        Category::Unknown => {
            failure = Some(ResolveFailure::UnknownCategory(content.to_string()));
            Resolution::Absent
        }
        // Global entries are resolved through their inner results.
        Category::Global => Resolution::Absent,
    };

    let encrypted = if flags.encrypted {
        // Encrypt the converted value if there is one, else the literal
        // content. Nothing to encrypt means no attempt.
        let candidate = converted.value().unwrap_or(content);
        if candidate.is_empty() {
            Resolution::Absent
        } else {
            match &collaborators.obfuscator {
                Some(obfuscator) => match obfuscator.obfuscate(candidate).await {
                    Ok(value) => Resolution::Resolved(value),
                    Err(err) => {
                        warn!(token = content, error = %err, "obfuscator failed");
                        failure
                            .get_or_insert(ResolveFailure::ObfuscatorFailed(err.to_string()));
                        Resolution::Failed
                    }
                },
                None => {
                    failure.get_or_insert(ResolveFailure::MissingObfuscator);
                    Resolution::Absent
                }
            }
        }
    } else {
        Resolution::Absent
    };

    TokenOutcome {
        category,
        converted,
        encrypted,
        failure,
    }
}

/// A fully resolved parameter plus its single trace record.
pub struct ResolvedToken {
    pub item: ResolvedItem,
    pub trace: TraceRecord,
}

/// Resolve one `flags{content}` token: category lookup, collaborator calls,
/// value cascade, and exactly one trace record.
pub async fn resolve_pattern(
    original: &str,
    flags: FlagSet,
    content: &str,
    mode: ProcessingMode,
    table: &CategoryTable,
    collaborators: &Collaborators,
    ctx: &TraceContext,
) -> ResolvedToken {
    let outcome = resolve_token(content, &flags, table, collaborators).await;
    let value = final_value(
        original,
        Some(content),
        &outcome.converted,
        &outcome.encrypted,
        &flags,
    );

    let trace = TraceRecord {
        category: outcome.category,
        target: content.to_string(),
        converted_value: outcome.converted.value().map(str::to_string),
        encrypted_value: outcome.encrypted.value().map(str::to_string),
        result: value.clone(),
        location: ctx.location,
        identifier: ctx.identifier.clone(),
        flags,
        processing_mode: mode,
        success: outcome.failure.is_none(),
        failure_reason: outcome.failure.as_ref().map(|f| f.to_string()),
    };

    let item = ResolvedItem {
        original_value: original.to_string(),
        flags,
        category: outcome.category,
        extracted_value: Some(content.to_string()),
        converted_value: outcome.converted,
        encrypted_value: outcome.encrypted,
        final_value: value,
        processing_mode: mode,
    };

    ResolvedToken { item, trace }
}
