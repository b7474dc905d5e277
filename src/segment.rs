// Path segment pipeline

use futures::future::join_all;
use serde::Serialize;

use crate::collaborators::Collaborators;
use crate::config::CategoryTable;
use crate::flags::ProcessingMode;
use crate::pattern;
use crate::resolve::{resolve_pattern, TraceContext};
use crate::substitution::substitute;
use crate::trace::{TraceLocation, TraceRecord};
use crate::value::ResolvedItem;

/// One path segment with its resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    /// The raw segment text as it appeared in the path.
    pub raw: String,
    #[serde(flatten)]
    pub item: ResolvedItem,
}

/// Split the path on `/`, drop empty segments, and resolve each one.
/// Segments are independent and resolve concurrently; order is preserved.
pub async fn process_path(
    path: &str,
    table: &CategoryTable,
    collaborators: &Collaborators,
) -> Vec<(Segment, Vec<TraceRecord>)> {
    let futures = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| resolve_segment(segment, table, collaborators));

    join_all(futures).await
}

async fn resolve_segment(
    raw: &str,
    table: &CategoryTable,
    collaborators: &Collaborators,
) -> (Segment, Vec<TraceRecord>) {
    let ctx = TraceContext::new(TraceLocation::Url, raw);

    let (item, traces) = match pattern::extract_parameter(raw) {
        Some(found) => {
            let token = resolve_pattern(
                raw,
                found.flags,
                found.content,
                ProcessingMode::Parameter,
                table,
                collaborators,
                &ctx,
            )
            .await;
            (token.item, vec![token.trace])
        }
        None => {
            let (value, traces) = substitute(raw, table, collaborators, &ctx).await;
            (ResolvedItem::substituted(raw, value), traces)
        }
    };

    (
        Segment {
            raw: raw.to_string(),
            item,
        },
        traces,
    )
}
