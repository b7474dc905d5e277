// Nested substitution engine
//
// Resolves possibly-nested bracket groups embedded anywhere in a string.
// Each scan finds the first `}` that closes an open group; the popped `{` is
// the most recent open, so the interior is bracket-free and the group is an
// innermost one. The group is resolved, its final value spliced over the
// whole flagged region, and the scan restarts. Scanning repeats until a pass
// finds nothing, so outer groups are completed on later passes. Unbalanced
// bracket text is left alone. A pass ceiling bounds the loop when a resolver
// keeps producing new bracket groups.

use tracing::{debug, warn};

use crate::collaborators::Collaborators;
use crate::config::CategoryTable;
use crate::flags::{is_flag_char, FlagSet, ProcessingMode};
use crate::resolve::{resolve_pattern, TraceContext};
use crate::trace::TraceRecord;

/// Byte offsets of one resolvable group.
struct Group {
    flag_start: usize,
    open: usize,
    close: usize,
}

/// Substitute every well-formed bracket group in `input`, innermost first.
/// Returns the fully substituted string and one trace per resolved group.
pub async fn substitute(
    input: &str,
    table: &CategoryTable,
    collaborators: &Collaborators,
    ctx: &TraceContext,
) -> (String, Vec<TraceRecord>) {
    let mut current = input.to_string();
    let mut traces = Vec::new();

    // The input holds fewer groups than it has characters, so more passes
    // than that means resolved values are re-introducing brackets.
    let max_passes = input.len().max(16);
    let mut passes = 0;

    while let Some(group) = find_innermost(&current) {
        if passes == max_passes {
            warn!(
                remaining = %current,
                "substitution did not stabilize, leaving remaining groups as text"
            );
            break;
        }
        passes += 1;

        let flag_str = &current[group.flag_start..group.open];
        let content = &current[group.open + 1..group.close];
        let original = &current[group.flag_start..=group.close];
        let flags = FlagSet::parse(flag_str);

        let token = resolve_pattern(
            original,
            flags,
            content,
            ProcessingMode::Substitution,
            table,
            collaborators,
            ctx,
        )
        .await;

        debug!(
            group = original,
            value = %token.item.final_value,
            "substituted bracket group"
        );

        current = format!(
            "{}{}{}",
            &current[..group.flag_start],
            token.item.final_value,
            &current[group.close + 1..]
        );
        traces.push(token.trace);
    }

    (current, traces)
}

/// One left-to-right scan: stack of open positions, resolve at the first
/// close that pops something. Returns None when no completed group remains.
fn find_innermost(s: &str) -> Option<Group> {
    let mut stack: Vec<usize> = Vec::new();

    for (i, ch) in s.char_indices() {
        match ch {
            '{' => stack.push(i),
            '}' => {
                // A stray close with nothing open is ordinary text.
                if let Some(open) = stack.pop() {
                    return Some(Group {
                        flag_start: collect_flags_before(s, open),
                        open,
                        close: i,
                    });
                }
            }
            _ => {}
        }
    }

    None
}

/// Walk backward from the `{` at `open` over contiguous flag letters to find
/// the start of the flag region.
///
/// Backward-greedy by design of the grammar: literal text that happens to end
/// in `e`/`r`/`v` is read as flags, so `over{NAME}` contributes the flag
/// string `ver`. Known limitation, kept as-is.
fn collect_flags_before(s: &str, open: usize) -> usize {
    let mut start = open;
    for (i, ch) in s[..open].char_indices().rev() {
        if is_flag_char(ch) {
            start = i;
        } else {
            break;
        }
    }
    start
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::collaborators::{CategoryResolver, Obfuscator};
    use crate::flags::Category;
    use crate::trace::TraceLocation;

    struct SuffixResolver;

    #[async_trait]
    impl CategoryResolver for SuffixResolver {
        async fn resolve(&self, token: &str, _category: Category) -> anyhow::Result<String> {
            Ok(format!("{}_VALUE", token))
        }
    }

    struct TagObfuscator;

    #[async_trait]
    impl Obfuscator for TagObfuscator {
        async fn obfuscate(&self, value: &str) -> anyhow::Result<String> {
            Ok(format!("ENC[{}]", value))
        }
    }

    fn table() -> CategoryTable {
        CategoryTable::new(
            vec!["NAME".to_string(), "A".to_string(), "B".to_string()],
            vec!["DATE".to_string()],
        )
        .unwrap()
    }

    fn ctx() -> TraceContext {
        TraceContext::new(TraceLocation::Url, "test")
    }

    fn with_resolver() -> Collaborators {
        Collaborators::new().with_resolver(Arc::new(SuffixResolver))
    }

    #[tokio::test]
    async fn test_embedded_group() {
        let (result, traces) =
            substitute("PROC=!@r{NAME}", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "PROC=!@NAME_VALUE");
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].target, "NAME");
        assert_eq!(traces[0].result, "NAME_VALUE");
        assert!(traces[0].success);
        assert!(traces[0].flags.required);
    }

    #[tokio::test]
    async fn test_no_groups_is_identity() {
        let (result, traces) = substitute("plain/text", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "plain/text");
        assert!(traces.is_empty());
    }

    #[tokio::test]
    async fn test_multiple_groups_left_to_right() {
        let (result, traces) =
            substitute("x{A}-{B}y", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "xA_VALUE-B_VALUEy");
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].target, "A");
        assert_eq!(traces[1].target, "B");
    }

    #[tokio::test]
    async fn test_nested_groups_innermost_first() {
        // Inner {A} resolves first; the outer group then holds plain text,
        // which is unknown and substitutes to empty.
        let (result, traces) =
            substitute("x{pre-{A}}y", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "xy");
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].target, "A");
        assert!(traces[0].success);
        assert_eq!(traces[1].target, "pre-A_VALUE");
        assert!(!traces[1].success);
    }

    #[tokio::test]
    async fn test_literal_group_keeps_content() {
        let (result, traces) =
            substitute("a-v{anything}-b", &table(), &Collaborators::new(), &ctx()).await;
        assert_eq!(result, "a-anything-b");
        assert_eq!(traces[0].category, Category::Literal);
        assert!(traces[0].success);
    }

    #[tokio::test]
    async fn test_encrypted_group() {
        let collaborators = with_resolver().with_obfuscator(Arc::new(TagObfuscator));
        let (result, _) = substitute("id=e{NAME}", &table(), &collaborators, &ctx()).await;
        assert_eq!(result, "id=ENC[NAME_VALUE]");
    }

    #[tokio::test]
    async fn test_unbalanced_brackets_left_as_text() {
        let (result, traces) =
            substitute("broken{NAME", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "broken{NAME");
        assert!(traces.is_empty());

        let (result, traces) = substitute("}odd", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "}odd");
        assert!(traces.is_empty());
    }

    #[tokio::test]
    async fn test_stray_close_then_group() {
        let (result, _) = substitute("}{NAME}", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "}NAME_VALUE");
    }

    #[tokio::test]
    async fn test_backward_greedy_flag_scan() {
        // "over" ends in flag letters, so `ver` is consumed as flags and the
        // group resolves as a literal. Documented grammar limitation.
        let (result, traces) =
            substitute("over{NAME}", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "oNAME");
        assert!(traces[0].flags.literal);
        assert!(traces[0].flags.encrypted);
        assert!(traces[0].flags.required);
    }

    struct ReentrantResolver;

    #[async_trait]
    impl CategoryResolver for ReentrantResolver {
        async fn resolve(&self, token: &str, _category: Category) -> anyhow::Result<String> {
            Ok(format!("{{{}}}", token))
        }
    }

    #[tokio::test]
    async fn test_resolver_reintroducing_brackets_terminates() {
        // Every resolution puts the group right back, so the loop can never
        // stabilize; the pass ceiling ends it with the group left as text.
        let collaborators = Collaborators::new().with_resolver(Arc::new(ReentrantResolver));
        let (result, traces) = substitute("x{NAME}y", &table(), &collaborators, &ctx()).await;
        assert_eq!(result, "x{NAME}y");
        assert!(!traces.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_group_substitutes_empty() {
        let (result, traces) =
            substitute("a{WHAT}b", &table(), &with_resolver(), &ctx()).await;
        assert_eq!(result, "ab");
        assert!(!traces[0].success);
    }
}
