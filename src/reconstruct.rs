// Output reconstruction and filtering

use serde::{Deserialize, Serialize};

use crate::flags::{Category, ProcessingMode};
use crate::query::QueryEntry;
use crate::segment::Segment;
use crate::trace::TraceRecord;
use crate::value::ResolvedItem;

/// Which items make it into the reconstructed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterMode {
    /// Keep everything resolvable; drop only PARAMETER entries that
    /// resolved to nothing.
    #[default]
    Default,
    /// Keep only plain text and explicitly literal content; anything that
    /// required active resolution is dropped.
    Strict,
}

fn has_bracket_syntax(s: &str) -> bool {
    s.contains('{') || s.contains('}')
}

/// Whether an entry survives filtering. `original` is the raw text the item
/// was parsed from; `traces` are the records its resolution produced.
pub fn keeps(
    item: &ResolvedItem,
    original: &str,
    traces: &[TraceRecord],
    mode: FilterMode,
) -> bool {
    if item.is_excluded() {
        return false;
    }

    match mode {
        FilterMode::Default => true,
        FilterMode::Strict => {
            !has_bracket_syntax(original)
                || item.flags.literal
                || (item.processing_mode == ProcessingMode::Substitution
                    && traces
                        .iter()
                        .all(|trace| trace.category == Category::Literal && trace.success))
        }
    }
}

/// Assemble the reconstructed path and the full output string.
pub fn reconstruct(
    base: &str,
    original_path: &str,
    segments: &[(Segment, Vec<TraceRecord>)],
    entries: &[(QueryEntry, Vec<TraceRecord>)],
    mode: FilterMode,
) -> (String, String) {
    let kept: Vec<&str> = segments
        .iter()
        .filter(|(segment, traces)| keeps(&segment.item, &segment.raw, traces, mode))
        .map(|(segment, _)| segment.item.final_value.as_str())
        .collect();

    let joined = kept.join("/");
    let path = if original_path.starts_with('/') {
        format!("/{}", joined)
    } else {
        joined
    };

    let parts: Vec<String> = entries
        .iter()
        .filter(|(entry, traces)| {
            keeps(entry.item(), &entry.item().original_value, traces, mode)
        })
        .map(|(entry, _)| match entry.key() {
            Some(key) => format!("{}={}", key, entry.final_value()),
            // The keyless global wrapper contributes its value alone.
            None => entry.final_value().to_string(),
        })
        .collect();

    let mut output = format!("{}{}", base, path);
    if !parts.is_empty() {
        output.push('?');
        output.push_str(&parts.join("&"));
    }

    (path, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;
    use crate::value::Resolution;

    fn item(mode: ProcessingMode, final_value: &str) -> ResolvedItem {
        ResolvedItem {
            original_value: String::new(),
            flags: FlagSet::default(),
            category: Category::Unknown,
            extracted_value: None,
            converted_value: Resolution::Absent,
            encrypted_value: Resolution::Absent,
            final_value: final_value.to_string(),
            processing_mode: mode,
        }
    }

    #[test]
    fn test_default_drops_empty_parameters_only() {
        let empty_param = item(ProcessingMode::Parameter, "");
        let empty_subst = item(ProcessingMode::Substitution, "");
        assert!(!keeps(&empty_param, "{X}", &[], FilterMode::Default));
        assert!(keeps(&empty_subst, "text", &[], FilterMode::Default));
    }

    #[test]
    fn test_strict_keeps_plain_text() {
        let plain = item(ProcessingMode::Substitution, "plain");
        assert!(keeps(&plain, "plain", &[], FilterMode::Strict));
    }

    #[test]
    fn test_strict_drops_resolved_brackets() {
        let resolved = item(ProcessingMode::Parameter, "NAME_VALUE");
        assert!(!keeps(&resolved, "{NAME}", &[], FilterMode::Strict));
    }

    #[test]
    fn test_strict_keeps_literal_flag() {
        let mut literal = item(ProcessingMode::Parameter, "X");
        literal.flags.literal = true;
        assert!(keeps(&literal, "v{X}", &[], FilterMode::Strict));
    }
}
