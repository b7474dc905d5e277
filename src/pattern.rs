// Bracket pattern extraction and processing-mode classification
//
// The binary PARAMETER/SUBSTITUTION decision made here is the principal
// branch point of the engine: a PARAMETER value hands its bracket interior
// straight to the category resolver, a SUBSTITUTION value is scanned for
// embedded groups and resolved piecewise.

use crate::flags::{is_flag_char, FlagSet, ProcessingMode};

/// A whole-string `flags{content}` match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern<'a> {
    pub flags: FlagSet,
    pub content: &'a str,
}

/// Split `value` into flag prefix and bracket interior if the entire string
/// has the form `flags{content}`: an all-flag-letter prefix, then a `{`
/// matched by the final character.
///
/// The interior may itself contain balanced bracket groups; callers that
/// need a bracket-free interior check separately.
fn split_whole_form(value: &str) -> Option<(&str, &str)> {
    let open = value.find('{')?;
    let prefix = &value[..open];
    if !prefix.chars().all(is_flag_char) {
        return None;
    }
    if !value.ends_with('}') {
        return None;
    }

    let content = &value[open + 1..value.len() - 1];

    // The group opened after the prefix must stay open until the last char;
    // otherwise the trailing '}' belongs to some other group (`e{a}&b={c}`).
    let mut depth = 1u32;
    for ch in content.chars() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return None;
                }
            }
            _ => {}
        }
    }

    Some((prefix, content))
}

/// Extract the single-level parameter shape: the whole value is
/// `flags{content}` and the content contains no bracket region.
pub fn extract_parameter(value: &str) -> Option<Pattern<'_>> {
    let (prefix, content) = split_whole_form(value)?;
    if content.contains('{') || content.contains('}') {
        return None;
    }
    Some(Pattern {
        flags: FlagSet::parse(prefix),
        content,
    })
}

/// Detect the whole-query global wrapper: the entire string is
/// `flags{content}` with at least one flag set. The content may contain
/// nested groups.
pub fn extract_global(query: &str) -> Option<Pattern<'_>> {
    let (prefix, content) = split_whole_form(query)?;
    let flags = FlagSet::parse(prefix);
    if !flags.any() {
        return None;
    }
    Some(Pattern { flags, content })
}

/// Decide how a segment or query value is processed.
pub fn classify(value: &str) -> ProcessingMode {
    if extract_parameter(value).is_some() {
        ProcessingMode::Parameter
    } else {
        ProcessingMode::Substitution
    }
}
