// Resolved items and the value priority cascade

use serde::Serialize;

use crate::flags::{Category, FlagSet, ProcessingMode};

/// Outcome of one collaborator lookup.
///
/// `Absent` means the lookup was never attempted (flag unset, literal token,
/// collaborator not configured); `Failed` means it was attempted and the
/// collaborator rejected it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Absent,
    Resolved(String),
    Failed,
}

impl Resolution {
    pub fn value(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Base shape shared by path segments and query entries.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedItem {
    pub original_value: String,
    pub flags: FlagSet,
    pub category: Category,
    /// Bracket-interior text, or None if no bracket pattern matched.
    pub extracted_value: Option<String>,
    pub converted_value: Resolution,
    pub encrypted_value: Resolution,
    /// Never null, may be empty.
    pub final_value: String,
    pub processing_mode: ProcessingMode,
}

impl ResolvedItem {
    /// Build an item for a SUBSTITUTION-mode value whose final text came out
    /// of the nested substitution engine.
    pub fn substituted(original: &str, final_value: String) -> Self {
        Self {
            original_value: original.to_string(),
            flags: FlagSet::default(),
            category: Category::Unknown,
            extracted_value: None,
            converted_value: Resolution::Absent,
            encrypted_value: Resolution::Absent,
            final_value,
            processing_mode: ProcessingMode::Substitution,
        }
    }

    /// True if a DEFAULT-mode reconstruction drops this item: an empty
    /// PARAMETER final signals "exclude from output", while an empty
    /// SUBSTITUTION final is kept as an empty substitution.
    pub fn is_excluded(&self) -> bool {
        self.processing_mode == ProcessingMode::Parameter && self.final_value.is_empty()
    }
}

/// The priority cascade producing the final value for a resolved item.
///
/// Strict order: encrypted, converted, extracted (literal flag only), empty
/// string for non-literal leftovers in either mode, original value as the
/// last resort (reachable only for a literal flag with no extracted text).
pub fn final_value(
    original: &str,
    extracted: Option<&str>,
    converted: &Resolution,
    encrypted: &Resolution,
    flags: &FlagSet,
) -> String {
    if let Some(value) = encrypted.value() {
        return value.to_string();
    }
    if let Some(value) = converted.value() {
        return value.to_string();
    }
    if flags.literal {
        if let Some(value) = extracted {
            return value.to_string();
        }
        // Literal with nothing extracted: fall through to the original.
        return original.to_string();
    }
    String::new()
}
