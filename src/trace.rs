// Transformation traces
//
// Every resolution attempt produces exactly one record. Records are
// append-only and immutable; within one segment or query entry the order is
// deterministic (inner substitutions before the entry's own outer trace).

use serde::Serialize;

use crate::flags::{Category, FlagSet, ProcessingMode};

/// Where a resolution happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLocation {
    Url,
    Query,
}

/// Structured record of one resolution attempt.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub category: Category,
    /// The token or block the attempt was made on.
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_value: Option<String>,
    /// The final value that ended up in the output.
    pub result: String,
    pub location: TraceLocation,
    /// The query key or raw path segment this attempt belongs to.
    pub identifier: String,
    pub flags: FlagSet,
    pub processing_mode: ProcessingMode,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}
