// Resolution failure taxonomy
//
// None of these ever propagate out of the engine as errors. They are caught
// at the call site, recorded on the trace as `failure_reason`, and the value
// cascade falls back to the next tier.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveFailure {
    #[error("token '{0}' is not in any category list and has no literal flag")]
    UnknownCategory(String),

    #[error("no category resolver configured")]
    MissingResolver,

    #[error("no obfuscator configured")]
    MissingObfuscator,

    #[error("category resolver failed: {0}")]
    ResolverFailed(String),

    #[error("obfuscator failed: {0}")]
    ObfuscatorFailed(String),
}
