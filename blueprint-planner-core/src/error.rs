use serde_json::Value;
use thiserror::Error;

/// Failure to decode one transformation section.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{section}`: {reason}")]
pub struct SectionError {
    pub section: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{field} must be a JSON object, got {found}")]
    NotAnObject {
        field: &'static str,
        found: &'static str,
    },
    /// Every section that failed, in key order.
    #[error("transformation sections failed to decode: {}", join_sections(.0))]
    Sections(Vec<SectionError>),
}

fn join_sections(errors: &[SectionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a single scope entry could not be compiled.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("invalid clone URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{entity} requested but {missing} is missing")]
    MissingPrerequisite {
        entity: String,
        missing: &'static str,
    },
    #[error("failed to encode {plugin} options: {source}")]
    OptionEncoding {
        plugin: String,
        source: serde_json::Error,
    },
    #[error("no accumulator slot for this scope (accumulator holds {len})")]
    SlotOutOfRange { len: usize },
}

/// A compile failure tagged with the scope position it belongs to.
#[derive(Debug, Error)]
#[error("scope #{scope_index}: {kind}")]
pub struct PlanError {
    pub scope_index: usize,
    pub kind: CompileError,
}

/// Short name of a JSON value's type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
