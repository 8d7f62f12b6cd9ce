use thiserror::Error;

use crate::Definition;

/// Type alias for boxed errors that can be sent across threads.
///
/// Registered constructors, property setters and methods report their
/// failures with this type.
pub type StdError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while resolving a definition.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The lookup service has no entry with this identifier.
    #[error("Entry \"{0}\" not found")]
    EntryNotFound(String),
    /// The definition is malformed, e.g. a factory that is neither a type
    /// name nor a reference.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),
    /// No resolution rule matches the definition.
    #[error("Unsupported definition of kind \"{}\"", .0.kind())]
    UnsupportedDefinition(Box<Definition>),
    /// An entry refers back to itself through a chain of references.
    #[error("Circular reference: {}", .0.join(" -> "))]
    CircularReference(Vec<String>),
    #[error("Definition nesting exceeds the limit of {0} levels")]
    DepthExceeded(usize),
    #[error("Type \"{0}\" is not registered")]
    UnknownType(String),
    #[error("Type \"{0}\" has no registered constructor")]
    NotConstructible(String),
    #[error("Type \"{type_name}\" has no property \"{property}\"")]
    UnknownProperty { type_name: String, property: String },
    #[error("Type \"{type_name}\" has no method \"{method}\"")]
    UnknownMethod { type_name: String, method: String },
    /// A registered constructor, setter or method failed.
    #[error("{type_name}::{member} failed: {source}")]
    Invocation {
        type_name: String,
        member: String,
        source: StdError,
    },
}
