//! Crate-level error types.

use thiserror::Error;

/// Errors surfaced directly to the mock's caller.
///
/// These are test-setup bugs, not protocol conditions; protocol failures
/// travel as HTTP status codes or per-key body results instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MockError {
    /// A seeded item lacks the resource's primary key field.
    #[error("item for resource '{resource}' is missing primary key field '{pk}'")]
    MissingPrimaryKey { resource: String, pk: String },
}
