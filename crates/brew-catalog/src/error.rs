//! Error types for catalog loading

use thiserror::Error;

/// Errors that can occur while loading or querying the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to retrieve the catalog document
    #[error("failed to fetch catalog from {location}: {reason}")]
    FetchFailed { location: String, reason: String },

    /// Catalog document is not valid JSON or does not match the schema
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two entries of the same kind share an identifier
    #[error("duplicate {kind} id {id} in catalog")]
    DuplicateId { kind: &'static str, id: u32 },

    /// Lookup by identifier found nothing
    #[error("{kind} {id} not found in catalog")]
    NotFound { kind: &'static str, id: u32 },
}
