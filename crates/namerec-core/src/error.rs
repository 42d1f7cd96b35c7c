//! Ingestion error types for namerec-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering every
//! way a corpus document can fail structural validation. The learning core
//! assumes a validated graph, so nothing malformed gets past this layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::label::Label;

/// Errors produced while turning JSON documents into program graphs.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level JSON value is not an object.
    #[error("document is not a JSON object")]
    NotAnObject,

    /// The `y_names` array is absent.
    #[error("document has no 'y_names' array")]
    MissingNodes,

    /// `y_names` is present but is not an array of strings.
    #[error("'y_names' is malformed: {source}")]
    MalformedNodes {
        #[source]
        source: serde_json::Error,
    },

    /// A node label is not of the form `<scopeId><divider><name>`.
    #[error("malformed label '{label}': {reason}")]
    MalformedLabel { label: String, reason: &'static str },

    /// An edge record has missing fields, wrong field types, or an unknown `type`.
    #[error("malformed edge '{edge}': {source}")]
    MalformedEdge {
        edge: String,
        #[source]
        source: serde_json::Error,
    },

    /// An edge references a variable that is not in the node sequence.
    #[error("edge '{edge}' references {label}, which is not among the nodes")]
    UnresolvedEndpoint { edge: String, label: Label },

    /// An identifier or relation contains the reserved divider character.
    #[error("'{text}' contains the reserved divider character")]
    ReservedDivider { text: String },

    /// A corpus path is neither a `.json` file nor a directory.
    #[error("not a JSON corpus path: {path}")]
    NotJson { path: PathBuf },

    /// Reading a corpus file or directory failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Wraps a document-level error with the file it came from.
    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<IngestError>,
    },
}
