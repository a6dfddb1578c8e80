use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while generating or reconciling table configuration.
///
/// Unclassifiable fields, unresolvable identifiers and missing baselines are
/// not errors; they degrade to partial output. Only a malformed schema graph,
/// unusable inputs and failed writes surface here.
#[derive(Debug, Error)]
pub enum TableConfigError {
    #[error("Schema `{name}` is referenced but not defined")]
    UnknownSchema { name: String },

    #[error("Schema `{name}` is defined as a reference cycle")]
    CyclicReference { name: String },

    #[error("Root entity `{name}` of operation `{operation}` is not an object schema")]
    InvalidRootEntity { operation: String, name: String },

    #[error("Failed to load the TypeScript grammar: {0}")]
    Parser(#[from] tree_sitter::LanguageError),

    #[error("Failed to parse generated TypeScript for `{path}`")]
    ParseFailed { path: PathBuf },

    #[error("Failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid API source: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid project configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
