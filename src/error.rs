/// Error types for graph construction.
use thiserror::Error;

/// Errors that can occur while parsing and indexing a source tree.
///
/// Unresolved imports and unresolved call targets are not errors: they leave
/// the graph without the corresponding edge.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("failed to load {language} grammar: {message}")]
    Grammar { language: String, message: String },

    #[error("failed to parse {0}")]
    GrammarParseFailure(String),

    #[error("invalid {language} query: {message}")]
    InvalidQuery { language: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
