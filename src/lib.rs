//! # codegraph: multi-language code graph builder
//!
//! Parses a source tree with Tree-sitter and emits its entities (files,
//! classes, functions, methods, globals, ...) as nodes, linked by
//! containment (`defines`) and call (`calls`) edges.
//!
//! ## Architecture
//!
//! - **[`config`]**: Configuration loading, validation, and path exclusions
//! - **[`queries`]**: Per-language Tree-sitter query bundles
//! - **[`graph`]**: Nodes, the per-file arena, and the serialised output form
//! - **[`indexer`]**: Parsing, definition extraction, import resolution, call resolution
//! - **[`error`]**: Library error type

pub mod config;
pub mod error;
pub mod graph;
pub mod indexer;
pub mod queries;

pub use error::{GraphError, Result};
pub use indexer::{Codebase, IndexStats, SourceFile};
