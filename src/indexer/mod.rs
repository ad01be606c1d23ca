//! From source text to a linked graph: parsing, definitions, imports and
//! calls.

pub mod code_parser;
pub mod core;
pub mod definitions;
pub mod imports;
pub mod languages;
pub mod relations;

pub use self::core::{Codebase, IndexStats, SourceFile, index_folder};
