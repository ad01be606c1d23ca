use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::queries::{self, QueryBundle};

/// Suffixes never indexed even when the extension is registered.
pub const EXCLUDED_SUFFIXES: &[&str] = &[".min.js", ".min.css", ".min.js.map", ".min.css.map", ".d.ts"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Java,
    C,
    Php,
}

impl Language {
    pub fn get_all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
            Language::Java,
            Language::C,
            Language::Php,
        ]
    }

    pub fn get_by_extension(ext: &str) -> Option<Language> {
        Self::get_all()
            .iter()
            .copied()
            .find(|l| l.extensions().contains(&ext))
    }

    pub fn get_by_name(name: &str) -> Option<Language> {
        Self::get_all().iter().copied().find(|l| l.name() == name)
    }

    /// Picks the grammar for a file path.
    pub fn from_path(path: &str) -> Result<Language, GraphError> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::get_by_extension(ext).ok_or_else(|| GraphError::UnsupportedLanguage(path.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Java => "java",
            Language::C => "c",
            Language::Php => "php",
        }
    }

    pub fn grammar(&self) -> tree_sitter::Language {
        match self {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Java => tree_sitter_java::LANGUAGE.into(),
            Language::C => tree_sitter_c::LANGUAGE.into(),
            Language::Php => tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }

    pub fn queries(&self) -> &'static QueryBundle {
        match self {
            Language::Python => &queries::python::QUERIES,
            Language::JavaScript => &queries::javascript::QUERIES,
            Language::TypeScript | Language::Tsx => &queries::typescript::QUERIES,
            Language::Java => &queries::java::QUERIES,
            Language::C => &queries::c::QUERIES,
            Language::Php => &queries::php::QUERIES,
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "mts", "cts"],
            Language::Tsx => &["tsx"],
            Language::Java => &["java"],
            Language::C => &["c", "h"],
            Language::Php => &["php"],
        }
    }

    /// Extensions tried, in order, when an import specifier omits one.
    pub fn resolution_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::JavaScript => &["js", "jsx", "mjs", "cjs", "ts", "tsx"],
            Language::TypeScript | Language::Tsx => &["ts", "tsx", "js", "jsx", "mts", "cts"],
            Language::C => &["h", "c"],
            other => other.extensions(),
        }
    }

    /// Name of the member that initialises instances. Java constructors
    /// carry the class name and are matched separately.
    pub fn constructor_name(&self) -> Option<&'static str> {
        match self {
            Language::Python => Some("__init__"),
            Language::JavaScript | Language::TypeScript | Language::Tsx => Some("constructor"),
            Language::Php => Some("__construct"),
            Language::Java | Language::C => None,
        }
    }

    pub fn self_token(&self) -> Option<&'static str> {
        match self {
            Language::Python => Some("self"),
            Language::JavaScript | Language::TypeScript | Language::Tsx | Language::Java => {
                Some("this")
            }
            Language::Php => Some("$this"),
            Language::C => None,
        }
    }

    /// Module file that stands for its directory.
    pub fn index_suffix(&self) -> Option<&'static str> {
        match self {
            Language::Python => Some("/__init__"),
            Language::JavaScript | Language::TypeScript | Language::Tsx => Some("/index"),
            _ => None,
        }
    }

    /// JS and TS definitions are private until exported.
    pub fn exports_by_default(&self) -> bool {
        !self.is_javascript_like()
    }

    pub fn is_javascript_like(&self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::TypeScript | Language::Tsx
        )
    }

    pub fn uses_indentation(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Whether bare specifiers may match any file ending with the path.
    pub fn resolves_by_suffix(&self) -> bool {
        matches!(self, Language::Python | Language::Java | Language::Php)
    }

    /// `#include` and `require` bring every top-level name into scope.
    pub fn includes_whole_file(&self) -> bool {
        matches!(self, Language::C | Language::Php)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a path ends with one of [`EXCLUDED_SUFFIXES`].
pub fn is_excluded_file(path: &str) -> bool {
    EXCLUDED_SUFFIXES.iter().any(|s| path.ends_with(s))
}
