//! Import statements, export clauses and import path resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::code_parser::{Capture, CodeParser, ParsedSource};
use super::languages::Language;
use crate::graph::{ImportName, ImportStatement, NodeArena, NodeType};
use crate::queries::QueryKind;

/// One pattern match inside an import statement.
#[derive(Debug, Default)]
struct ImportPart {
    module: String,
    name: Option<String>,
    alias: Option<String>,
    wildcard: bool,
    start_byte: usize,
}

struct StatementDraft {
    statement: Capture,
    parts: Vec<ImportPart>,
}

/// Groups the import captures of a file into statements.
///
/// Matches are grouped by their `@import_statement` node, then by module in
/// first-seen order. Statements come out in source order.
pub fn generate_import_statements(parser: &CodeParser, parsed: &ParsedSource<'_>) -> Vec<ImportStatement> {
    let captures: Vec<Capture> = parser
        .syntax_captures(parsed, QueryKind::ImportStatements, parsed.root())
        .iter()
        .map(|c| c.to_capture(parsed.source))
        .collect();

    let mut by_match: BTreeMap<usize, Vec<&Capture>> = BTreeMap::new();
    for capture in &captures {
        by_match.entry(capture.match_id).or_default().push(capture);
    }

    let mut drafts: BTreeMap<(usize, usize), StatementDraft> = BTreeMap::new();
    for group in by_match.values() {
        let Some(statement) = group.iter().find(|c| c.label == "import_statement") else {
            continue;
        };
        let Some(module) = group.iter().find(|c| c.label == "module") else {
            continue;
        };
        let mut part = ImportPart {
            module: clean_module(&module.text),
            start_byte: module.start_byte,
            ..Default::default()
        };
        for capture in group {
            match capture.label.as_str() {
                "name" => {
                    part.name = Some(capture.text.clone());
                    part.start_byte = capture.start_byte;
                }
                "alias" => part.alias = Some(capture.text.clone()),
                "wildcard" => part.wildcard = true,
                _ => {}
            }
        }
        if parsed.language == Language::Php && part.name.is_none() {
            split_namespace_use(&mut part, &statement.text);
        }
        drafts
            .entry((statement.start_byte, statement.end_byte))
            .or_insert_with(|| StatementDraft {
                statement: (*statement).clone(),
                parts: Vec::new(),
            })
            .parts
            .push(part);
    }

    drafts.into_values().flat_map(build_statements).collect()
}

fn build_statements(draft: StatementDraft) -> Vec<ImportStatement> {
    let StatementDraft { statement, mut parts } = draft;
    // `import a.b.*` also matches the plain patterns; the wildcard reading wins
    if parts.iter().any(|p| p.wildcard) {
        parts.retain(|p| p.wildcard);
    }
    parts.sort_by_key(|p| p.start_byte);

    let mut out: Vec<ImportStatement> = Vec::new();
    for part in parts {
        let index = match out.iter().position(|s| s.module == part.module) {
            Some(i) => i,
            None => {
                out.push(ImportStatement {
                    module: part.module.clone(),
                    code: statement.text.clone(),
                    start_position: statement.start,
                    end_position: statement.end,
                    ..Default::default()
                });
                out.len() - 1
            }
        };
        let entry = &mut out[index];
        entry.wildcard |= part.wildcard;
        match (part.name, part.alias) {
            (Some(name), alias) => {
                let alias = alias.unwrap_or_default();
                match entry.names.iter_mut().find(|n| n.name == name) {
                    Some(existing) if !alias.is_empty() => existing.alias = alias,
                    Some(_) => {}
                    None => entry.names.push(ImportName {
                        name,
                        alias,
                        subpath: String::new(),
                    }),
                }
            }
            (None, Some(alias)) => entry.module_alias = alias,
            (None, None) => {}
        }
    }

    for entry in &mut out {
        if entry.names.is_empty() && entry.module_alias.is_empty() {
            entry.module_alias = entry.module.clone();
        }
    }
    out
}

fn clean_module(text: &str) -> String {
    let text = text.trim();
    if text.starts_with('<') {
        return text.to_string();
    }
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

/// `use App\Models\User;` imports `User` from `App\Models`.
fn split_namespace_use(part: &mut ImportPart, statement: &str) {
    if !statement.trim_start().starts_with("use") {
        return;
    }
    let module = part.module.trim_start_matches('\\').to_string();
    if let Some((prefix, name)) = module.rsplit_once('\\') {
        part.module = prefix.to_string();
        part.name = Some(name.to_string());
    } else {
        part.module = module;
    }
}

/// Applies `export { a as b }` clauses to the file's top-level nodes.
pub fn apply_export_clauses(parser: &CodeParser, parsed: &ParsedSource<'_>, arena: &mut NodeArena, file: usize) {
    let captures = parser.syntax_captures(parsed, QueryKind::ExportClauses, parsed.root());
    let mut clauses: BTreeMap<usize, (String, String)> = BTreeMap::new();
    for capture in &captures {
        let entry = clauses.entry(capture.match_id).or_default();
        let text = parsed.text(capture.node).to_string();
        match capture.label.as_str() {
            "name" => entry.0 = text,
            "alias" => entry.1 = text,
            _ => {}
        }
    }

    for (name, alias) in clauses.into_values() {
        if name.is_empty() {
            continue;
        }
        let target = arena
            .children(file)
            .iter()
            .copied()
            .find(|&c| arena.get(c).node_type != NodeType::Export && arena.get(c).name == name);
        if let Some(target) = target {
            let node = arena.get_mut(target);
            if !alias.is_empty() {
                node.alias = alias;
            }
            node.exportable = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecifierKind {
    Relative,
    Absolute,
    Root,
    Bare,
}

/// Maps import specifiers onto the files of one codebase.
#[derive(Debug, Default)]
pub struct ImportResolver {
    root: PathBuf,
    files: BTreeSet<String>,
    /// Extension-less path to file ids; `util.c` and `util.h` share one.
    stems: BTreeMap<String, Vec<String>>,
}

impl ImportResolver {
    pub fn new(root: impl Into<PathBuf>, files: impl IntoIterator<Item = String>) -> Self {
        let files: BTreeSet<String> = files.into_iter().collect();
        let mut stems: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for file in &files {
            stems.entry(strip_extension(file)).or_default().push(file.clone());
        }
        Self {
            root: root.into(),
            files,
            stems,
        }
    }

    /// First file id whose extension-less path is `stem`.
    pub fn file_for_stem(&self, stem: &str) -> Option<&str> {
        self.files_for_stem(stem).first().map(String::as_str)
    }

    pub fn files_for_stem(&self, stem: &str) -> &[String] {
        self.stems.get(stem).map(Vec::as_slice).unwrap_or_default()
    }

    /// Files directly inside `dir`.
    pub fn files_in_dir(&self, dir: &str) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| Path::new(f).parent().is_some_and(|p| p == Path::new(dir)))
            .map(String::as_str)
            .collect()
    }

    /// Fills `path` and the names' `subpath`. Returns whether the statement
    /// points at something in the codebase.
    pub fn resolve(&self, importer: &str, language: Language, statement: &mut ImportStatement) -> bool {
        let Some((spec, kind)) = specifier_path(language, &statement.module) else {
            return false;
        };
        let importer_dir = Path::new(importer).parent().unwrap_or(Path::new("/"));
        let bases: Vec<String> = match kind {
            SpecifierKind::Relative => vec![join(importer_dir, &spec)],
            SpecifierKind::Absolute => vec![normalize(Path::new(&spec)), join(&self.root, spec.trim_start_matches('/'))],
            SpecifierKind::Root => vec![join(&self.root, &spec)],
            SpecifierKind::Bare => vec![join(importer_dir, &spec), join(&self.root, &spec)],
        };
        let by_suffix = kind == SpecifierKind::Bare && language.resolves_by_suffix();

        let module = bases
            .iter()
            .find_map(|base| self.match_target(base, language))
            .or_else(|| by_suffix.then(|| self.match_suffix(&spec)).flatten());
        if let Some(stem) = &module {
            statement.path = stem.clone();
        } else if statement.wildcard {
            // `import a.b.*` names a package directory
            if let Some(dir) = bases
                .iter()
                .find(|base| !self.files_in_dir(base).is_empty())
                .cloned()
                .or_else(|| by_suffix.then(|| self.match_dir_suffix(&spec)).flatten())
            {
                statement.path = dir;
            }
        }

        let dirs: Vec<String> = match &module {
            Some(stem) => vec![module_dir(stem, language)],
            None => bases,
        };
        for name in &mut statement.names {
            let found = dirs
                .iter()
                .find_map(|dir| self.match_target(&format!("{dir}/{}", name.name), language))
                .or_else(|| {
                    by_suffix
                        .then(|| self.match_suffix(&format!("{spec}/{}", name.name)))
                        .flatten()
                });
            if let Some(subpath) = found {
                if statement.path.is_empty() {
                    statement.path = Path::new(&subpath)
                        .parent()
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_default();
                }
                name.subpath = subpath;
            }
        }

        if !statement.is_resolved() {
            debug!("{importer}: unresolved import {}", statement.module);
        }
        statement.is_resolved()
    }

    /// Extension-less path of the first existing file for `candidate`.
    fn match_target(&self, candidate: &str, language: Language) -> Option<String> {
        if self.files.contains(candidate) {
            return Some(strip_extension(candidate));
        }
        let extensions = language.resolution_extensions();
        if let Some(stem) = extensions
            .iter()
            .any(|ext| self.files.contains(&format!("{candidate}.{ext}")))
            .then(|| candidate.to_string())
        {
            return Some(stem);
        }
        let suffix = language.index_suffix()?;
        let index = format!("{candidate}{suffix}");
        extensions
            .iter()
            .any(|ext| self.files.contains(&format!("{index}.{ext}")))
            .then_some(index)
    }

    fn match_suffix(&self, spec: &str) -> Option<String> {
        let tail = format!("/{}", spec.trim_start_matches('/'));
        self.stems.keys().find(|stem| stem.ends_with(&tail)).cloned()
    }

    fn match_dir_suffix(&self, spec: &str) -> Option<String> {
        let tail = format!("/{}", spec.trim_start_matches('/'));
        self.files
            .iter()
            .filter_map(|f| Path::new(f).parent())
            .map(|p| p.to_string_lossy().into_owned())
            .find(|dir| dir.ends_with(&tail))
    }
}

/// Specifier rewritten as a path, or `None` when it never names a file.
fn specifier_path(language: Language, module: &str) -> Option<(String, SpecifierKind)> {
    let spec = match language {
        Language::C if module.starts_with('<') => return None,
        Language::Python => {
            let dots = module.chars().take_while(|&c| c == '.').count();
            let rest = module[dots..].replace('.', "/");
            match dots {
                0 => rest,
                1 if rest.is_empty() => ".".to_string(),
                1 => format!("./{rest}"),
                n => {
                    let up = "../".repeat(n - 1);
                    if rest.is_empty() {
                        up.trim_end_matches('/').to_string()
                    } else {
                        format!("{up}{rest}")
                    }
                }
            }
        }
        Language::Java => module.replace('.', "/"),
        Language::Php => module.replace('\\', "/"),
        _ => module.to_string(),
    };
    if spec.is_empty() {
        return None;
    }

    let kind = if spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../") {
        SpecifierKind::Relative
    } else if let Some(rest) = spec.strip_prefix("@/") {
        return Some((rest.to_string(), SpecifierKind::Root));
    } else if spec.starts_with('/') {
        SpecifierKind::Absolute
    } else {
        SpecifierKind::Bare
    };
    Some((spec, kind))
}

fn module_dir(stem: &str, language: Language) -> String {
    language
        .index_suffix()
        .and_then(|suffix| stem.strip_suffix(suffix))
        .unwrap_or(stem)
        .to_string()
}

fn strip_extension(path: &str) -> String {
    Path::new(path).with_extension("").to_string_lossy().into_owned()
}

fn join(base: &Path, spec: &str) -> String {
    normalize(&base.join(spec))
}

/// Lexical normalisation; the file system is never consulted.
fn normalize(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().into_owned()
}
