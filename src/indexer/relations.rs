use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use tracing::{debug, warn};

use super::code_parser::{Capture, CodeParser};
use super::languages::Language;
use crate::graph::{ImportStatement, Node, NodeType};
use crate::queries::QueryKind;

static DOTTED_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid pattern")
});

static TYPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*").expect("valid pattern")
});

/// Capture labels naming call targets.
const TARGET_LABELS: &[&str] = &["identifier.name", "parameter_type", "return_type"];

/// Characters a substituted right-hand side may not contain.
const REJECTED_RIGHT: &[char] = &['"', '\'', '`', '[', ']', '(', ')', '{', '}'];

/// Names visible inside one file, mapped to node ids.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: HashMap<String, String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a local name; locals replace whatever an import put there.
    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.entries.insert(name, id.into());
        }
    }

    /// Registers an imported name unless something already owns it.
    pub fn insert_import(&mut self, name: impl Into<String>, id: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.entries.entry(name).or_insert_with(|| id.into());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact match first, then the longest prefix of at least two segments.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        if let Some(id) = self.get(token) {
            return Some(id);
        }
        let segments: Vec<&str> = token.split('.').collect();
        (2..segments.len())
            .rev()
            .find_map(|k| self.get(&segments[..k].join(".")))
    }
}

/// Token a namespace import is referred to by once aliases are substituted.
pub fn namespace_token(statement: &ImportStatement) -> &str {
    if is_dotted_identifier(&statement.module) {
        &statement.module
    } else {
        &statement.module_alias
    }
}

pub fn is_dotted_identifier(text: &str) -> bool {
    DOTTED_IDENTIFIER.is_match(text)
}

/// A variable introduced by an assignment, live on rows `start..end`.
#[derive(Debug, Clone, PartialEq)]
struct AssignmentWindow {
    left: String,
    /// `None` when the right-hand side is not a plain name; the window still
    /// shadows earlier assignments.
    right: Option<String>,
    start: usize,
    end: usize,
}

/// Resolves call targets of the entities of one file.
pub struct CallsCapturer<'a> {
    parser: &'a CodeParser,
    language: Language,
    names: &'a NameTable,
    /// Whole-word rewrites from import aliases to canonical names.
    substitutions: Vec<(Regex, String)>,
}

impl<'a> CallsCapturer<'a> {
    pub fn new(
        parser: &'a CodeParser,
        language: Language,
        names: &'a NameTable,
        statements: &[ImportStatement],
    ) -> Self {
        let mut substitutions = Vec::new();
        for statement in statements {
            for name in &statement.names {
                if !name.alias.is_empty() && name.alias != name.name {
                    substitutions.push((name.alias.clone(), name.name.clone()));
                }
            }
            if statement.names.is_empty()
                && !statement.module_alias.is_empty()
                && statement.module_alias != statement.module
                && is_dotted_identifier(&statement.module)
            {
                substitutions.push((statement.module_alias.clone(), statement.module.clone()));
            }
        }
        let substitutions = substitutions
            .into_iter()
            .filter_map(|(from, to)| match word_regex(&from) {
                Ok(re) => Some((re, to)),
                Err(e) => {
                    warn!("skipping alias {from}: {e}");
                    None
                }
            })
            .collect();

        Self {
            parser,
            language,
            names,
            substitutions,
        }
    }

    /// Call targets of `node` with the 1-based file lines they are used on.
    pub fn get_calls(&self, node: &Node, children: &[&Node], parent: Option<&Node>) -> BTreeMap<String, Vec<usize>> {
        let mut text = node.analysis_text(children);
        for (re, to) in &self.substitutions {
            text = re.replace_all(&text, NoExpand(to)).into_owned();
        }

        let in_class = parent.filter(|p| p.node_type.is_class_like());
        if let (NodeType::Method, Some(class), Some(token)) = (node.node_type, in_class, self.language.self_token()) {
            match word_regex(token) {
                Ok(re) => text = re.replace_all(&text, NoExpand(&class.name)).into_owned(),
                Err(e) => warn!("skipping self substitution in {}: {e}", node.id),
            }
        }

        let text = self.wrap(node, text);
        let assignments = self.capture_assignments(&text);
        let text = replace_assignments(&text, &assignments);

        let captures = match self.parser.capture(self.language, QueryKind::Calls, &text) {
            Ok(captures) => captures,
            Err(e) => {
                debug!("no calls for {}: {e}", node.id);
                return BTreeMap::new();
            }
        };

        let mut seen = HashSet::new();
        let mut calls: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for capture in captures {
            if !TARGET_LABELS.contains(&capture.label.as_str())
                || (capture.label == "parameter_type" && capture.declared_name)
                || !seen.insert((capture.label.clone(), capture.start_byte, capture.end_byte))
            {
                continue;
            }
            let tokens: Vec<String> = if capture.label == "identifier.name" {
                callee_name(&capture.text).into_iter().collect()
            } else {
                type_names(&capture.text)
            };
            let line = node.start_position.row + capture.start.row + 1;
            for token in tokens {
                match self.names.resolve(&token) {
                    Some(target) if target != node.id => {
                        calls.entry(target.to_string()).or_default().push(line);
                    }
                    _ => {}
                }
            }
        }
        for lines in calls.values_mut() {
            lines.sort_unstable();
            lines.dedup();
        }
        calls
    }

    /// Makes a member slice parse on its own. Prefixes stay on the first
    /// line so rows keep matching the file.
    fn wrap(&self, node: &Node, text: String) -> String {
        match self.language {
            Language::JavaScript | Language::TypeScript | Language::Tsx if node.node_type == NodeType::Method => {
                format!("function {text}")
            }
            Language::Java
                if !matches!(
                    node.node_type,
                    NodeType::File | NodeType::Class | NodeType::Interface | NodeType::Enum
                ) =>
            {
                format!("class __codegraph__ {{ {text}\n}}")
            }
            Language::Php if node.node_type != NodeType::File => format!("<?php {text}"),
            _ => text,
        }
    }

    fn capture_assignments(&self, text: &str) -> Vec<AssignmentWindow> {
        let captures = match self.parser.capture(self.language, QueryKind::VariableAssignments, text) {
            Ok(captures) => captures,
            Err(e) => {
                debug!("no assignments captured: {e}");
                return Vec::new();
            }
        };

        let mut by_match: BTreeMap<usize, Vec<&Capture>> = BTreeMap::new();
        for capture in &captures {
            by_match.entry(capture.match_id).or_default().push(capture);
        }

        let mut found: Vec<(usize, AssignmentWindow)> = by_match
            .values()
            .filter_map(|group| {
                let left = group.iter().find(|c| c.label == "left")?;
                let right = group.iter().find(|c| c.label == "right")?;
                let anchor = group.iter().find(|c| c.label == "assignment").unwrap_or(left);
                Some((
                    anchor.start_byte,
                    AssignmentWindow {
                        left: left.text.clone(),
                        right: clean_right(&right.text).filter(|r| r != &left.text),
                        start: anchor.start.row,
                        end: usize::MAX,
                    },
                ))
            })
            .collect();
        found.sort_by_key(|(start, _)| *start);

        let mut windows: Vec<AssignmentWindow> = Vec::with_capacity(found.len());
        for (_, window) in found {
            for earlier in windows.iter_mut().filter(|w| w.left == window.left) {
                earlier.end = earlier.end.min(window.start);
            }
            windows.push(window);
        }
        windows
    }
}

/// Whole-word pattern for `word`; boundaries only where the edge is a word
/// character, so `$this` still matches.
fn word_regex(word: &str) -> Result<Regex, regex::Error> {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let start = if is_word(word.chars().next()) { r"\b" } else { "" };
    let end = if is_word(word.chars().last()) { r"\b" } else { "" };
    Regex::new(&format!("{start}{}{end}", regex::escape(word)))
}

/// Replaces matches not preceded by `.`; `a.x` is a field, not `x`.
fn replace_not_after_dot(re: &Regex, line: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for m in re.find_iter(line) {
        if line[..m.start()].ends_with('.') {
            continue;
        }
        out.push_str(&line[last..m.start()]);
        out.push_str(replacement);
        last = m.end();
    }
    out.push_str(&line[last..]);
    out
}

fn replace_assignments(text: &str, assignments: &[AssignmentWindow]) -> String {
    let mut ordered: Vec<&AssignmentWindow> = assignments.iter().filter(|a| a.right.is_some()).collect();
    if ordered.is_empty() {
        return text.to_string();
    }
    ordered.sort_by_key(|a| std::cmp::Reverse(a.start));

    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    for assignment in ordered {
        let Some(right) = &assignment.right else {
            continue;
        };
        let re = match word_regex(&assignment.left) {
            Ok(re) => re,
            Err(e) => {
                warn!("skipping assignment to {}: {e}", assignment.left);
                continue;
            }
        };
        let end = assignment.end.min(lines.len());
        for line in lines.iter_mut().take(end).skip(assignment.start) {
            *line = replace_not_after_dot(&re, line, right);
        }
    }
    lines.join("\n")
}

/// Right-hand side reduced to a bare name: `(Foo(a, b))` becomes `Foo`.
fn clean_right(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        text = inner.trim();
    }

    let mut stripped = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            _ => stripped.push(c),
        }
    }
    if depth > 0 {
        return None;
    }

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed.contains(REJECTED_RIGHT) {
        return None;
    }
    Some(collapsed)
}

/// Callee token of a call capture, e.g. `this.api?.get<T>(x)` gives
/// `this.api.get`.
fn callee_name(text: &str) -> Option<String> {
    let cut = text.find(['(', '<', '[', '{']).unwrap_or(text.len());
    let name: String = text[..cut].chars().filter(|c| !c.is_whitespace() && *c != '$').collect();
    let name = name.replace("?.", ".").replace("->", ".").replace("::", ".");
    let name = name.trim_matches('.');
    is_dotted_identifier(name).then(|| name.to_string())
}

fn type_names(text: &str) -> Vec<String> {
    TYPE_TOKEN.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
