use std::collections::HashMap;

use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

use super::languages::Language;
use crate::error::{GraphError, Result};
use crate::graph::Position;
use crate::queries::QueryKind;

const COMMENT_KINDS: &[&str] = &["comment", "line_comment", "block_comment"];

/// Parents that wrap a definition without adding anything before it.
const WRAPPER_KINDS: &[&str] = &[
    "export_statement",
    "lexical_declaration",
    "variable_declaration",
    "expression_statement",
    "decorated_definition",
    "declaration",
];

/// A labelled span produced by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub label: String,
    pub text: String,
    pub start: Position,
    pub end: Position,
    pub start_byte: usize,
    pub end_byte: usize,
    /// Captures of the same pattern match share this id.
    pub match_id: usize,
    /// The node is the `name:` of the declaration it belongs to.
    pub declared_name: bool,
}

/// A capture that still points into its syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxCapture<'t> {
    pub label: String,
    pub node: Node<'t>,
    pub match_id: usize,
}

impl SyntaxCapture<'_> {
    pub fn to_capture(&self, source: &str) -> Capture {
        Capture {
            label: self.label.clone(),
            text: node_text(self.node, source).to_string(),
            start: self.node.start_position().into(),
            end: self.node.end_position().into(),
            start_byte: self.node.start_byte(),
            end_byte: self.node.end_byte(),
            match_id: self.match_id,
            declared_name: is_declared_name(self.node),
        }
    }
}

fn is_declared_name(node: Node<'_>) -> bool {
    node.parent().is_some_and(|parent| {
        (parent.kind().ends_with("_declaration") || parent.kind() == "type_parameter")
            && parent
                .child_by_field_name("name")
                .is_some_and(|name| name.id() == node.id())
    })
}

/// A source text with its syntax tree.
pub struct ParsedSource<'s> {
    pub language: Language,
    pub source: &'s str,
    pub tree: Tree,
}

impl ParsedSource<'_> {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(node, self.source)
    }
}

/// Compiled query registry shared by every parse.
///
/// Queries are compiled once per language and slot; `Query` is `Send + Sync`
/// so one parser serves all worker threads.
pub struct CodeParser {
    queries: HashMap<(Language, QueryKind), Vec<Query>>,
}

impl Default for CodeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeParser {
    pub fn new() -> Self {
        let mut queries = HashMap::new();
        for &language in Language::get_all() {
            let grammar = language.grammar();
            let bundle = language.queries();
            for kind in QueryKind::ALL {
                let mut compiled = Vec::new();
                for pattern in bundle.patterns(kind) {
                    match Query::new(&grammar, pattern) {
                        Ok(q) => compiled.push(q),
                        Err(e) => warn!(
                            "dropping {} pattern for {language}: {e}",
                            kind.as_str()
                        ),
                    }
                }
                queries.insert((language, kind), compiled);
            }
        }
        Self { queries }
    }

    /// Parses a text with the grammar of `language`.
    pub fn parse<'s>(&self, language: Language, source: &'s str) -> Result<ParsedSource<'s>> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|e| GraphError::Grammar {
                language: language.to_string(),
                message: e.to_string(),
            })?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| GraphError::GrammarParseFailure(language.to_string()))?;
        Ok(ParsedSource {
            language,
            source,
            tree,
        })
    }

    /// Parses `text` and returns the captures of a named query.
    pub fn capture(&self, language: Language, kind: QueryKind, text: &str) -> Result<Vec<Capture>> {
        let parsed = self.parse(language, text)?;
        Ok(self
            .syntax_captures(&parsed, kind, parsed.root())
            .iter()
            .map(|c| c.to_capture(text))
            .collect())
    }

    /// Runs a named query against `node`, an already parsed (sub)tree.
    pub fn syntax_captures<'t>(
        &self,
        parsed: &'t ParsedSource<'_>,
        kind: QueryKind,
        node: Node<'t>,
    ) -> Vec<SyntaxCapture<'t>> {
        let Some(queries) = self.queries.get(&(parsed.language, kind)) else {
            return Vec::new();
        };
        let mut captures = Vec::new();
        let mut next_id = 0;
        for query in queries {
            run_query(query, node, parsed.source, &mut next_id, &mut captures);
        }
        captures
    }

    /// Captures `@code` statements chaining calls on the global `name`.
    ///
    /// The pattern depends on the name, so it is compiled on demand.
    pub fn extra_assignment_code(&self, parsed: &ParsedSource<'_>, name: &str) -> Vec<Capture> {
        let pattern = (parsed.language.queries().extra_assignment_code)(name);
        if pattern.trim().is_empty() {
            return Vec::new();
        }
        let query = match Query::new(&parsed.language.grammar(), &pattern) {
            Ok(q) => q,
            Err(e) => {
                let err = GraphError::InvalidQuery {
                    language: parsed.language.to_string(),
                    message: e.to_string(),
                };
                debug!("skipping extra assignment code for {name}: {err}");
                return Vec::new();
            }
        };
        let mut captures = Vec::new();
        run_query(&query, parsed.root(), parsed.source, &mut 0, &mut captures);
        captures
            .iter()
            .filter(|c| c.label == "code")
            .map(|c| c.to_capture(parsed.source))
            .collect()
    }
}

fn run_query<'t>(
    query: &Query,
    node: Node<'t>,
    source: &str,
    next_id: &mut usize,
    out: &mut Vec<SyntaxCapture<'t>>,
) {
    let mut cursor = QueryCursor::new();
    let names = query.capture_names();
    let mut matches = cursor.matches(query, node, source.as_bytes());
    while let Some(m) = matches.next() {
        let match_id = *next_id;
        *next_id += 1;
        for cap in m.captures {
            let label = names[cap.index as usize];
            // `@_name` captures only feed predicates
            if label.starts_with('_') {
                continue;
            }
            out.push(SyntaxCapture {
                label: label.to_string(),
                node: cap.node,
                match_id,
            });
        }
    }
}

pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

pub fn is_comment(kind: &str) -> bool {
    COMMENT_KINDS.contains(&kind)
}

/// Comments directly above a definition, joined in source order.
///
/// Wrappers starting on the definition's row are climbed first, so a
/// comment above `export function f` documents `f`.
pub fn leading_comment(node: Node<'_>, source: &str) -> String {
    let row = node.start_position().row;
    let mut anchor = node;
    while anchor
        .prev_named_sibling()
        .is_none_or(|prev| !is_comment(prev.kind()))
    {
        match anchor.parent() {
            Some(p) if WRAPPER_KINDS.contains(&p.kind()) && p.start_position().row == row => {
                anchor = p;
            }
            _ => break,
        }
    }

    let mut comments = Vec::new();
    let mut top = anchor.start_position().row;
    let mut cursor = anchor.prev_named_sibling();
    while let Some(prev) = cursor {
        let end = prev.end_position().row;
        if !is_comment(prev.kind()) || end > top || end + 1 < top {
            break;
        }
        comments.push(node_text(prev, source));
        top = prev.start_position().row;
        cursor = prev.prev_named_sibling();
    }
    comments.reverse();
    comments.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_python_definitions() {
        let parser = CodeParser::new();
        let source = "class MyClass:\n    def my_method(self):\n        pass\n\ndef my_function():\n    pass\n";
        let captures = parser
            .capture(Language::Python, QueryKind::ConstructorDefinitions, source)
            .expect("python source should parse");

        let labels: Vec<&str> = captures.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels.iter().filter(|l| **l == "function").count(), 2);
        assert_eq!(labels.iter().filter(|l| **l == "class").count(), 1);

        let method = captures
            .iter()
            .find(|c| c.text.starts_with("def my_method"))
            .expect("method capture");
        assert_eq!(method.start, Position { row: 1, column: 4 });
    }

    #[test]
    fn test_capture_groups_by_match() {
        let parser = CodeParser::new();
        let source = "from .utils import helper as h, other\n";
        let captures = parser
            .capture(Language::Python, QueryKind::ImportStatements, source)
            .expect("import should parse");

        let alias = captures.iter().find(|c| c.label == "alias").expect("alias");
        assert_eq!(alias.text, "h");
        let name = captures
            .iter()
            .find(|c| c.label == "name" && c.match_id == alias.match_id)
            .expect("aliased name");
        assert_eq!(name.text, "helper");
        assert!(captures.iter().any(|c| c.label == "name" && c.text == "other"));
    }

    #[test]
    fn test_empty_slot_yields_nothing() {
        let parser = CodeParser::new();
        let captures = parser
            .capture(Language::Python, QueryKind::ExportClauses, "x = 1\n")
            .expect("parse");
        assert!(captures.is_empty());
    }

    #[test]
    fn test_leading_comment_climbs_export() {
        let parser = CodeParser::new();
        let source = "// adds numbers\nexport function add(a, b) {\n  return a + b;\n}\n";
        let parsed = parser.parse(Language::JavaScript, source).expect("parse");
        let captures = parser.syntax_captures(&parsed, QueryKind::ConstructorDefinitions, parsed.root());
        let function = captures
            .iter()
            .find(|c| c.label == "function")
            .expect("function capture");
        assert_eq!(leading_comment(function.node, source), "// adds numbers");
    }

    #[test]
    fn test_extra_assignment_code() {
        let parser = CodeParser::new();
        let source = "const app = new Hono()\napp.get('/', handler)\nother.get('/')\n";
        let parsed = parser.parse(Language::JavaScript, source).expect("parse");
        let extra = parser.extra_assignment_code(&parsed, "app");
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].text, "app.get('/', handler)");
    }
}
