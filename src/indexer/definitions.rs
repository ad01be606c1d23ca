//! Builds one file's node tree from definition captures.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::code_parser::{CodeParser, ParsedSource, leading_comment};
use super::imports;
use super::languages::Language;
use crate::error::Result;
use crate::graph::{Node, NodeArena, NodeType};
use crate::queries::QueryKind;

/// Extracts every definition of one file.
///
/// The returned nodes start with the file node and follow the containment
/// tree in pre-order. A file whose text cannot be parsed yields only its
/// file node.
pub fn extract_file(parser: &CodeParser, path: &str, content: &str) -> Result<Vec<Node>> {
    let language = Language::from_path(path)?;
    let mut arena = NodeArena::new();
    let file = arena.push(Node::file(path, content, language));

    let parsed = match parser.parse(language, content) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("{path}: {e}");
            return Ok(arena.into_nodes(file));
        }
    };

    let definitions = collect_definitions(parser, &parsed, path, &mut arena);
    attach_extra_assignment_code(parser, &parsed, &mut arena, &definitions);
    link_definitions(&mut arena, file, &definitions);
    imports::apply_export_clauses(parser, &parsed, &mut arena, file);

    for child in arena.children(file).to_vec() {
        arena.propagate_exportable(child);
    }

    arena.get_mut(file).import_statements = imports::generate_import_statements(parser, &parsed);
    debug!("{path}: {} definitions", definitions.len());
    Ok(arena.into_nodes(file))
}

/// One node per definition capture, in source order with outer nodes first.
fn collect_definitions(
    parser: &CodeParser,
    parsed: &ParsedSource<'_>,
    path: &str,
    arena: &mut NodeArena,
) -> Vec<usize> {
    let root = parsed.root();
    let mut captures = parser.syntax_captures(parsed, QueryKind::ConstructorDefinitions, root);
    captures.extend(parser.syntax_captures(parsed, QueryKind::Assignments, root));

    let mut seen = HashSet::new();
    let mut typed: Vec<_> = captures
        .into_iter()
        .filter_map(|c| NodeType::from_label(&c.label).map(|t| (t, c.node)))
        .filter(|(t, node)| seen.insert((*t, node.id())))
        .collect();
    typed.sort_by_key(|(_, node)| (node.start_byte(), Reverse(node.end_byte())));

    let mut definitions = Vec::new();
    for (node_type, syntax) in typed {
        let node = build_node(parser, parsed, path, syntax, node_type);
        if node.name.is_empty() && node_type != NodeType::Export {
            continue;
        }
        definitions.push(arena.push(node));
    }
    definitions
}

fn build_node(
    parser: &CodeParser,
    parsed: &ParsedSource<'_>,
    path: &str,
    syntax: tree_sitter::Node<'_>,
    node_type: NodeType,
) -> Node {
    let language = parsed.language;
    let text = parsed.text(syntax);
    let mut node = Node::new(path, node_type, language, text);
    node.start_position = syntax.start_position().into();
    node.end_position = syntax.end_position().into();
    node.start_byte = syntax.start_byte();
    node.end_byte = syntax.end_byte();
    node.documentation = leading_comment(syntax, parsed.source);
    node.exportable = match language {
        Language::C => !text.starts_with("static"),
        other => other.exports_by_default(),
    };
    if node_type == NodeType::Export {
        return node;
    }

    let mut template = parser.syntax_captures(parsed, QueryKind::DefinitionTemplate, syntax);
    let mut seen = HashSet::new();
    template.retain(|c| seen.insert((c.label.clone(), c.node.id())));
    template.sort_by_key(|c| (c.node.start_byte(), Reverse(c.node.end_byte())));

    let mut names = 0;
    for capture in &template {
        let value = parsed.text(capture.node);
        match capture.label.as_str() {
            // a second name belongs to a nested definition
            "name" => {
                names += 1;
                if names > 1 {
                    break;
                }
                node.name = value.to_string();
                node.id = format!("{path}::{value}");
            }
            "alias" if node.alias.is_empty() => node.alias = value.to_string(),
            "documentation" if !value.is_empty() => {
                node.documentation = value.to_string();
                if language.uses_indentation() {
                    node.code = node.code.replacen(value, "", 1);
                }
            }
            "body" if node.body.is_empty() => {
                node.body = value.to_string();
                node.body_start_byte = capture.node.start_byte();
            }
            _ => {}
        }
    }

    if let Some((first, last)) = unbraced_namespace_extent(syntax) {
        node.end_position = last.end_position().into();
        node.end_byte = last.end_byte();
        node.code = parsed.source.get(node.start_byte..node.end_byte).unwrap_or_default().to_string();
        node.source = node.code.clone();
        node.body = parsed.source.get(first.start_byte()..node.end_byte).unwrap_or_default().to_string();
        node.body_start_byte = first.start_byte();
    }
    node
}

/// First and last statement owned by a `namespace A;` declaration: every
/// sibling up to the next namespace or the end of the file.
fn unbraced_namespace_extent(syntax: tree_sitter::Node<'_>) -> Option<(tree_sitter::Node<'_>, tree_sitter::Node<'_>)> {
    if syntax.kind() != "namespace_definition" || syntax.child_by_field_name("body").is_some() {
        return None;
    }
    let first = syntax.next_named_sibling().filter(|n| n.kind() != "namespace_definition")?;
    let mut last = first;
    while let Some(next) = last.next_named_sibling() {
        if next.kind() == "namespace_definition" {
            break;
        }
        last = next;
    }
    Some((first, last))
}

/// Appends statements chaining calls on a global, e.g. `app.get(...)`
/// after `app = App()`, to the assignment that introduced it.
fn attach_extra_assignment_code(
    parser: &CodeParser,
    parsed: &ParsedSource<'_>,
    arena: &mut NodeArena,
    definitions: &[usize],
) {
    for &index in definitions {
        if arena.get(index).node_type != NodeType::Assignment {
            continue;
        }
        let name = arena.get(index).name.clone();
        for extra in parser.extra_assignment_code(parsed, &name) {
            let node = arena.get_mut(index);
            node.code.push('\n');
            node.code.push_str(&extra.text);
            node.source.push('\n');
            node.source.push_str(&extra.text);
        }
    }
}

/// Containment pass.
///
/// Nodes are attached to the file first, then offered every containing
/// candidate from the tightest outwards. Processing runs widest first so a
/// candidate is already placed when its children are considered. When a
/// candidate spans the very same rows it must byte-contain the node and
/// come earlier in processing order.
fn link_definitions(arena: &mut NodeArena, file: usize, definitions: &[usize]) {
    let mut order = definitions.to_vec();
    order.sort_by_key(|&i| {
        let n = arena.get(i);
        (Reverse(n.row_span()), n.start_byte, Reverse(n.end_byte), i)
    });
    let rank: HashMap<usize, usize> = order.iter().enumerate().map(|(r, &i)| (i, r)).collect();

    for &index in &order {
        if arena.get(index).node_type == NodeType::Export {
            continue;
        }
        arena.add_child(file, index);

        let mut candidates: Vec<usize> = {
            let node = arena.get(index);
            order
                .iter()
                .copied()
                .filter(|&c| {
                    let candidate = arena.get(c);
                    c != index
                        && candidate.node_type != NodeType::Assignment
                        && node.is_within(candidate)
                        && (!node.same_rows(candidate)
                            || (candidate.byte_contains(node) && rank[&c] < rank[&index]))
                })
                .collect()
        };
        candidates.sort_by_key(|&c| (arena.get(c).row_span(), Reverse(rank[&c])));

        for candidate in candidates {
            arena.add_node_relationship(index, candidate);
        }
    }
}
