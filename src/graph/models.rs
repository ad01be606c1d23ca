use serde::{Deserialize, Serialize};

use super::node::{Node, NodeType, Position};
use crate::indexer::languages::Language;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportName {
    pub name: String,
    pub alias: String,
    /// Extension-less file the name resolves to when it is itself a module.
    pub subpath: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatement {
    /// Specifier as written.
    pub module: String,
    pub module_alias: String,
    /// Empty for bare and namespace imports.
    pub names: Vec<ImportName>,
    /// Resolved extension-less target; empty until resolution succeeds.
    pub path: String,
    pub code: String,
    pub start_position: Position,
    pub end_position: Position,
    #[serde(default)]
    pub wildcard: bool,
}

impl ImportStatement {
    pub fn is_resolved(&self) -> bool {
        !self.path.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkLabel {
    Calls,
    Defines,
}

/// An edge. Its source gains out-degree, its target in-degree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub label: LinkLabel,
    /// First 1-based line of the call; absent for `defines`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// Serialised form of a [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub alias: String,
    pub label: String,
    pub language: Language,
    pub documentation: String,
    pub code: String,
    pub body: String,
    pub code_no_body: String,
    pub exportable: bool,
    pub start_position: Position,
    pub end_position: Position,
    pub in_degree: usize,
    pub out_degree: usize,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub origin_file: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_statements: Vec<ImportStatement>,
}

impl GraphNode {
    pub fn from_node(node: &Node, children: &[&Node]) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type,
            name: node.name.clone(),
            alias: node.alias.clone(),
            label: node.label().to_string(),
            language: node.language,
            documentation: node.documentation.clone(),
            code: node.code.clone(),
            body: node.body.clone(),
            code_no_body: node.code_without_body(children),
            exportable: node.exportable,
            start_position: node.start_position,
            end_position: node.end_position,
            in_degree: node.in_degree,
            out_degree: node.out_degree,
            parent: node.parent.clone(),
            children: node.children.clone(),
            origin_file: node.file_path().to_string(),
            import_statements: node.import_statements.clone(),
        }
    }
}
