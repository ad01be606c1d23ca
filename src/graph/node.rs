use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::models::ImportStatement;
use crate::indexer::languages::Language;

/// Zero-based row and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl From<tree_sitter::Point> for Position {
    fn from(p: tree_sitter::Point) -> Self {
        Self {
            row: p.row,
            column: p.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Folder,
    Function,
    Class,
    Interface,
    Method,
    Enum,
    Struct,
    Union,
    Namespace,
    Module,
    /// Carrier for `export` wrappers; never part of the output.
    Export,
    Type,
    Assignment,
}

impl NodeType {
    /// Maps a definition capture label. `method` starts out as a function and
    /// is promoted once a class claims it.
    pub fn from_label(label: &str) -> Option<NodeType> {
        let node_type = match label {
            "function" | "method" => NodeType::Function,
            "class" => NodeType::Class,
            "interface" => NodeType::Interface,
            "enum" => NodeType::Enum,
            "struct" => NodeType::Struct,
            "union" => NodeType::Union,
            "namespace" => NodeType::Namespace,
            "module" => NodeType::Module,
            "export" => NodeType::Export,
            "type" => NodeType::Type,
            "assignment" => NodeType::Assignment,
            _ => return None,
        };
        Some(node_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "file",
            NodeType::Folder => "folder",
            NodeType::Function => "function",
            NodeType::Class => "class",
            NodeType::Interface => "interface",
            NodeType::Method => "method",
            NodeType::Enum => "enum",
            NodeType::Struct => "struct",
            NodeType::Union => "union",
            NodeType::Namespace => "namespace",
            NodeType::Module => "module",
            NodeType::Export => "export",
            NodeType::Type => "type",
            NodeType::Assignment => "assignment",
        }
    }

    /// Containers whose function members become methods.
    pub fn is_class_like(&self) -> bool {
        matches!(self, NodeType::Class | NodeType::Interface)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A code entity.
///
/// `parent` and `children` hold ids. While a file is being built the
/// [`NodeArena`](super::NodeArena) owns the tree and fills them in when it is
/// finalised.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    pub name: String,
    /// External name; empty unless an import or export renames the node.
    pub alias: String,
    pub language: Language,
    /// Source slice, with the parent's signature spliced in front when the
    /// node is nested.
    pub code: String,
    pub body: String,
    /// File offset of `body`.
    pub body_start_byte: usize,
    pub documentation: String,
    pub exportable: bool,
    pub start_position: Position,
    pub end_position: Position,
    pub start_byte: usize,
    pub end_byte: usize,
    pub import_statements: Vec<ImportStatement>,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Own source slice plus any trailing chained-call statements. This is
    /// the text the calls resolver analyses.
    pub source: String,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        language: Language,
        code: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            id: id.into(),
            node_type,
            name: String::new(),
            alias: String::new(),
            language,
            source: code.clone(),
            code,
            body: String::new(),
            body_start_byte: 0,
            documentation: String::new(),
            exportable: false,
            start_position: Position::default(),
            end_position: Position::default(),
            start_byte: 0,
            end_byte: 0,
            import_statements: Vec::new(),
            parent: None,
            children: Vec::new(),
            in_degree: 0,
            out_degree: 0,
        }
    }

    /// The node standing for a whole source file.
    pub fn file(path: &str, content: &str, language: Language) -> Self {
        let mut node = Self::new(path, NodeType::File, language, content);
        node.name = Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(path)
            .to_string();
        node.exportable = true;
        node.body = content.to_string();
        node.end_byte = content.len();
        node.end_position = end_of(content);
        node
    }

    /// External name: the alias when present, the name otherwise.
    pub fn label(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    /// Path of the file the node belongs to.
    pub fn file_path(&self) -> &str {
        self.id.split("::").next().unwrap_or(&self.id)
    }

    /// Name without the class qualifier added on promotion.
    pub fn member_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn row_span(&self) -> usize {
        self.end_position.row - self.start_position.row
    }

    /// Row-only range containment.
    pub fn is_within(&self, other: &Node) -> bool {
        self.start_position.row >= other.start_position.row
            && self.end_position.row <= other.end_position.row
    }

    pub fn same_rows(&self, other: &Node) -> bool {
        self.start_position.row == other.start_position.row
            && self.end_position.row == other.end_position.row
    }

    pub fn byte_contains(&self, other: &Node) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    /// Whether this member initialises instances of `class`.
    pub fn is_constructor_of(&self, class: &Node) -> bool {
        match self.language {
            Language::Java => self.member_name() == class.name,
            language => language.constructor_name() == Some(self.member_name()),
        }
    }

    /// Code up to the body, the part children show of their parent.
    pub fn signature(&self) -> String {
        let located = redaction_target(self).and_then(|body| Some((self.locate(&self.code, self, body, 0, 0)?, body)));
        match located {
            Some((at, body)) => format!("{}{}", &self.code[..at], &self.code[at + body.len()..])
                .trim()
                .to_string(),
            None => self.code.lines().next().unwrap_or_default().to_string(),
        }
    }

    /// Prefixes the code with the parent's signature and an ellipsis line,
    /// both aligned to this node's column.
    pub fn splice_parent_signature(&mut self, signature: &str) {
        let pad = " ".repeat(self.start_position.column);
        self.code = format!("{signature}\n{pad}...\n{pad}{}", self.code);
    }

    /// Code with bodies replaced by placeholders.
    ///
    /// Leaves lose their own body. Containers keep their own structure and
    /// lose the bodies of their direct children, except a class's
    /// constructor.
    pub fn code_without_body(&self, children: &[&Node]) -> String {
        if children.is_empty() {
            let Some(target) = redaction_target(self) else {
                return self.code.trim().to_string();
            };
            let mut code = self.code.clone();
            if let Some(at) = self.locate(&code, self, target, 0, 0) {
                code.replace_range(at..at + target.len(), &self.body_placeholder(self));
            }
            return code.trim().to_string();
        }
        self.strip_child_bodies(&self.code, children, |owner, _| self.body_placeholder(owner))
            .trim()
            .to_string()
    }

    /// Own source for call analysis. Containers lose their children's
    /// bodies; placeholders keep the line count so rows still map back to
    /// the file.
    pub fn analysis_text(&self, children: &[&Node]) -> String {
        if children.is_empty() {
            return self.source.clone();
        }
        self.strip_child_bodies(&self.source, children, |owner, target| {
            let lines = "\n".repeat(target.matches('\n').count());
            if target.trim_start().starts_with('{') {
                format!("{{{lines}}}")
            } else if self.language.uses_indentation() {
                let pad = " ".repeat(owner.start_position.column + 4);
                format!("{lines}{pad}...")
            } else {
                format!("{lines}null")
            }
        })
    }

    fn strip_child_bodies(
        &self,
        text: &str,
        children: &[&Node],
        placeholder: impl Fn(&Node, &str) -> String,
    ) -> String {
        let mut children = children.to_vec();
        children.sort_by_key(|c| c.start_byte);

        let mut code = text.to_string();
        let mut cursor = 0;
        let mut adjust = 0isize;
        for child in children {
            let Some(target) = redaction_target(child) else {
                continue;
            };
            let Some(at) = self.locate(&code, child, target, cursor, adjust) else {
                continue;
            };
            if child.node_type == NodeType::Assignment
                || (self.node_type.is_class_like() && child.is_constructor_of(self))
            {
                cursor = at + target.len();
                continue;
            }
            let replacement = placeholder(child, target);
            code.replace_range(at..at + target.len(), &replacement);
            cursor = at + replacement.len();
            adjust += replacement.len() as isize - target.len() as isize;
        }
        code
    }

    /// Offset of `target`, the redaction target of `owner`, in `text`.
    ///
    /// `text` is this node's code or source after `adjust` bytes of edits.
    /// Both differ from the source only before the first body (a spliced
    /// signature, a removed docstring), so the body's file offset maps
    /// straight into it. Nodes built without offsets fall back to a search
    /// from `cursor`.
    fn locate(&self, text: &str, owner: &Node, target: &str, cursor: usize, adjust: isize) -> Option<usize> {
        let shift = text.len() as isize - adjust - self.source.len() as isize;
        let exact = owner
            .body_start_byte
            .checked_sub(self.start_byte)
            .map(|offset| offset + (owner.body.len() - target.len()))
            .and_then(|offset| usize::try_from(offset as isize + shift + adjust).ok())
            .filter(|&at| at >= cursor && text.get(at..).is_some_and(|rest| rest.starts_with(target)));
        exact.or_else(|| Some(cursor + text.get(cursor..)?.find(target)?))
    }

    fn body_placeholder(&self, owner: &Node) -> String {
        let pad = " ".repeat(owner.start_position.column);
        if self.language.uses_indentation() || !owner.body.trim_start().starts_with('{') {
            format!("\n{pad}    ...")
        } else {
            format!("{{\n{pad}    //...\n{pad}}}")
        }
    }
}

/// Body text as it appears in code: docstrings leading the body are
/// documentation, not body.
fn redaction_target(node: &Node) -> Option<&str> {
    let body = if node.documentation.is_empty() {
        node.body.as_str()
    } else {
        node.body
            .strip_prefix(node.documentation.as_str())
            .unwrap_or(&node.body)
    };
    if body.trim().is_empty() {
        None
    } else {
        Some(body)
    }
}

fn end_of(content: &str) -> Position {
    let row = content.matches('\n').count();
    let column = content.rsplit('\n').next().map(str::len).unwrap_or_default();
    Position { row, column }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(name: &str, rows: (usize, usize), column: usize, code: &str, body: &str) -> Node {
        let mut node = Node::new(format!("/a.js::{name}"), NodeType::Function, Language::JavaScript, code);
        node.name = name.to_string();
        node.body = body.to_string();
        node.start_position = Position {
            row: rows.0,
            column,
        };
        node.end_position = Position {
            row: rows.1,
            column: 1,
        };
        node
    }

    #[test]
    fn test_label_falls_back_to_name() {
        let mut node = node_at("bar", (0, 0), 0, "function bar() {}", "{}");
        assert_eq!(node.label(), "bar");
        node.alias = "cbar".to_string();
        assert_eq!(node.label(), "cbar");
        assert_eq!(node.name, "bar");
    }

    #[test]
    fn test_is_within_uses_rows_only() {
        let outer = node_at("outer", (1, 10), 0, "", "");
        let inner = node_at("inner", (2, 4), 4, "", "");
        assert!(inner.is_within(&outer));
        assert!(!outer.is_within(&inner));
        assert!(outer.is_within(&outer));
    }

    #[test]
    fn test_leaf_without_body_brace() {
        let node = node_at(
            "bar",
            (0, 2),
            0,
            "function bar() {\n  return 1;\n}",
            "{\n  return 1;\n}",
        );
        assert_eq!(node.code_without_body(&[]), "function bar() {\n    //...\n}");
    }

    #[test]
    fn test_container_keeps_constructor() {
        let code = "class Foo {\n    constructor() {\n        this.x = 1;\n    }\n    bar() {\n        return 1;\n    }\n}";
        let mut class = node_at("Foo", (0, 7), 0, code, &code["class Foo ".len()..]);
        class.node_type = NodeType::Class;

        let mut ctor = node_at("Foo.constructor", (1, 3), 4, "", "{\n        this.x = 1;\n    }");
        ctor.node_type = NodeType::Method;
        let mut bar = node_at("Foo.bar", (4, 6), 4, "", "{\n        return 1;\n    }");
        bar.node_type = NodeType::Method;
        ctor.start_byte = 12;
        bar.start_byte = 60;

        let redacted = class.code_without_body(&[&bar, &ctor]);
        assert_eq!(
            redacted,
            "class Foo {\n    constructor() {\n        this.x = 1;\n    }\n    bar() {\n        //...\n    }\n}"
        );
    }

    #[test]
    fn test_python_placeholder_keeps_docstring_out() {
        let mut node = Node::new("/a.py::f", NodeType::Function, Language::Python, "def f():\n    \n    return 1");
        node.body = "\"\"\"doc\"\"\"\n    return 1".to_string();
        node.documentation = "\"\"\"doc\"\"\"".to_string();
        assert_eq!(node.code_without_body(&[]), "def f():\n    \n    ...");
    }

    #[test]
    fn test_analysis_text_keeps_rows() {
        let source = "class Foo:\n    def bar(self):\n        a()\n        b()\n    def baz(self):\n        c()";
        let mut class = Node::new("/a.py::Foo", NodeType::Class, Language::Python, source);
        class.name = "Foo".to_string();
        let mut bar = Node::new("/a.py::Foo.bar", NodeType::Method, Language::Python, "");
        bar.body = "a()\n        b()".to_string();
        bar.start_position = Position { row: 1, column: 4 };
        bar.start_byte = 15;

        let text = class.analysis_text(&[&bar]);
        assert_eq!(text.lines().count(), source.lines().count());
        assert!(!text.contains("a()"));
        assert!(text.contains("c()"));
    }

    #[test]
    fn test_splice_parent_signature() {
        let mut node = node_at("bar", (1, 3), 4, "bar() {\n        return 1;\n    }", "");
        node.splice_parent_signature("class Foo");
        assert_eq!(node.code, "class Foo\n    ...\n    bar() {\n        return 1;\n    }");
    }

    #[test]
    fn test_file_node_positions() {
        let node = Node::file("/repo/src/app.py", "a = 1\nb = 2\n", Language::Python);
        assert_eq!(node.name, "app");
        assert_eq!(node.end_position, Position { row: 2, column: 0 });
        assert!(node.exportable);
    }
}
