use std::collections::HashSet;

use super::node::{Node, NodeType};

/// Index-based owner of one file's node tree while it is being built.
///
/// Index 0 is the file node once pushed first. Every edge change goes
/// through [`add_child`](Self::add_child) and
/// [`remove_child`](Self::remove_child), which keep degrees equal to the
/// recorded edges.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.parents.push(None);
        self.children.push(Vec::new());
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents[index]
    }

    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    pub fn add_child(&mut self, parent: usize, child: usize) {
        self.children[parent].push(child);
        self.parents[child] = Some(parent);
        self.nodes[parent].in_degree += 1;
        self.nodes[child].out_degree += 1;
    }

    pub fn remove_child(&mut self, parent: usize, child: usize) {
        let before = self.children[parent].len();
        self.children[parent].retain(|&c| c != child);
        if self.children[parent].len() < before {
            self.nodes[parent].in_degree -= 1;
            self.nodes[child].out_degree -= 1;
            self.parents[child] = None;
        }
    }

    /// Tries `candidate` as the container of `node`.
    ///
    /// Only nodes still hanging off the file (or unattached) are claimed.
    /// Export wrappers mark the node exportable without becoming its parent.
    /// Returns whether the node changed.
    pub fn add_node_relationship(&mut self, node: usize, candidate: usize) -> bool {
        if node == candidate || !self.nodes[node].is_within(&self.nodes[candidate]) {
            return false;
        }
        let parent_is_file = self
            .parents[node]
            .is_none_or(|p| self.nodes[p].node_type == NodeType::File);
        if !parent_is_file {
            return false;
        }

        if self.nodes[candidate].node_type == NodeType::Export {
            let documentation = self.nodes[candidate].documentation.clone();
            let target = &mut self.nodes[node];
            target.exportable = true;
            if target.documentation.is_empty() {
                target.documentation = documentation;
            }
            return true;
        }

        let signature = self.nodes[candidate].signature();
        let class_name = self.nodes[candidate]
            .node_type
            .is_class_like()
            .then(|| self.nodes[candidate].name.clone());

        self.nodes[node].splice_parent_signature(&signature);
        if let Some(old) = self.parents[node] {
            self.remove_child(old, node);
        }
        self.add_child(candidate, node);

        if let Some(class_name) = class_name {
            let target = &mut self.nodes[node];
            if target.node_type == NodeType::Function {
                target.node_type = NodeType::Method;
                target.name = format!("{class_name}.{}", target.name);
                let id = format!("{}::{}", target.file_path(), target.name);
                target.id = id;
                target.alias.clear();
            }
        }
        true
    }

    /// Pushes exportability down to every descendant of an exportable node.
    pub fn propagate_exportable(&mut self, node: usize) {
        if !self.nodes[node].exportable {
            return;
        }
        let mut stack = self.children[node].clone();
        while let Some(child) = stack.pop() {
            self.nodes[child].exportable = true;
            stack.extend(self.children[child].iter().copied());
        }
    }

    /// All nodes below `index`, in pre-order.
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.children[index].iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children[next].iter().rev().copied());
        }
        out
    }

    /// Consumes the arena into id-linked nodes in pre-order from `root`.
    ///
    /// Repeated ids get a `@<line>` suffix in source order; export carriers
    /// are dropped.
    pub fn into_nodes(mut self, root: usize) -> Vec<Node> {
        let mut seen = HashSet::new();
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|&i| (i != root, self.nodes[i].start_byte, i));
        for i in order {
            if self.nodes[i].node_type == NodeType::Export {
                continue;
            }
            let base = self.nodes[i].id.clone();
            let mut id = base.clone();
            let mut attempt = 0;
            while !seen.insert(id.clone()) {
                attempt += 1;
                let line = self.nodes[i].start_position.row + 1;
                id = if attempt == 1 {
                    format!("{base}@{line}")
                } else {
                    format!("{base}@{line}.{attempt}")
                };
            }
            self.nodes[i].id = id;
        }

        let ids: Vec<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        for i in 0..self.nodes.len() {
            self.nodes[i].parent = self.parents[i].map(|p| ids[p].clone());
            self.nodes[i].children = self.children[i].iter().map(|&c| ids[c].clone()).collect();
        }

        let mut keep = vec![root];
        keep.extend(self.descendants(root));
        let mut slots: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        keep.into_iter().filter_map(|i| slots[i].take()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Position;
    use crate::indexer::languages::Language;

    fn node(name: &str, node_type: NodeType, rows: (usize, usize), column: usize) -> Node {
        let mut n = Node::new(format!("/a.py::{name}"), node_type, Language::Python, format!("def {name}():\n    pass"));
        n.name = name.to_string();
        n.body = "pass".to_string();
        n.start_position = Position { row: rows.0, column };
        n.end_position = Position { row: rows.1, column: 8 };
        n
    }

    #[test]
    fn test_add_and_remove_child_keep_degrees() {
        let mut arena = NodeArena::new();
        let file = arena.push(Node::file("/a.py", "", Language::Python));
        let f = arena.push(node("f", NodeType::Function, (0, 1), 0));

        arena.add_child(file, f);
        assert_eq!(arena.get(file).in_degree, 1);
        assert_eq!(arena.get(f).out_degree, 1);

        arena.remove_child(file, f);
        assert_eq!(arena.get(file).in_degree, 0);
        assert_eq!(arena.get(f).out_degree, 0);
        assert_eq!(arena.parent(f), None);
    }

    #[test]
    fn test_relationship_promotes_method() {
        let mut arena = NodeArena::new();
        let file = arena.push(Node::file("/a.py", "", Language::Python));
        let mut class = node("Foo", NodeType::Class, (0, 5), 0);
        class.code = "class Foo:\n    def bar(self):\n        pass".to_string();
        class.body = "def bar(self):\n        pass".to_string();
        let class = arena.push(class);
        let method = arena.push(node("bar", NodeType::Function, (1, 2), 4));

        arena.add_child(file, class);
        arena.add_child(file, method);
        assert!(arena.add_node_relationship(method, class));

        let m = arena.get(method);
        assert_eq!(m.node_type, NodeType::Method);
        assert_eq!(m.name, "Foo.bar");
        assert_eq!(m.id, "/a.py::Foo.bar");
        assert_eq!(m.code, "class Foo:\n    ...\n    def bar():\n    pass");
        assert_eq!(arena.get(file).in_degree, 1);
        assert_eq!(arena.get(class).in_degree, 1);
        assert_eq!(m.out_degree, 1);
    }

    #[test]
    fn test_relationship_rejects_claimed_node() {
        let mut arena = NodeArena::new();
        let file = arena.push(Node::file("/a.py", "", Language::Python));
        let outer = arena.push(node("outer", NodeType::Function, (0, 9), 0));
        let inner = arena.push(node("inner", NodeType::Function, (1, 8), 4));
        let leaf = arena.push(node("leaf", NodeType::Function, (2, 3), 8));
        for i in [outer, inner, leaf] {
            arena.add_child(file, i);
        }

        assert!(arena.add_node_relationship(leaf, inner));
        assert!(!arena.add_node_relationship(leaf, outer));
        assert_eq!(arena.parent(leaf), Some(inner));
        // functions stay functions under functions
        assert_eq!(arena.get(leaf).name, "leaf");
    }

    #[test]
    fn test_export_wrapper_marks_exportable() {
        let mut arena = NodeArena::new();
        let file = arena.push(Node::file("/a.js", "", Language::JavaScript));
        let mut export = node("", NodeType::Export, (0, 2), 0);
        export.documentation = "// doc".to_string();
        let export = arena.push(export);
        let f = arena.push(node("f", NodeType::Function, (0, 2), 7));
        arena.add_child(file, f);

        assert!(arena.add_node_relationship(f, export));
        assert!(arena.get(f).exportable);
        assert_eq!(arena.get(f).documentation, "// doc");
        assert_eq!(arena.parent(f), Some(file));

        let nodes = arena.into_nodes(file);
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.node_type != NodeType::Export));
    }

    #[test]
    fn test_into_nodes_suffixes_duplicates() {
        let mut arena = NodeArena::new();
        let file = arena.push(Node::file("/a.py", "", Language::Python));
        let first = arena.push(node("f", NodeType::Function, (0, 1), 0));
        let mut second = node("f", NodeType::Function, (3, 4), 0);
        second.start_byte = 30;
        let second = arena.push(second);
        arena.add_child(file, first);
        arena.add_child(file, second);

        let nodes = arena.into_nodes(file);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["/a.py", "/a.py::f", "/a.py::f@4"]);
        assert_eq!(nodes[0].children, vec!["/a.py::f", "/a.py::f@4"]);
        assert_eq!(nodes[2].parent.as_deref(), Some("/a.py"));
    }

    #[test]
    fn test_propagate_exportable() {
        let mut arena = NodeArena::new();
        let file = arena.push(Node::file("/a.js", "", Language::JavaScript));
        let class = arena.push(node("Foo", NodeType::Class, (0, 5), 0));
        let method = arena.push(node("bar", NodeType::Function, (1, 2), 4));
        arena.add_child(file, class);
        arena.add_child(class, method);

        arena.propagate_exportable(class);
        assert!(!arena.get(method).exportable);

        arena.get_mut(class).exportable = true;
        arena.propagate_exportable(class);
        assert!(arena.get(method).exportable);
    }
}
