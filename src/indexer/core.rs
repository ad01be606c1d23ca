use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::code_parser::CodeParser;
use super::definitions;
use super::imports::ImportResolver;
use super::languages::{self, Language};
use super::relations::{CallsCapturer, NameTable, namespace_token};
use crate::config::Config;
use crate::error::Result;
use crate::graph::{GraphLink, GraphNode, ImportName, ImportStatement, LinkLabel, Node, NodeType};

/// An input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub files_parsed: usize,
    pub files_skipped: usize,
    pub nodes: usize,
    pub unresolved_imports: usize,
    pub call_edges: usize,
}

/// Every node of a run, keyed by id, plus the resolved call edges.
pub struct Codebase {
    root: String,
    nodes_map: BTreeMap<String, Node>,
    /// In input order.
    file_ids: Vec<String>,
    /// Caller id to callee id to 1-based lines.
    calls: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
    parser: CodeParser,
    resolver: ImportResolver,
    parallel: bool,
}

impl Codebase {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            nodes_map: BTreeMap::new(),
            file_ids: Vec::new(),
            calls: BTreeMap::new(),
            parser: CodeParser::new(),
            resolver: ImportResolver::default(),
            parallel: true,
        }
    }

    /// Runs both phases on the calling thread when `false`.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes_map.insert(node.id.clone(), node);
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes_map.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_map.is_empty()
    }

    pub fn file_ids(&self) -> &[String] {
        &self.file_ids
    }

    /// Call targets of `id` with their lines.
    pub fn calls_of(&self, id: &str) -> Option<&BTreeMap<String, Vec<usize>>> {
        self.calls.get(id)
    }

    /// Walks the root folder and builds the graph of every supported file.
    pub fn parse_folder(&mut self, config: &Config) -> anyhow::Result<IndexStats> {
        let exclusions = config.exclusion_set()?;
        let root = PathBuf::from(&self.root);

        let mut builder = WalkBuilder::new(&root);
        builder
            .hidden(!config.include_hidden)
            .git_ignore(config.respect_gitignore)
            .git_global(config.respect_gitignore)
            .git_exclude(config.respect_gitignore)
            .require_git(false)
            .filter_entry({
                let root = root.clone();
                move |entry| {
                    let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                    relative.as_os_str().is_empty() || !exclusions.is_match(relative)
                }
            });

        let mut paths = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("walk error under {}: {e}", self.root);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            // Keep ids stable across platforms
            let path = entry.path().to_string_lossy().replace('\\', "/");
            if languages::is_excluded_file(&path) || Language::from_path(&path).is_err() {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut unreadable = 0;
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match std::fs::read_to_string(&path) {
                Ok(content) => files.push(SourceFile::new(path, content)),
                Err(e) => {
                    warn!("skipping unreadable {path}: {e}");
                    unreadable += 1;
                }
            }
        }

        let mut stats = self.parse_sources(files);
        stats.files_skipped += unreadable;
        Ok(stats)
    }

    /// Builds the graph from in-memory sources.
    ///
    /// Phase one extracts every file, imports are then resolved against the
    /// whole file set, and phase two resolves the calls of every entity.
    pub fn parse_sources(&mut self, files: Vec<SourceFile>) -> IndexStats {
        let mut stats = IndexStats::default();

        let extract = |file: &SourceFile| {
            (
                file.path.clone(),
                definitions::extract_file(&self.parser, &file.path, &file.content),
            )
        };
        let extracted: Vec<(String, Result<Vec<Node>>)> = if self.parallel {
            files.par_iter().map(extract).collect()
        } else {
            files.iter().map(extract).collect()
        };

        for (path, result) in extracted {
            match result {
                Ok(nodes) => {
                    stats.files_parsed += 1;
                    if let Some(file) = nodes.first() {
                        self.file_ids.push(file.id.clone());
                    }
                    for node in nodes {
                        self.add_node(node);
                    }
                }
                Err(e) => {
                    warn!("skipping {path}: {e}");
                    stats.files_skipped += 1;
                }
            }
        }

        stats.unresolved_imports = self.resolve_imports();

        let resolved: Vec<(String, BTreeMap<String, Vec<usize>>)> = if self.parallel {
            self.file_ids.par_iter().flat_map_iter(|id| self.file_calls(id)).collect()
        } else {
            self.file_ids.iter().flat_map(|id| self.file_calls(id)).collect()
        };
        stats.call_edges = self.apply_calls(resolved);
        stats.nodes = self.nodes_map.len();

        info!(
            "indexed {} files ({} skipped): {} nodes, {} call edges, {} unresolved imports",
            stats.files_parsed, stats.files_skipped, stats.nodes, stats.call_edges, stats.unresolved_imports
        );
        stats
    }

    fn resolve_imports(&mut self) -> usize {
        self.resolver = ImportResolver::new(self.root.as_str(), self.file_ids.iter().cloned());
        let mut unresolved = 0;
        for id in &self.file_ids {
            let Some(file) = self.nodes_map.get_mut(id) else {
                continue;
            };
            for statement in &mut file.import_statements {
                if !self.resolver.resolve(&file.id, file.language, statement) {
                    unresolved += 1;
                }
            }
        }
        unresolved
    }

    /// Calls of the file node and every entity below it.
    fn file_calls(&self, file_id: &str) -> Vec<(String, BTreeMap<String, Vec<usize>>)> {
        let Some(file) = self.get_node(file_id) else {
            return Vec::new();
        };
        let names = self.name_table(file_id);
        let capturer = CallsCapturer::new(&self.parser, file.language, &names, &file.import_statements);

        let mut out = Vec::new();
        for node in std::iter::once(file).chain(self.descendants(file_id)) {
            let children = self.children_of(node);
            let parent = node.parent.as_deref().and_then(|p| self.get_node(p));
            let calls = capturer.get_calls(node, &children, parent);
            if !calls.is_empty() {
                out.push((node.id.clone(), calls));
            }
        }
        out
    }

    fn apply_calls(&mut self, resolved: Vec<(String, BTreeMap<String, Vec<usize>>)>) -> usize {
        let mut edges = 0;
        for (source, targets) in resolved {
            for (target, lines) in targets {
                if target == source || !self.nodes_map.contains_key(&target) {
                    continue;
                }
                let callees = self.calls.entry(source.clone()).or_default();
                if callees.insert(target.clone(), lines).is_some() {
                    continue;
                }
                if let Some(caller) = self.nodes_map.get_mut(&source) {
                    caller.out_degree += 1;
                }
                if let Some(callee) = self.nodes_map.get_mut(&target) {
                    callee.in_degree += 1;
                }
                edges += 1;
            }
        }
        edges
    }

    /// Names visible in a file: its own entities, then what it imports.
    pub fn name_table(&self, file_id: &str) -> NameTable {
        let mut names = NameTable::new();
        let Some(file) = self.get_node(file_id) else {
            return names;
        };

        for node in self.descendants(file_id) {
            names.insert(node.label(), node.id.as_str());
            names.insert(node.name.as_str(), node.id.as_str());
        }
        for statement in &file.import_statements {
            self.register_import(&mut names, file.language, statement);
        }

        // same package
        if file.language == Language::Java {
            let dir = Path::new(file_id).parent().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
            for sibling in self.resolver.files_in_dir(&dir) {
                if sibling == file_id {
                    continue;
                }
                for child in self.top_level(sibling) {
                    self.register_tree(&mut names, child.label(), child);
                }
            }
        }
        names
    }

    fn register_import(&self, names: &mut NameTable, language: Language, statement: &ImportStatement) {
        if !statement.is_resolved() {
            return;
        }
        let mut files: Vec<&Node> = self
            .resolver
            .files_for_stem(&statement.path)
            .iter()
            .filter_map(|f| self.get_node(f))
            .collect();

        if statement.wildcard || (statement.names.is_empty() && language.includes_whole_file()) {
            if files.is_empty() {
                files = self
                    .resolver
                    .files_in_dir(&statement.path)
                    .into_iter()
                    .filter_map(|f| self.get_node(f))
                    .collect();
            }
            for file in files {
                for child in self.top_level(&file.id).filter(|c| c.exportable) {
                    self.register_tree(names, child.label(), child);
                }
            }
            return;
        }

        if statement.names.is_empty() {
            let token = namespace_token(statement);
            if let Some(file) = files.first() {
                self.register_tree(names, token, file);
            }
            return;
        }

        for name in &statement.names {
            match self.import_target(&files, name) {
                Some(target) => self.register_tree(names, &name.name, target),
                None => debug!("{}: no target for {}", statement.module, name.name),
            }
        }
    }

    /// The node an imported name refers to.
    fn import_target<'a>(&'a self, files: &[&'a Node], name: &ImportName) -> Option<&'a Node> {
        for file in files {
            if let Some(found) = self.top_level(&file.id).find(|c| c.label() == name.name) {
                return Some(found);
            }
            if let Some(found) = self.descendants(&file.id).find(|d| d.label() == name.name) {
                return Some(found);
            }
        }
        if name.subpath.is_empty() {
            return None;
        }
        let sub_files: Vec<&Node> = self
            .resolver
            .files_for_stem(&name.subpath)
            .iter()
            .filter_map(|f| self.get_node(f))
            .collect();
        sub_files
            .iter()
            .find_map(|f| {
                self.top_level(&f.id)
                    .find(|c| c.label() == name.name)
                    .or_else(|| self.descendants(&f.id).find(|d| d.label() == name.name))
            })
            .or_else(|| sub_files.first().copied())
    }

    /// Registers `node` under `key` and its descendants under `key` plus the
    /// rest of their label: `Foo.bar` for a class, `mod.helper` for a file.
    fn register_tree(&self, names: &mut NameTable, key: &str, node: &Node) {
        names.insert_import(key, node.id.as_str());
        for descendant in self.descendants(&node.id) {
            let label = descendant.label();
            let qualified = if node.node_type == NodeType::File {
                format!("{key}.{label}")
            } else {
                match label.strip_prefix(node.label()).filter(|rest| rest.starts_with('.')) {
                    Some(rest) => format!("{key}{rest}"),
                    None => continue,
                }
            };
            names.insert_import(qualified, descendant.id.as_str());
        }
    }

    fn top_level<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Node> + use<'a> {
        self.get_node(id)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|c| self.get_node(c))
    }

    fn children_of<'a>(&'a self, node: &Node) -> Vec<&'a Node> {
        node.children.iter().filter_map(|c| self.get_node(c)).collect()
    }

    /// Nodes below `id` in pre-order.
    pub fn descendants<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Node> + use<'a> {
        let mut stack: Vec<&'a Node> = self.get_node(id).map(|n| self.children_of(n)).unwrap_or_default();
        stack.reverse();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children_of(next).into_iter().rev());
            Some(next)
        })
    }

    /// Every node in output form, each file followed by its tree.
    pub fn nodes(&self) -> Vec<GraphNode> {
        self.ordered()
            .map(|node| GraphNode::from_node(node, &self.children_of(node)))
            .collect()
    }

    /// `defines` edges from child to parent, then `calls` edges.
    pub fn links(&self) -> Vec<GraphLink> {
        let mut links: Vec<GraphLink> = self
            .ordered()
            .filter_map(|node| {
                node.parent.as_ref().map(|parent| GraphLink {
                    source: node.id.clone(),
                    target: parent.clone(),
                    label: LinkLabel::Defines,
                    line: None,
                })
            })
            .collect();
        for (source, targets) in &self.calls {
            for (target, lines) in targets {
                links.push(GraphLink {
                    source: source.clone(),
                    target: target.clone(),
                    label: LinkLabel::Calls,
                    line: lines.first().copied(),
                });
            }
        }
        links
    }

    fn ordered(&self) -> impl Iterator<Item = &Node> + '_ {
        self.file_ids
            .iter()
            .filter_map(|id| self.get_node(id))
            .flat_map(|file| std::iter::once(file).chain(self.descendants(&file.id)))
    }

    /// Writes nodes and links as pretty JSON.
    pub fn write_json(&self, nodes_path: &Path, links_path: &Path) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(nodes_path)?), &self.nodes())?;
        serde_json::to_writer_pretty(BufWriter::new(File::create(links_path)?), &self.links())?;
        Ok(())
    }
}

/// Builds the graph of a folder with `config`.
pub fn index_folder(root: &Path, config: &Config) -> anyhow::Result<(Codebase, IndexStats)> {
    let root = std::path::absolute(root).with_context(|| format!("invalid root: {}", root.display()))?;
    let mut codebase = Codebase::new(root.to_string_lossy().replace('\\', "/")).with_parallel(config.parallel);
    let stats = codebase.parse_folder(config)?;
    Ok((codebase, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(files: &[(&str, &str)]) -> Codebase {
        let mut codebase = Codebase::new("/repo").with_parallel(false);
        codebase.parse_sources(files.iter().map(|(p, c)| SourceFile::new(*p, *c)).collect());
        codebase
    }

    #[test]
    fn test_python_cross_file_calls() {
        let codebase = build(&[
            (
                "/repo/models.py",
                "class MyClass:\n    def my_method(self):\n        return 1\n",
            ),
            (
                "/repo/main.py",
                "from models import MyClass\n\ndef run():\n    my_class = MyClass()\n    my_class.my_method()\n",
            ),
        ]);

        let calls = codebase.calls_of("/repo/main.py::run").expect("run has calls");
        assert_eq!(calls.get("/repo/models.py::MyClass"), Some(&vec![4, 5]));
        assert_eq!(calls.get("/repo/models.py::MyClass.my_method"), Some(&vec![5]));

        let method = codebase.get_node("/repo/models.py::MyClass.my_method").unwrap();
        assert_eq!(method.in_degree, 1);
        // defines edge to the class
        assert_eq!(method.out_degree, 1);
    }

    #[test]
    fn test_unsupported_file_is_skipped() {
        let mut codebase = Codebase::new("/repo").with_parallel(false);
        let stats = codebase.parse_sources(vec![
            SourceFile::new("/repo/a.py", "def f():\n    pass\n"),
            SourceFile::new("/repo/README.md", "# readme"),
        ]);
        assert_eq!(stats.files_parsed, 1);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.nodes, 2);
        assert!(codebase.get_node("/repo/README.md").is_none());
    }

    #[test]
    fn test_links_match_degrees() {
        let codebase = build(&[
            ("/repo/util.js", "export function helper() {\n  return 1;\n}\n"),
            (
                "/repo/app.js",
                "import { helper as h } from './util';\n\nfunction main() {\n  return h();\n}\n",
            ),
        ]);
        let links = codebase.links();
        for node in codebase.nodes() {
            let out = links.iter().filter(|l| l.source == node.id).count();
            let incoming = links.iter().filter(|l| l.target == node.id).count();
            assert_eq!(node.out_degree, out, "out degree of {}", node.id);
            assert_eq!(node.in_degree, incoming, "in degree of {}", node.id);
        }
        assert!(links.iter().any(|l| l.label == LinkLabel::Calls
            && l.source == "/repo/app.js::main"
            && l.target == "/repo/util.js::helper"
            && l.line == Some(4)));
    }

    #[test]
    fn test_namespace_import() {
        let codebase = build(&[
            ("/repo/pkg/helpers.py", "def clean(x):\n    return x\n"),
            (
                "/repo/main.py",
                "import pkg.helpers as h\n\ndef run():\n    return h.clean(1)\n",
            ),
        ]);
        let names = codebase.name_table("/repo/main.py");
        assert_eq!(names.get("pkg.helpers"), Some("/repo/pkg/helpers.py"));
        assert_eq!(names.get("pkg.helpers.clean"), Some("/repo/pkg/helpers.py::clean"));

        let calls = codebase.calls_of("/repo/main.py::run").unwrap();
        assert!(calls.contains_key("/repo/pkg/helpers.py::clean"));
    }

    #[test]
    fn test_c_include_brings_definitions() {
        let codebase = build(&[
            ("/repo/util.h", "int add(int a, int b);\n"),
            ("/repo/util.c", "int add(int a, int b) {\n  return a + b;\n}\n"),
            (
                "/repo/main.c",
                "#include \"util.h\"\n\nint main(void) {\n  return add(1, 2);\n}\n",
            ),
        ]);
        let calls = codebase.calls_of("/repo/main.c::main").unwrap();
        assert_eq!(calls.get("/repo/util.c::add"), Some(&vec![4]));
    }

    #[test]
    fn test_local_names_win() {
        let codebase = build(&[
            ("/repo/other.py", "def helper():\n    pass\n"),
            (
                "/repo/main.py",
                "from other import helper\n\ndef helper():\n    pass\n\ndef run():\n    helper()\n",
            ),
        ]);
        let names = codebase.name_table("/repo/main.py");
        assert_eq!(names.get("helper"), Some("/repo/main.py::helper"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let files = [
            ("/repo/a.py", "def a():\n    b()\n"),
            ("/repo/b.py", "from a import a\n\ndef b():\n    a()\n"),
        ];
        let sequential = build(&files);
        let mut parallel = Codebase::new("/repo");
        parallel.parse_sources(files.iter().map(|(p, c)| SourceFile::new(*p, *c)).collect());

        assert_eq!(sequential.nodes(), parallel.nodes());
        assert_eq!(sequential.links(), parallel.links());
    }

    #[test]
    fn test_php_global_assignment_calls() {
        let codebase = build(&[(
            "/repo/Repo.php",
            "<?php\nclass Repo {\n    public function find() {\n        return 1;\n    }\n}\n\n$r = new Repo();\n$r->find();\n",
        )]);
        let global = codebase.get_node("/repo/Repo.php::r").unwrap();
        assert_eq!(global.code, "$r = new Repo();\n$r->find();");

        let calls = codebase.calls_of("/repo/Repo.php::r").expect("the global has calls");
        assert_eq!(calls.get("/repo/Repo.php::Repo"), Some(&vec![8]));
        assert_eq!(calls.get("/repo/Repo.php::Repo.find"), Some(&vec![9]));
    }

    #[test]
    fn test_java_calls() {
        let codebase = build(&[
            (
                "/repo/file1/Foo.java",
                "package file1;\n\npublic class Foo {\n    public void method() {\n    }\n\n    public void method2() {\n        this.method();\n    }\n}\n",
            ),
            (
                "/repo/Test.java",
                "import file1.Foo;\n\npublic class Test {\n    public static void main(String[] args) {\n        Foo fooVar = new Foo();\n        fooVar.method();\n    }\n}\n",
            ),
        ]);

        let main = codebase.calls_of("/repo/Test.java::Test.main").expect("main has calls");
        assert_eq!(main.get("/repo/file1/Foo.java::Foo.method"), Some(&vec![6]));
        assert!(main.get("/repo/file1/Foo.java::Foo").is_some_and(|lines| lines.contains(&5)));

        let method2 = codebase.calls_of("/repo/file1/Foo.java::Foo.method2").expect("method2 has calls");
        assert_eq!(method2.get("/repo/file1/Foo.java::Foo.method"), Some(&vec![8]));
        assert_eq!(codebase.get_node("/repo/file1/Foo.java::Foo.method").unwrap().in_degree, 2);
    }

    #[test]
    fn test_php_namespace_use_calls() {
        let codebase = build(&[
            (
                "/repo/MyProject/Utilities/Helper.php",
                "<?php\nnamespace MyProject\\Utilities;\n\nclass Helper {\n    public static function greet($user) {\n        return self::format($user);\n    }\n\n    public function shout($user) {\n        return $this->format($user);\n    }\n\n    public static function format($user) {\n        return $user;\n    }\n}\n",
            ),
            (
                "/repo/main.php",
                "<?php\nuse MyProject\\Utilities\\Helper;\n\nfunction run($user) {\n    return Helper::greet($user);\n}\n",
            ),
        ]);
        let names = codebase.name_table("/repo/main.php");
        assert_eq!(names.get("Helper"), Some("/repo/MyProject/Utilities/Helper.php::Helper"));

        let run = codebase.calls_of("/repo/main.php::run").expect("run has calls");
        assert_eq!(
            run.get("/repo/MyProject/Utilities/Helper.php::Helper.greet"),
            Some(&vec![5])
        );

        let shout = codebase
            .calls_of("/repo/MyProject/Utilities/Helper.php::Helper.shout")
            .expect("shout has calls");
        assert_eq!(
            shout.get("/repo/MyProject/Utilities/Helper.php::Helper.format"),
            Some(&vec![10])
        );
    }

    #[test]
    fn test_declared_type_name_is_not_a_call() {
        let codebase = build(&[
            (
                "/repo/foo.ts",
                "export class Foo {\n  run(): void {}\n}\n\nexport interface Shape {}\n",
            ),
            (
                "/repo/make.ts",
                "import { Foo, Shape } from './foo';\n\nexport function make(x: Foo): Shape {\n  return x;\n}\n",
            ),
        ]);
        assert!(codebase.calls_of("/repo/foo.ts").is_none());

        let make = codebase.calls_of("/repo/make.ts::make").expect("make has calls");
        assert_eq!(make.get("/repo/foo.ts::Foo"), Some(&vec![3]));
        assert_eq!(make.get("/repo/foo.ts::Shape"), Some(&vec![3]));
    }
}
