/// End-to-end tests for the codegraph pipeline.
///
/// Tests the complete flow:
///   Config → folder walk → definitions → imports → calls → JSON output
use codegraph::config::Config;
use codegraph::graph::models::{GraphLink, GraphNode, LinkLabel};
use codegraph::graph::node::NodeType;
use codegraph::indexer::index_folder;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sequential() -> Config {
    Config {
        parallel: false,
        ..Config::default()
    }
}

/// Python project: class promotion, assignment-aware calls, docstrings
#[test]
fn test_python_project() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "models.py",
        "class MyClass:\n    \"\"\"A model.\"\"\"\n    def my_method(self):\n        return 1\n",
    );
    write(
        root,
        "main.py",
        "from models import MyClass\n\ndef run():\n    my_class = MyClass()\n    my_class.my_method()\n",
    );

    let (codebase, stats) = index_folder(root, &Config::default()).unwrap();
    let base = codebase.root().to_string();
    assert_eq!(stats.files_parsed, 2);
    assert_eq!(stats.files_skipped, 0);
    assert_eq!(stats.unresolved_imports, 0);

    let method = codebase
        .get_node(&format!("{base}/models.py::MyClass.my_method"))
        .expect("method is promoted under its class");
    assert_eq!(method.node_type, NodeType::Method);
    assert_eq!(method.parent.as_deref(), Some(format!("{base}/models.py::MyClass").as_str()));

    let class = codebase.get_node(&format!("{base}/models.py::MyClass")).unwrap();
    assert_eq!(class.documentation, "\"\"\"A model.\"\"\"");

    let calls = codebase.calls_of(&format!("{base}/main.py::run")).unwrap();
    assert_eq!(calls.get(&format!("{base}/models.py::MyClass.my_method")), Some(&vec![5]));
    assert!(calls.contains_key(&format!("{base}/models.py::MyClass")));
}

/// `export { bar as cbar }` renames the label and exports the function
#[test]
fn test_javascript_export_rename() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "lib.js", "function bar() {\n  return 1;\n}\n\nexport { bar as cbar };\n");

    let (codebase, _) = index_folder(root, &sequential()).unwrap();
    let base = codebase.root().to_string();

    let nodes = codebase.nodes();
    let bar = nodes.iter().find(|n| n.id == format!("{base}/lib.js::bar")).unwrap();
    assert_eq!(bar.label, "cbar");
    assert_eq!(bar.name, "bar");
    assert!(bar.exportable);
}

/// A sibling file wins over a folder index
#[test]
fn test_typescript_import_paths() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "a/b/myModule.ts", "export function foo() {\n  return 1;\n}\n");
    write(root, "a/c/myModule/index.ts", "export function bar() {\n  return 2;\n}\n");
    write(
        root,
        "a/b/main.ts",
        "import { foo } from './myModule';\nimport { bar } from '../c/myModule';\n\nexport function main() {\n  return foo() + bar();\n}\n",
    );

    let (codebase, stats) = index_folder(root, &sequential()).unwrap();
    let base = codebase.root().to_string();
    assert_eq!(stats.unresolved_imports, 0);

    let main = codebase.get_node(&format!("{base}/a/b/main.ts")).unwrap();
    let paths: Vec<&str> = main.import_statements.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![format!("{base}/a/b/myModule"), format!("{base}/a/c/myModule/index")]
    );

    let calls = codebase.calls_of(&format!("{base}/a/b/main.ts::main")).unwrap();
    assert_eq!(calls.get(&format!("{base}/a/b/myModule.ts::foo")), Some(&vec![5]));
    assert_eq!(calls.get(&format!("{base}/a/c/myModule/index.ts::bar")), Some(&vec![5]));
}

/// Top-level C declarations become globals and `#include` links across files
#[test]
fn test_c_project() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "util.c", "int add(int a, int b) {\n  return a + b;\n}\n");
    write(root, "util.h", "int add(int a, int b);\n");
    write(
        root,
        "main.c",
        "#include <stdio.h>\n#include \"util.h\"\n\nint a = 1;\nstatic int b = 2;\nchar *name = \"x\";\n\nint main(void) {\n  return add(a, b);\n}\n",
    );

    let (codebase, _) = index_folder(root, &sequential()).unwrap();
    let base = codebase.root().to_string();

    let file = codebase.get_node(&format!("{base}/main.c")).unwrap();
    let globals: Vec<&str> = file
        .children
        .iter()
        .filter_map(|id| codebase.get_node(id))
        .filter(|n| n.node_type == NodeType::Assignment)
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(globals, vec!["a", "b", "name"]);

    let calls = codebase.calls_of(&format!("{base}/main.c::main")).unwrap();
    assert_eq!(calls.get(&format!("{base}/util.c::add")), Some(&vec![9]));
}

/// Unsupported files, excluded folders and ignored paths never become nodes
#[test]
fn test_folder_walk_exclusions() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "src/app.py", "def app():\n    pass\n");
    write(root, "README.md", "# readme\n");
    write(root, "node_modules/dep/index.js", "export function dep() {}\n");
    write(root, "static/app.min.js", "function x(){}\n");
    write(root, "types/index.d.ts", "export declare function t(): void;\n");
    write(root, "generated/gen.py", "def gen():\n    pass\n");
    write(root, ".gitignore", "generated/\n");

    let (codebase, stats) = index_folder(root, &sequential()).unwrap();
    let base = codebase.root().to_string();

    assert_eq!(codebase.file_ids(), &[format!("{base}/src/app.py")]);
    assert_eq!(stats.files_parsed, 1);
    assert_eq!(stats.nodes, 2);

    // Without gitignore support the generated file is indexed
    let config = Config {
        respect_gitignore: false,
        ..sequential()
    };
    let (codebase, _) = index_folder(root, &config).unwrap();
    assert!(codebase.get_node(&format!("{base}/generated/gen.py::gen")).is_some());
    assert!(codebase.get_node(&format!("{base}/node_modules/dep/index.js")).is_none());
}

fn mixed_project(root: &Path) {
    write(root, "pkg/helpers.py", "def clean(x):\n    return x\n\nclass Tool:\n    def use(self):\n        return clean(1)\n");
    write(
        root,
        "main.py",
        "import pkg.helpers as h\nfrom pkg.helpers import Tool\n\ndef run():\n    t = Tool()\n    t.use()\n    return h.clean(2)\n",
    );
    write(root, "web/util.js", "export function helper() {\n  return 1;\n}\n");
    write(
        root,
        "web/app.js",
        "import { helper as h } from './util';\n\nclass App {\n  start() {\n    return h();\n  }\n}\n",
    );
}

/// Every emitted node's degrees match the emitted links
#[test]
fn test_degrees_match_links() {
    let temp_dir = tempdir().unwrap();
    mixed_project(temp_dir.path());

    let (codebase, stats) = index_folder(temp_dir.path(), &Config::default()).unwrap();
    let nodes = codebase.nodes();
    let links = codebase.links();
    assert_eq!(nodes.len(), stats.nodes);
    assert_eq!(
        links.iter().filter(|l| l.label == LinkLabel::Calls).count(),
        stats.call_edges
    );

    for node in &nodes {
        let out = links.iter().filter(|l| l.source == node.id).count();
        let incoming = links.iter().filter(|l| l.target == node.id).count();
        assert_eq!(node.out_degree, out, "out degree of {}", node.id);
        assert_eq!(node.in_degree, incoming, "in degree of {}", node.id);
        for child in &node.children {
            assert!(links.iter().any(|l| l.label == LinkLabel::Defines
                && &l.source == child
                && l.target == node.id));
        }
    }
}

/// Two runs over the same tree produce the same graph
#[test]
fn test_idempotent_runs() {
    let temp_dir = tempdir().unwrap();
    mixed_project(temp_dir.path());

    let (first, _) = index_folder(temp_dir.path(), &Config::default()).unwrap();
    let (second, _) = index_folder(temp_dir.path(), &sequential()).unwrap();
    assert_eq!(first.nodes(), second.nodes());
    assert_eq!(first.links(), second.links());
}

/// nodes.json and links.json round-trip through serde
#[test]
fn test_write_json() {
    let temp_dir = tempdir().unwrap();
    let src = temp_dir.path().join("src");
    mixed_project(&src);

    let (codebase, _) = index_folder(&src, &sequential()).unwrap();
    let nodes_path = temp_dir.path().join("nodes.json");
    let links_path = temp_dir.path().join("links.json");
    codebase.write_json(&nodes_path, &links_path).unwrap();

    let raw = fs::read_to_string(&nodes_path).unwrap();
    assert!(raw.contains("\"codeNoBody\""));
    assert!(raw.contains("\"originFile\""));
    let nodes: Vec<GraphNode> = serde_json::from_str(&raw).unwrap();
    assert_eq!(nodes, codebase.nodes());

    let links: Vec<GraphLink> = serde_json::from_str(&fs::read_to_string(&links_path).unwrap()).unwrap();
    assert_eq!(links, codebase.links());
    assert!(links.iter().all(|l| (l.label == LinkLabel::Calls) == l.line.is_some()));
}
