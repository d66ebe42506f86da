//! Cross-layer scenarios driving the generator the way a rendering
//! collaborator would: mutate, re-read the snapshot, assert on what would be
//! drawn.

use maplit::hashset;
use tree_explorer::parse::{parse, EntryKind, TreeEntry};
use tree_explorer::{NodeId, NodeKind, Options, Tree, VisibleNodesGenerator};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn entry(path: &str, kind: EntryKind) -> TreeEntry {
    TreeEntry {
        path: path.to_string(),
        kind,
        mode: None,
        sha: None,
        url: None,
        size: None,
    }
}

fn names(generator: &VisibleNodesGenerator) -> Vec<String> {
    generator
        .visible_nodes()
        .nodes
        .iter()
        .map(|&id| generator.node(id).name.clone())
        .collect()
}

fn id_at(generator: &VisibleNodesGenerator, name: &str) -> NodeId {
    generator
        .visible_nodes()
        .nodes
        .into_iter()
        .find(|&id| generator.node(id).name == name)
        .unwrap_or_else(|| panic!("{name} not visible"))
}

#[test]
fn test_parsed_tree_renders_folders_first_at_depth_zero() {
    init_logging();
    let entries = vec![
        entry("README.md", EntryKind::Blob),
        entry("src", EntryKind::Tree),
        entry("src/index.ts", EntryKind::Blob),
        entry("docs", EntryKind::Tree),
        entry("docs/guide.md", EntryKind::Blob),
    ];
    let parsed = parse(&entries).unwrap();
    let generator = VisibleNodesGenerator::new(parsed.tree, Options::default());
    generator.init();

    assert_eq!(names(&generator), vec!["src", "docs", "README.md"]);
    let snapshot = generator.visible_nodes();
    assert!(snapshot.nodes.iter().all(|id| snapshot.depths[id] == 0));

    generator.set_expand(id_at(&generator, "src"), true);
    assert_eq!(names(&generator), vec!["src", "index.ts", "docs", "README.md"]);
    let snapshot = generator.visible_nodes();
    assert_eq!(snapshot.depths[&id_at(&generator, "index.ts")], 1);
}

#[test]
fn test_expand_to_reveals_a_deeply_nested_file() {
    init_logging();
    let mut tree = Tree::new();
    let a = tree.add_folder(tree.root(), "a");
    let b = tree.add_folder(a, "b");
    let c = tree.add_file(b, "c");
    tree.add_file(tree.root(), "other.txt");

    let generator = VisibleNodesGenerator::new(tree, Options::default());
    generator.init();

    let found = generator.expand_to("a/b/c");
    assert_eq!(found, Some(c));

    let snapshot = generator.visible_nodes();
    assert!(snapshot.expanded_nodes.is_superset(&hashset! {a, b}));
    // c is a file, so it never joins the expanded set
    assert!(!snapshot.expanded_nodes.contains(&c));
    assert_eq!(names(&generator), vec!["a", "b", "c", "other.txt"]);
    assert_eq!(snapshot.depths[&a], 0);
    assert_eq!(snapshot.depths[&b], 1);
    assert_eq!(snapshot.depths[&c], 2);
}

#[test]
fn test_expand_to_walks_the_compressed_tree_when_browsing_compressed() {
    init_logging();
    let mut tree = Tree::new();
    let deep = tree.add_folder(tree.root(), "deep");
    let nested = tree.add_folder(deep, "nested");
    let file = tree.add_file(nested, "mod.rs");
    tree.add_file(tree.root(), "README.md");

    let generator = VisibleNodesGenerator::new(tree, Options { compress: true });
    generator.init();
    assert_eq!(names(&generator), vec!["deep/nested", "README.md"]);

    // the merged synthetic folder carries the deepest real path
    let found = generator.expand_to("deep/nested/mod.rs");
    assert_eq!(found, Some(file));
    assert_eq!(names(&generator), vec!["deep/nested", "mod.rs", "README.md"]);

    let snapshot = generator.visible_nodes();
    let merged = id_at(&generator, "deep/nested");
    assert_eq!(generator.node(merged).kind, NodeKind::Virtual);
    assert!(snapshot.expanded_nodes.contains(&merged));
    assert_eq!(snapshot.depths[&file], 1);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_search_results_are_emitted_once() {
    init_logging();
    // the folder "app" and the file inside it both match the key, and the
    // file is also reachable through its expanded parent
    let mut tree = Tree::new();
    let app = tree.add_folder(tree.root(), "app");
    let app_rs = tree.add_file(app, "app.rs");
    tree.add_file(tree.root(), "notes.txt");

    let generator = VisibleNodesGenerator::new(tree, Options::default());
    generator.init();

    assert!(generator.search("app").await);
    assert_eq!(names(&generator), vec!["app", "app.rs"]);

    generator.set_expand(app, true);
    let snapshot = generator.visible_nodes();
    assert_eq!(snapshot.nodes, vec![app, app_rs]);
    assert_eq!(snapshot.depths[&app], 0);
    // emitted as a child of the expanded folder, not again as a search hit
    assert_eq!(snapshot.depths[&app_rs], 1);
}

#[tokio::test(start_paused = true)]
async fn test_depths_are_replaced_wholesale_between_views() {
    init_logging();
    let mut tree = Tree::new();
    let src = tree.add_folder(tree.root(), "src");
    let main = tree.add_file(src, "main.rs");

    let generator = VisibleNodesGenerator::new(tree, Options::default());
    generator.init();
    generator.set_expand(src, true);
    assert_eq!(generator.visible_nodes().depths[&main], 1);

    // the searched list is flat, so the old depth-1 entry must be gone
    assert!(generator.search("main").await);
    let snapshot = generator.visible_nodes();
    assert_eq!(snapshot.depths[&main], 0);
    assert!(!snapshot.depths.contains_key(&src));
    assert_eq!(snapshot.depths.len(), snapshot.nodes.len());
}

#[tokio::test(start_paused = true)]
async fn test_collapsed_branches_are_never_descended_into() {
    init_logging();
    let mut tree = Tree::new();
    let src = tree.add_folder(tree.root(), "src");
    let inner = tree.add_folder(src, "inner");
    tree.add_file(inner, "hidden.rs");

    let generator = VisibleNodesGenerator::new(tree, Options::default());
    generator.init();
    generator.set_expand(src, true);
    generator.set_expand(inner, true);
    assert_eq!(names(&generator), vec!["src", "inner", "hidden.rs"]);

    // collapsing src hides inner's subtree even though inner stays expanded
    generator.set_expand(src, false);
    assert_eq!(names(&generator), vec!["src"]);
    assert!(generator.visible_nodes().expanded_nodes.contains(&inner));

    generator.set_expand(src, true);
    assert_eq!(names(&generator), vec!["src", "inner", "hidden.rs"]);
}
