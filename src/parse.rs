//! Turns the flat entry list returned by a git hosting API into the tree the
//! generation engine consumes. Entries may arrive in any order and truncated
//! listings may omit intermediate folders; both are handled here so the
//! engine can rely on a well-formed hierarchy with folders sorted first.

use crate::error::{Result, TreeExplorerError};
use crate::tree::{NodeId, NodeKind, Tree, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Entry type as reported by the hosting API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Tree,
    Blob,
    Commit,
}

impl From<EntryKind> for NodeKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Tree => NodeKind::Tree,
            EntryKind::Blob => NodeKind::Blob,
            EntryKind::Commit => NodeKind::Commit,
        }
    }
}

/// One raw item of a `git/trees?recursive=1` style listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// The whole API payload; only the entry list matters here.
#[derive(Debug, Deserialize)]
pub struct TreePayload {
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// Result of parsing: the tree plus the root-level `.gitmodules` file, if
/// any, for the submodule-resolution collaborator.
#[derive(Debug, Clone)]
pub struct ParsedTree {
    pub tree: Tree,
    pub git_modules: Option<NodeId>,
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Build a tree from a flat entry list.
///
/// For each entry, the deepest already-created ancestor is located bottom-up,
/// then the missing chain is created top-down. Ancestors without an entry of
/// their own (truncated listings) become plain folders. Entries whose path
/// was already created are silently ignored; an empty path is rejected.
pub fn parse(entries: &[TreeEntry]) -> Result<ParsedTree> {
    let start = Instant::now();
    let mut tree = Tree::new();

    let entry_by_path: HashMap<&str, &TreeEntry> =
        entries.iter().map(|entry| (entry.path.as_str(), entry)).collect();
    let mut node_by_path: HashMap<String, NodeId> = HashMap::new();
    node_by_path.insert(String::new(), tree.root());

    for entry in entries {
        if entry.path.is_empty() {
            return Err(TreeExplorerError::invalid_entry(
                &entry.path,
                "entry path must not be empty",
            ));
        }

        let mut missing: Vec<&str> = Vec::new();
        let mut path = entry.path.as_str();
        while !path.is_empty() && !node_by_path.contains_key(path) {
            missing.push(path);
            path = parent_of(path);
        }

        let mut parent = node_by_path[path];
        while let Some(create) = missing.pop() {
            let node = match entry_by_path.get(create) {
                Some(item) => TreeNode {
                    name: last_segment(create).to_string(),
                    path: create.to_string(),
                    kind: item.kind.into(),
                    contents: (item.kind == EntryKind::Tree).then(Vec::new),
                    url: item.url.clone(),
                },
                // ancestor not listed by the API, it can only be a folder
                None => TreeNode {
                    name: last_segment(create).to_string(),
                    path: create.to_string(),
                    kind: NodeKind::Tree,
                    contents: Some(Vec::new()),
                    url: None,
                },
            };
            let id = tree.attach(parent, node);
            node_by_path.insert(create.to_string(), id);
            parent = id;
        }
    }

    let root = tree.root();
    sort_folders_to_front(&mut tree, root);
    let git_modules = find_git_modules(&tree);

    log::info!(
        "parsed {} entries into {} nodes in {:?}",
        entries.len(),
        tree.len() - 1,
        start.elapsed()
    );
    Ok(ParsedTree { tree, git_modules })
}

/// Decode a `{"tree": [...]}` payload and parse it.
pub fn parse_json(payload: &str) -> Result<ParsedTree> {
    let payload: TreePayload = serde_json::from_str(payload)?;
    if payload.truncated {
        log::warn!("tree listing was truncated by the API; missing folders are synthesized");
    }
    parse(&payload.tree)
}

/// Stable partition of every folder's children: folders first, then the
/// rest, each group keeping its upstream relative order. The generation
/// engine relies on this ordering contract.
fn sort_folders_to_front(tree: &mut Tree, id: NodeId) {
    let children: Vec<NodeId> = tree.children(id).to_vec();
    if children.is_empty() {
        return;
    }
    let mut reordered = children.clone();
    reordered.sort_by_key(|&child| !tree.node(child).is_folder());
    if let Some(contents) = &mut tree.node_mut(id).contents {
        *contents = reordered;
    }
    for child in children {
        sort_folders_to_front(tree, child);
    }
}

fn find_git_modules(tree: &Tree) -> Option<NodeId> {
    tree.children(tree.root())
        .iter()
        .copied()
        .find(|&child| tree.node(child).name == ".gitmodules")
}
