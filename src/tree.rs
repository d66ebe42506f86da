use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Stable identity of a node, assigned once when the node enters the arena.
///
/// Expansion membership and depth entries are keyed by id, so identity must
/// survive derived-view construction. Synthetic nodes created by compression
/// get fresh ids and can never collide with real ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a tree node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A folder.
    Tree,
    /// A regular file.
    Blob,
    /// A submodule link.
    Commit,
    /// A synthetic node produced by folder-chain compression.
    Virtual,
}

/// A single node in the file hierarchy.
///
/// `contents` is `Some` iff the node can contain children; only folders
/// (and their synthetic compressed counterparts) ever carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    /// Unique slash-separated path; the root's path is the empty string.
    pub path: String,
    pub kind: NodeKind,
    pub contents: Option<Vec<NodeId>>,
    pub url: Option<String>,
}

impl TreeNode {
    pub fn is_folder(&self) -> bool {
        self.contents.is_some()
    }
}

/// Arena-backed tree. Node data lives in one vector indexed by `NodeId`;
/// parent/child structure is expressed through `contents` id lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only an empty root folder.
    pub fn new() -> Self {
        let root = TreeNode {
            name: String::new(),
            path: String::new(),
            kind: NodeKind::Tree,
            contents: Some(Vec::new()),
            url: None,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a detached node and return its id.
    pub fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn child_path(&self, parent: NodeId, name: &str) -> String {
        let parent_path = &self.node(parent).path;
        if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent_path, name)
        }
    }

    fn add_child(&mut self, parent: NodeId, node: TreeNode) -> NodeId {
        let id = self.push(node);
        self.nodes[parent.index()]
            .contents
            .get_or_insert_with(Vec::new)
            .push(id);
        id
    }

    /// Append a folder under `parent`.
    pub fn add_folder(&mut self, parent: NodeId, name: &str) -> NodeId {
        let path = self.child_path(parent, name);
        self.add_child(
            parent,
            TreeNode {
                name: name.to_string(),
                path,
                kind: NodeKind::Tree,
                contents: Some(Vec::new()),
                url: None,
            },
        )
    }

    /// Append a file under `parent`.
    pub fn add_file(&mut self, parent: NodeId, name: &str) -> NodeId {
        let path = self.child_path(parent, name);
        self.add_child(
            parent,
            TreeNode {
                name: name.to_string(),
                path,
                kind: NodeKind::Blob,
                contents: None,
                url: None,
            },
        )
    }

    /// Append a submodule link under `parent`.
    pub fn add_commit(&mut self, parent: NodeId, name: &str) -> NodeId {
        let path = self.child_path(parent, name);
        self.add_child(
            parent,
            TreeNode {
                name: name.to_string(),
                path,
                kind: NodeKind::Commit,
                contents: None,
                url: None,
            },
        )
    }

    /// Ids of `id`'s children, empty for leaves.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).contents.as_deref().unwrap_or(&[])
    }

    /// Attach an already-built node under `parent`. Used by the parser,
    /// which carries paths and urls of its own.
    pub(crate) fn attach(&mut self, parent: NodeId, node: TreeNode) -> NodeId {
        self.add_child(parent, node)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }
}

/// Pre-order depth-first flattening of every descendant of `root`,
/// root itself excluded.
pub fn flatten(tree: &Tree, root: NodeId) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    collect_preorder(tree, root, &mut nodes);
    nodes
}

fn collect_preorder(tree: &Tree, id: NodeId, nodes: &mut Vec<NodeId>) {
    for &child in tree.children(id) {
        nodes.push(child);
        collect_preorder(tree, child, nodes);
    }
}

/// Build the compressed counterpart of the subtree at `root`, pushing the
/// synthetic folder nodes it needs into the arena, and return the new root id.
///
/// Chains of single-folder-child folders merge into one node whose name is
/// the `/`-joined chain and whose path is the deepest folder's path. Leaves
/// keep their identity; every folder in the compressed tree is a fresh node.
/// The root itself never joins a chain: browsing lists the root's children,
/// so even a repo that is one long chain keeps its root as the container and
/// shows a single merged entry under it.
pub fn compress(tree: &mut Tree, root: NodeId) -> NodeId {
    let children: Vec<NodeId> = tree.children(root).to_vec();
    let compressed_children: Vec<NodeId> = children
        .into_iter()
        .map(|child| compress_chain(tree, child, Vec::new()))
        .collect();

    let source = tree.node(root);
    let node = TreeNode {
        name: source.name.clone(),
        path: source.path.clone(),
        kind: source.kind,
        contents: Some(compressed_children),
        url: source.url.clone(),
    };
    tree.push(node)
}

fn compress_chain(tree: &mut Tree, id: NodeId, mut prefix: Vec<String>) -> NodeId {
    if let Some(contents) = &tree.node(id).contents {
        if contents.len() == 1 {
            let only = contents[0];
            if tree.node(only).kind == NodeKind::Tree {
                prefix.push(tree.node(id).name.clone());
                return compress_chain(tree, only, prefix);
            }
        }
    }

    // leaves never accumulate a prefix, so their identity is preserved as-is
    if tree.node(id).contents.is_none() {
        return id;
    }

    let children: Vec<NodeId> = tree.children(id).to_vec();
    let compressed_children: Vec<NodeId> = children
        .into_iter()
        .map(|child| compress_chain(tree, child, Vec::new()))
        .collect();

    let merged = !prefix.is_empty();
    let source = tree.node(id);
    let name = if merged {
        let mut segments = prefix;
        segments.push(source.name.clone());
        segments.join("/")
    } else {
        source.name.clone()
    };
    let node = TreeNode {
        name,
        path: source.path.clone(),
        kind: if merged { NodeKind::Virtual } else { source.kind },
        contents: Some(compressed_children),
        url: source.url.clone(),
    };
    tree.push(node)
}

/// The tree layer: the immutable parsed tree plus its two derived read-only
/// views, both built exactly once.
#[derive(Debug, Clone)]
pub struct TreeLayer {
    tree: Tree,
    root: NodeId,
    /// Pre-order flattening of every descendant, root excluded.
    nodes: Vec<NodeId>,
    compressed_root: NodeId,
}

impl TreeLayer {
    pub fn new(mut tree: Tree) -> Self {
        let start = Instant::now();
        let root = tree.root();
        let nodes = flatten(&tree, root);
        let compressed_root = compress(&mut tree, root);
        log::debug!(
            "tree layer: flattened {} nodes, compressed in {:?}",
            nodes.len(),
            start.elapsed()
        );
        Self {
            tree,
            root,
            nodes,
            compressed_root,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn compressed_root(&self) -> NodeId {
        self.compressed_root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        self.tree.node(id)
    }
}
