//! The layered generation engine.
//!
//! Four pieces of mutable state sit on top of one immutable tree, each layer
//! a pure function of the layer below it:
//!
//! ```text
//! 4 focus      focused node pointer          changes on hover/focus move
//! 3 expansion  expanded set -> visible walk  changes on fold/unfold
//! 2 view       search key -> searched list   changes on search
//! 1 tree       root -> flat list, compressed built once per parsed tree
//! ```
//!
//! Mutating a layer recomputes only the layers above it: search rebuilds the
//! searched list, the visible walk and the focus composition; expansion
//! changes rebuild only the visible walk; focus changes rebuild nothing.
//! No layer ever reads state from a layer above it.

use crate::search::{self, debounce_wait, Debouncer};
use crate::tree::{NodeId, Tree, TreeLayer, TreeNode};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Construction options for [`VisibleNodesGenerator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Merge chains of single-child folders into one entry while browsing.
    pub compress: bool,
}

/// Layer 2: search key and compression toggle.
#[derive(Debug)]
struct ViewState {
    compress_enabled: bool,
    /// Whether the last search left compression active. Suppressed while a
    /// search key is set, because results must show real paths rather than
    /// merged synthetic ones.
    compressed: bool,
    searched: Option<Vec<NodeId>>,
}

impl ViewState {
    fn new(compress_enabled: bool) -> Self {
        Self {
            compress_enabled,
            compressed: false,
            searched: None,
        }
    }

    fn current_root(&self, tree: &TreeLayer) -> NodeId {
        if self.compress_enabled && self.compressed {
            tree.compressed_root()
        } else {
            tree.root()
        }
    }

    fn apply_search(&mut self, tree: &TreeLayer, key: &str) {
        self.compressed = key.is_empty();
        self.searched = Some(if key.is_empty() {
            tree.tree().children(self.current_root(tree)).to_vec()
        } else {
            search::search(tree.tree(), tree.nodes(), key)
        });
    }
}

/// Layer 3: the expanded-folder set and the visible walk derived from it.
#[derive(Debug)]
struct ExpansionState {
    expanded: HashSet<NodeId>,
    nodes: Vec<NodeId>,
    depths: HashMap<NodeId, usize>,
}

impl ExpansionState {
    fn new() -> Self {
        Self {
            expanded: HashSet::new(),
            nodes: Vec::new(),
            depths: HashMap::new(),
        }
    }

    /// Only nodes with contents are expandable; expanding anything else
    /// falls through to removal, which makes it a no-op for leaves.
    /// Always regenerates, even when membership did not change.
    fn set_expand(&mut self, tree: &TreeLayer, view: &ViewState, node: NodeId, expand: bool) {
        if expand && tree.node(node).is_folder() {
            self.expanded.insert(node);
        } else {
            self.expanded.remove(&node);
        }
        self.generate_visible_nodes(tree, view);
    }

    fn toggle_expand(&mut self, tree: &TreeLayer, view: &ViewState, node: NodeId) {
        let expand = !self.expanded.contains(&node);
        self.set_expand(tree, view, node, expand);
    }

    /// Walk down from the current root, expanding every ancestor of `path`,
    /// and return the node whose path matches exactly, if present.
    fn expand_to(&mut self, tree: &TreeLayer, view: &ViewState, path: &str) -> Option<NodeId> {
        let root = view.current_root(tree);
        let found = self.descend_to(tree, view, root, path);
        if let Some(node) = found {
            self.set_expand(tree, view, node, true);
        }
        found
    }

    fn descend_to(
        &mut self,
        tree: &TreeLayer,
        view: &ViewState,
        id: NodeId,
        path: &str,
    ) -> Option<NodeId> {
        if !path.starts_with(tree.node(id).path.as_str()) {
            return None;
        }
        if tree.node(id).path == path {
            return Some(id);
        }
        self.set_expand(tree, view, id, true);
        for &child in tree.tree().children(id) {
            if let Some(found) = self.descend_to(tree, view, child, path) {
                return Some(found);
            }
        }
        None
    }

    /// Depth-first walk over the current search results with an explicit
    /// stack. A `None` entry marks the end of an expanded folder's children
    /// and pops one depth level, so no recursion is needed; collapsed
    /// branches are never descended into, which keeps the walk proportional
    /// to the visible subtree rather than the whole tree.
    fn generate_visible_nodes(&mut self, tree: &TreeLayer, view: &ViewState) {
        let Some(searched) = view.searched.as_ref() else {
            return;
        };
        let start = Instant::now();

        self.depths.clear();
        let mut emitted = HashSet::new();
        let mut nodes = Vec::new();
        let mut stack: Vec<Option<NodeId>> = searched.iter().rev().map(|&id| Some(id)).collect();
        let mut depth = 0usize;

        while let Some(entry) = stack.pop() {
            let Some(id) = entry else {
                depth -= 1;
                continue;
            };
            // search results may contain overlapping subtrees; emit each
            // node at most once per pass
            if !emitted.insert(id) {
                continue;
            }
            nodes.push(id);
            self.depths.insert(id, depth);
            if self.expanded.contains(&id) {
                stack.push(None);
                stack.extend(tree.tree().children(id).iter().rev().map(|&child| Some(child)));
                depth += 1;
            }
        }

        self.nodes = nodes;
        log::debug!(
            "visible nodes: regenerated {} items in {:?}",
            self.nodes.len(),
            start.elapsed()
        );
    }
}

/// Layer 4: nothing structural, just the pointer.
#[derive(Debug, Default)]
struct FocusState {
    focused: Option<NodeId>,
}

#[derive(Debug)]
struct MutState {
    view: ViewState,
    expansion: ExpansionState,
    focus: FocusState,
    debounce: Debouncer,
}

impl MutState {
    /// The shared tail of every applied search: view changed, so the walk
    /// regenerates and the focus composition is rebuilt empty.
    fn apply_search(&mut self, tree: &TreeLayer, key: &str) {
        self.view.apply_search(tree, key);
        self.expansion.generate_visible_nodes(tree, &self.view);
        self.focus.focused = None;
    }
}

/// What the rendering collaborator should draw right now. Re-read after
/// every mutating call; ids resolve through [`VisibleNodesGenerator::node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleNodes {
    /// Ordered list of nodes to render.
    pub nodes: Vec<NodeId>,
    /// Zero-based rendering depth, present only for nodes in `nodes`.
    pub depths: HashMap<NodeId, usize>,
    pub expanded_nodes: HashSet<NodeId>,
    pub focused_node: Option<NodeId>,
}

/// The facade over all four layers. One instance owns the view state for one
/// parsed tree; parse a new tree, build a new generator.
///
/// Single-threaded by construction: every mutator finishes its synchronous
/// recomputation before returning, and the only suspending operation is
/// [`search`](Self::search), whose pending calls are superseded by newer
/// ones. Interior mutability lets several search futures be pending on one
/// instance; borrows are never held across an await.
#[derive(Debug)]
pub struct VisibleNodesGenerator {
    tree: TreeLayer,
    state: RefCell<MutState>,
}

impl VisibleNodesGenerator {
    pub fn new(tree: Tree, options: Options) -> Self {
        Self {
            tree: TreeLayer::new(tree),
            state: RefCell::new(MutState {
                view: ViewState::new(options.compress),
                expansion: ExpansionState::new(),
                focus: FocusState::default(),
                debounce: Debouncer::new(),
            }),
        }
    }

    /// Establish the initial view: an empty-key search and the first walk,
    /// everything collapsed at depth 0.
    pub fn init(&self) {
        let mut state = self.state.borrow_mut();
        state.view.apply_search(&self.tree, "");
        let MutState {
            view, expansion, ..
        } = &mut *state;
        expansion.generate_visible_nodes(&self.tree, view);
    }

    /// Replace the search key and recompute the view.
    ///
    /// A non-empty key waits out the debounce window first; if a newer
    /// `search` call on this generator arrives during the wait, this call
    /// resolves `false` without touching any state (last write wins). An
    /// empty key applies immediately, superseding any pending wait. Applied
    /// searches clear the focused node, since searched node identities may
    /// be entirely new.
    pub async fn search(&self, key: &str) -> bool {
        let token = self.state.borrow_mut().debounce.arm();
        if !key.is_empty() && !debounce_wait(&token).await {
            log::debug!("search for {:?} superseded before its delay elapsed", key);
            return false;
        }
        self.state.borrow_mut().apply_search(&self.tree, key);
        true
    }

    /// Mark a folder expanded or collapsed. Expanding a non-expandable node
    /// is a silent no-op.
    pub fn set_expand(&self, node: NodeId, expand: bool) {
        let mut state = self.state.borrow_mut();
        let MutState {
            view, expansion, ..
        } = &mut *state;
        expansion.set_expand(&self.tree, view, node, expand);
    }

    pub fn toggle_expand(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        let MutState {
            view, expansion, ..
        } = &mut *state;
        expansion.toggle_expand(&self.tree, view, node);
    }

    /// Reveal the node at `path`, expanding every ancestor on the way down
    /// from the current root. Returns `None` when no node has that exact
    /// path under the current root.
    pub fn expand_to(&self, path: &str) -> Option<NodeId> {
        let mut state = self.state.borrow_mut();
        let MutState {
            view, expansion, ..
        } = &mut *state;
        expansion.expand_to(&self.tree, view, path)
    }

    /// Unconditionally replace the focused node. Never triggers any
    /// recomputation; callers pass ids obtained from this same generator.
    pub fn focus_node(&self, node: Option<NodeId>) {
        self.state.borrow_mut().focus.focused = node;
    }

    /// Snapshot of what should be rendered right now.
    pub fn visible_nodes(&self) -> VisibleNodes {
        let state = self.state.borrow();
        VisibleNodes {
            nodes: state.expansion.nodes.clone(),
            depths: state.expansion.depths.clone(),
            expanded_nodes: state.expansion.expanded.clone(),
            focused_node: state.focus.focused,
        }
    }

    /// Resolve a node id from a snapshot to its data.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        self.tree.node(id)
    }

    pub fn tree(&self) -> &Tree {
        self.tree.tree()
    }
}
