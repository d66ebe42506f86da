//! Layered visible-node generation for searchable, collapsible repository
//! file trees.
//!
//! Given a parsed tree and a mutable view state (search key, expanded
//! folders, focused node), [`VisibleNodesGenerator`] produces the exact
//! ordered, depth-annotated list of nodes a renderer should draw, redoing
//! work proportional to what changed rather than to tree size. Fetching raw
//! tree data and drawing the result are the caller's business; this crate
//! owns everything in between, including parsing the hosting API's flat
//! entry list ([`parse`]).
//!
//! ```no_run
//! use tree_explorer::{parse_json, Options, VisibleNodesGenerator};
//!
//! # async fn demo(payload: &str) -> tree_explorer::Result<()> {
//! let parsed = parse_json(payload)?;
//! let generator = VisibleNodesGenerator::new(parsed.tree, Options { compress: true });
//! generator.init();
//!
//! generator.search("readme").await;
//! for id in generator.visible_nodes().nodes {
//!     let node = generator.node(id);
//!     println!("{} ({})", node.name, node.path);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod parse;
pub mod search;
pub mod tree;

pub use error::{Result, TreeExplorerError};
pub use generator::{Options, VisibleNodes, VisibleNodesGenerator};
pub use parse::{parse, parse_json, EntryKind, ParsedTree, TreeEntry};
pub use search::SEARCH_DELAY;
pub use tree::{NodeId, NodeKind, Tree, TreeNode};
