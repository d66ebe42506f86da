//! Name matching for the view layer and the debounce primitive that
//! coalesces bursts of search calls into one filter pass.

use crate::tree::{NodeId, Tree};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long a non-empty search waits for the typing to pause.
pub const SEARCH_DELAY: Duration = Duration::from_millis(250);

/// Two case-insensitive passes over the flat node list:
///
/// 1. the key as a literal substring of the node name;
/// 2. the key with all `/` removed, remaining characters as an ordered,
///    not necessarily contiguous subsequence (`"ab"` matches any name with
///    an `a` somewhere before a `b`).
///
/// Results are concatenated pass-by-pass and deduplicated keeping the first
/// occurrence, so literal matches always rank ahead of subsequence-only
/// matches and a name matching both appears once, at its earliest rank.
pub fn search(tree: &Tree, nodes: &[NodeId], key: &str) -> Vec<NodeId> {
    if key.is_empty() {
        return nodes.to_vec();
    }

    let patterns = [literal_pattern(key), subsequence_pattern(key)];
    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    for pattern in &patterns {
        for &id in nodes {
            if pattern.is_match(&tree.node(id).name) && seen.insert(id) {
                matched.push(id);
            }
        }
    }
    matched
}

fn literal_pattern(key: &str) -> Regex {
    compile(&regex::escape(key))
}

fn subsequence_pattern(key: &str) -> Regex {
    let chars: Vec<String> = key
        .chars()
        .filter(|&c| c != '/')
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    // an all-slash key degenerates to the empty pattern, matching every name
    compile(&chars.join(".*?"))
}

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("escaped search pattern is always a valid regex")
}

/// The cancellable delayed task behind search coalescing. Each search arms a
/// fresh token; arming cancels whichever wait was pending, so only the most
/// recently issued call ever survives its delay.
#[derive(Debug)]
pub struct Debouncer {
    current: CancellationToken,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debouncer {
    pub fn new() -> Self {
        Self {
            current: CancellationToken::new(),
        }
    }

    /// Supersede the pending wait, if any, and hand out the next one's token.
    pub fn arm(&mut self) -> CancellationToken {
        let fresh = CancellationToken::new();
        std::mem::replace(&mut self.current, fresh.clone()).cancel();
        fresh
    }
}

/// Sleep out the debounce window. Returns `false` when a newer search armed
/// the debouncer first; `biased` keeps the outcome deterministic when the
/// cancellation and the timer are both ready.
pub async fn debounce_wait(token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(SEARCH_DELAY) => true,
    }
}
