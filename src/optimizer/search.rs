//! Best-bound-first branch-and-bound.
//!
//! Nodes are partial include/exclude assignments over the ratio-sorted
//! items. The frontier always expands the node with the highest bound;
//! equal bounds are expanded in insertion order so a search is fully
//! deterministic for a given input. A subtree is dropped once its bound can
//! no longer beat the best feasible profit seen, which keeps the search
//! exact while skipping most of the tree.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, trace, warn};

use super::bound::bound;
use super::ordering::is_ratio_sorted;
use super::{validate, Investment, OptimizerError};

// ---------------------------------------------------------------------------
// Search node
// ---------------------------------------------------------------------------

/// A partial selection: decisions made for items `0..=level`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchNode {
    /// Last decided item. `None` at the root.
    pub level: Option<usize>,
    /// Sum of `profit_gain` over `selected`.
    pub profit: f64,
    /// Sum of `price` over `selected`.
    pub weight: f64,
    pub bound: f64,
    /// Included item positions, increasing.
    pub selected: Vec<usize>,
}

impl SearchNode {
    pub fn root() -> Self {
        Self {
            level: None,
            profit: 0.0,
            weight: 0.0,
            bound: 0.0,
            selected: Vec::new(),
        }
    }

    /// First undecided item.
    pub fn next_level(&self) -> usize {
        self.level.map_or(0, |l| l + 1)
    }

    fn include<T: Investment>(&self, level: usize, item: &T) -> Self {
        let mut selected = Vec::with_capacity(self.selected.len() + 1);
        selected.extend_from_slice(&self.selected);
        selected.push(level);
        Self {
            level: Some(level),
            profit: self.profit + item.profit_gain(),
            weight: self.weight + item.price(),
            bound: 0.0,
            selected,
        }
    }

    fn exclude(&self, level: usize) -> Self {
        Self {
            level: Some(level),
            bound: 0.0,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Frontier
// ---------------------------------------------------------------------------

/// Heap entry. `BinaryHeap` is a max-heap: highest bound first, then the
/// lowest sequence number (earliest pushed).
#[derive(Debug)]
struct FrontierEntry {
    seq: u64,
    node: SearchNode,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.node
            .bound
            .total_cmp(&other.node.bound)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_seq: u64,
    high_water: usize,
}

impl Frontier {
    fn push(&mut self, node: SearchNode) {
        self.heap.push(FrontierEntry {
            seq: self.next_seq,
            node,
        });
        self.next_seq += 1;
        self.high_water = self.high_water.max(self.heap.len());
    }

    fn pop(&mut self) -> Option<SearchNode> {
        self.heap.pop().map(|e| e.node)
    }
}

// ---------------------------------------------------------------------------
// Config / results
// ---------------------------------------------------------------------------

/// Search limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchConfig {
    /// Stop after expanding this many nodes and return the best selection
    /// found so far. `None` searches to exhaustion (exact result).
    pub max_expansions: Option<u64>,
}

/// Work counters for one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_expanded: u64,
    pub nodes_pushed: u64,
    /// Children never queued plus queued nodes dropped on pop.
    pub nodes_pruned: u64,
    pub peak_queue_len: usize,
    /// The expansion cap stopped the search; the result may not be optimal.
    pub truncated: bool,
}

/// Best selection found by a search.
#[derive(Debug, Clone)]
pub struct Selection<'a, T> {
    pub max_profit: f64,
    pub total_price: f64,
    /// Positions of the chosen items, increasing.
    pub positions: Vec<usize>,
    pub items: Vec<&'a T>,
    pub stats: SearchStats,
}

impl<T> Selection<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

/// Incumbent threaded through the search loop.
#[derive(Debug, Default)]
struct Best {
    profit: f64,
    weight: f64,
    selected: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Exact search with no expansion cap. See [`search_with`].
pub fn search<T: Investment>(items: &[T], budget: f64) -> Result<Selection<'_, T>, OptimizerError> {
    search_with(items, budget, &SearchConfig::default())
}

/// Maximise total `profit_gain` over subsets of `items` whose total `price`
/// does not exceed `budget`.
///
/// `items` must already be sorted best ratio first (see
/// [`super::ordering::sort_by_ratio`]).
pub fn search_with<'a, T: Investment>(
    items: &'a [T],
    budget: f64,
    config: &SearchConfig,
) -> Result<Selection<'a, T>, OptimizerError> {
    validate(items, budget)?;
    if !is_ratio_sorted(items) {
        return Err(OptimizerError::UnsortedItems);
    }

    let n = items.len();
    let mut stats = SearchStats::default();
    let mut best = Best::default();
    let mut frontier = Frontier::default();

    let mut root = SearchNode::root();
    root.bound = bound(&root, items, budget);
    frontier.push(root);
    stats.nodes_pushed += 1;

    while let Some(node) = frontier.pop() {
        let next = node.next_level();
        if next >= n {
            continue;
        }
        if node.level.is_some() && node.bound <= best.profit {
            stats.nodes_pruned += 1;
            continue;
        }
        if let Some(cap) = config.max_expansions {
            if stats.nodes_expanded >= cap {
                warn!(
                    cap,
                    budget,
                    best_profit = best.profit,
                    queued = frontier.heap.len() + 1,
                    "Expansion cap reached, returning best selection so far"
                );
                stats.truncated = true;
                break;
            }
        }
        stats.nodes_expanded += 1;

        let item = &items[next];

        let mut with = node.include(next, item);
        with.bound = bound(&with, items, budget);
        if with.weight <= budget && with.profit > best.profit {
            trace!(
                profit = with.profit,
                weight = with.weight,
                level = next,
                "New incumbent"
            );
            best = Best {
                profit: with.profit,
                weight: with.weight,
                selected: with.selected.clone(),
            };
        }
        if with.bound > best.profit {
            frontier.push(with);
            stats.nodes_pushed += 1;
        } else {
            stats.nodes_pruned += 1;
        }

        let mut without = node.exclude(next);
        without.bound = bound(&without, items, budget);
        if without.bound > best.profit {
            frontier.push(without);
            stats.nodes_pushed += 1;
        } else {
            stats.nodes_pruned += 1;
        }
    }

    stats.peak_queue_len = frontier.high_water;

    debug!(
        items = n,
        budget,
        max_profit = best.profit,
        selected = best.selected.len(),
        expanded = stats.nodes_expanded,
        pruned = stats.nodes_pruned,
        peak_queue = stats.peak_queue_len,
        "Search finished"
    );

    Ok(Selection {
        max_profit: best.profit,
        total_price: best.weight,
        items: best.selected.iter().map(|&p| &items[p]).collect(),
        positions: best.selected,
        stats,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
