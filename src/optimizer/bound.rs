//! Fractional-relaxation bound.
//!
//! Relaxing "take the whole item or nothing" to "take any fraction" gives a
//! problem the greedy ratio scan solves exactly, and its optimum is never
//! below the 0/1 optimum. That makes it a safe pruning bound.

use super::search::SearchNode;
use super::Investment;

/// Optimistic profit reachable from `node`, scanning undecided items in
/// their (ratio-sorted) order.
///
/// Infeasible nodes score 0. The scan stops at the first item with no
/// positive gain: in ratio order nothing after it can raise the total.
/// A zero-price item never reaches the fractional step in sorted input, but
/// if it does it adds nothing.
pub fn bound<T: Investment>(node: &SearchNode, items: &[T], budget: f64) -> f64 {
    if node.weight > budget {
        return 0.0;
    }

    let mut profit = node.profit;
    let mut weight = node.weight;
    let mut j = node.next_level();

    while j < items.len()
        && items[j].profit_gain() > 0.0
        && weight + items[j].price() <= budget
    {
        weight += items[j].price();
        profit += items[j].profit_gain();
        j += 1;
    }

    if let Some(item) = items.get(j) {
        let price = item.price();
        if price != 0.0 && item.profit_gain() > 0.0 {
            profit += (budget - weight) / price * item.profit_gain();
        }
    }

    profit
}
