//! Ratio ordering.
//!
//! The bound estimator scans remaining items greedily, which is only an
//! upper bound when those items are visited in descending profit-to-price
//! order. All sorts here are stable so equal ratios keep their input order,
//! making every search over the same catalog deterministic.

use std::cmp::Ordering;

use super::Investment;

/// Profit per unit of price. Free items take the sign of their gain as an
/// infinite ratio, so free gains sort first and free losses last.
pub fn ratio(price: f64, profit_gain: f64) -> f64 {
    if price > 0.0 {
        profit_gain / price
    } else if profit_gain > 0.0 {
        f64::INFINITY
    } else if profit_gain < 0.0 {
        f64::NEG_INFINITY
    } else {
        0.0
    }
}

fn descending<T: Investment>(a: &T, b: &T) -> Ordering {
    b.ratio().total_cmp(&a.ratio())
}

/// Sort items in place, best ratio first.
pub fn sort_by_ratio<T: Investment>(items: &mut [T]) {
    items.sort_by(descending);
}

/// Positions of `items` in best-ratio-first order, leaving `items` untouched.
pub fn ratio_order<T: Investment>(items: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| descending(&items[a], &items[b]));
    order
}

/// Whether `items` already satisfies the search precondition.
pub fn is_ratio_sorted<T: Investment>(items: &[T]) -> bool {
    items
        .windows(2)
        .all(|w| descending(&w[0], &w[1]) != Ordering::Greater)
}
