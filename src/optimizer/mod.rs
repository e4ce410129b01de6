//! Investment optimizer: exact 0/1 knapsack over profit-per-hour upgrades.
//!
//! Given items with a price and a profit-per-hour gain, and a spending
//! budget, finds the subset (each item at most once) maximising total gain
//! without exceeding the budget. Pure computation: no I/O, no shared state.
//!
//! - `ordering` - ratio computation and the stable pre-sort the search relies on
//! - `bound` - fractional-relaxation upper bound for a partial selection
//! - `search` - best-bound-first branch-and-bound

pub mod bound;
pub mod ordering;
pub mod search;

use thiserror::Error;
use tracing::debug;

pub use search::{search, search_with, SearchConfig, SearchStats, Selection};

// ---------------------------------------------------------------------------
// Investment trait
// ---------------------------------------------------------------------------

/// Anything that can be bought once for `price` and yields `profit_gain`.
///
/// Only these two values take part in optimisation; implementors carry
/// whatever else they need through unchanged.
pub trait Investment {
    fn price(&self) -> f64;
    fn profit_gain(&self) -> f64;

    /// Profit gained per unit of budget. Free gains rank first.
    fn ratio(&self) -> f64 {
        ordering::ratio(self.price(), self.profit_gain())
    }
}

impl<T: Investment + ?Sized> Investment for &T {
    fn price(&self) -> f64 {
        (**self).price()
    }

    fn profit_gain(&self) -> f64 {
        (**self).profit_gain()
    }
}

/// `(price, profit_gain)` pairs, handy for tests and ad-hoc use.
impl Investment for (f64, f64) {
    fn price(&self) -> f64 {
        self.0
    }

    fn profit_gain(&self) -> f64 {
        self.1
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Inputs the optimizer refuses to search over.
///
/// An empty catalog is not an error (it yields zero profit), and a
/// zero-price item reaching the fractional bound step contributes nothing
/// rather than failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    #[error("invalid budget {0}: must be finite and non-negative")]
    InvalidBudget(f64),

    #[error("invalid item at position {position}: price {price}, profit gain {profit_gain}")]
    InvalidItem {
        position: usize,
        price: f64,
        profit_gain: f64,
    },

    #[error("items must be sorted by descending profit-to-price ratio")]
    UnsortedItems,
}

pub(crate) fn validate<T: Investment>(items: &[T], budget: f64) -> Result<(), OptimizerError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(OptimizerError::InvalidBudget(budget));
    }
    for (position, item) in items.iter().enumerate() {
        let (price, profit_gain) = (item.price(), item.profit_gain());
        if !price.is_finite() || price < 0.0 || !profit_gain.is_finite() {
            return Err(OptimizerError::InvalidItem {
                position,
                price,
                profit_gain,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Convenience front-end: sorts a view of unsorted items, searches, and maps
/// the chosen positions back onto the caller's slice.
///
/// Callers that run many searches over the same catalog (one per candidate
/// budget) should sort once with [`ordering::sort_by_ratio`] and call
/// [`search_with`] directly instead.
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: SearchConfig,
}

impl Optimizer {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Best subset of `items` affordable with `budget`.
    ///
    /// Returned positions index into `items` and are increasing.
    pub fn optimize<'a, T: Investment>(
        &self,
        items: &'a [T],
        budget: f64,
    ) -> Result<Selection<'a, T>, OptimizerError> {
        validate(items, budget)?;

        let order = ordering::ratio_order(items);
        let sorted: Vec<&'a T> = order.iter().map(|&i| &items[i]).collect();
        let found = search_with(&sorted, budget, &self.config)?;

        let mut positions: Vec<usize> = found.positions.iter().map(|&p| order[p]).collect();
        positions.sort_unstable();

        debug!(
            items = items.len(),
            budget,
            max_profit = found.max_profit,
            selected = found.len(),
            "Optimisation complete"
        );

        Ok(Selection {
            max_profit: found.max_profit,
            total_price: found.total_price,
            items: positions.iter().map(|&p| &items[p]).collect(),
            positions,
            stats: found.stats,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
