//! Opportunity planner: bundle search per candidate budget and ranking.
//!
//! For every purchasable upgrade, its price is used as a budget and the
//! optimizer finds the best bundle of upgrades that budget buys. A bundle
//! is worth listing when it earns more per hour than the candidate alone
//! and clears the configured minimum.

use std::fmt;

use tracing::{debug, info, warn};

use crate::optimizer::{ordering, search_with, OptimizerError, SearchConfig};
use crate::types::Upgrade;

// ---------------------------------------------------------------------------
// Opportunity
// ---------------------------------------------------------------------------

/// A bundle that beats buying the candidate upgrade on its own.
#[derive(Debug, Clone)]
pub struct Opportunity {
    /// Upgrade whose price set the budget.
    pub candidate: Upgrade,
    pub budget: f64,
    /// Profit-per-hour gain of buying just the candidate.
    pub original_profit: f64,
    /// Profit-per-hour gain of the bundle.
    pub max_profit: f64,
    /// Bundle gain per unit budget, as a percentage.
    pub ratio: f64,
    /// Upgrades to buy, in ratio order.
    pub bundle: Vec<Upgrade>,
}

impl Opportunity {
    pub fn bundle_cost(&self) -> f64 {
        self.bundle.iter().map(|u| u.price).sum()
    }
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ratio: {:.2}% - Max Profit: {:.0} - Budget: {:.0} ({} upgrades)",
            self.ratio,
            self.max_profit,
            self.budget,
            self.bundle.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Decision log
// ---------------------------------------------------------------------------

/// Why a candidate budget produced no listed opportunity.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The candidate itself adds no profit per hour.
    NoGain,
    /// Buying the candidate alone is at least as good as the best bundle.
    NotBetter { max_profit: f64 },
    /// The bundle earns no more than the configured minimum.
    BelowMinimum { max_profit: f64 },
    /// The optimizer refused the input.
    Invalid(OptimizerError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoGain => write!(f, "candidate has no profit gain"),
            Rejection::NotBetter { max_profit } => {
                write!(f, "best bundle ({max_profit:.0}/h) does not beat the candidate")
            }
            Rejection::BelowMinimum { max_profit } => {
                write!(f, "bundle profit {max_profit:.0}/h below minimum")
            }
            Rejection::Invalid(e) => write!(f, "optimizer error: {e}"),
        }
    }
}

/// Record of every candidate considered during a planning pass.
#[derive(Debug, Clone)]
pub enum PlanDecision {
    Listed { candidate_id: String, max_profit: f64 },
    Rejected { candidate_id: String, reason: Rejection },
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Bundles must earn strictly more than this per hour.
    pub min_bundle_profit: f64,
    pub search: SearchConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_bundle_profit: 10_000.0,
            search: SearchConfig::default(),
        }
    }
}

pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Rank every candidate budget in `upgrades`.
    ///
    /// `upgrades` should already be filtered to purchasable ones. Returns the
    /// listed opportunities, best ratio first, and the full decision log.
    pub fn rank(&self, upgrades: &[Upgrade]) -> (Vec<Opportunity>, Vec<PlanDecision>) {
        let mut sorted = upgrades.to_vec();
        ordering::sort_by_ratio(&mut sorted);

        let mut listed: Vec<Opportunity> = Vec::new();
        let mut decisions: Vec<PlanDecision> = Vec::new();

        for candidate in upgrades {
            match self.evaluate(&sorted, candidate) {
                Ok(opportunity) => {
                    debug!(
                        candidate = %candidate.id,
                        budget = candidate.price,
                        max_profit = opportunity.max_profit,
                        original = candidate.profit_per_hour_delta,
                        bundle = opportunity.bundle.len(),
                        "Opportunity listed"
                    );
                    decisions.push(PlanDecision::Listed {
                        candidate_id: candidate.id.clone(),
                        max_profit: opportunity.max_profit,
                    });
                    listed.push(opportunity);
                }
                Err(reason) => {
                    match &reason {
                        Rejection::Invalid(e) => {
                            warn!(candidate = %candidate.id, error = %e, "Candidate skipped")
                        }
                        _ => debug!(candidate = %candidate.id, reason = %reason, "Candidate rejected"),
                    }
                    decisions.push(PlanDecision::Rejected {
                        candidate_id: candidate.id.clone(),
                        reason,
                    });
                }
            }
        }

        listed.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));

        info!(
            candidates = upgrades.len(),
            listed = listed.len(),
            "Planning complete"
        );

        (listed, decisions)
    }

    /// Search the best bundle affordable with `candidate`'s price.
    ///
    /// `sorted` must be the catalog in ratio order.
    pub fn evaluate(&self, sorted: &[Upgrade], candidate: &Upgrade) -> Result<Opportunity, Rejection> {
        let budget = candidate.price;
        let original_profit = candidate.profit_per_hour_delta;

        if original_profit == 0.0 {
            return Err(Rejection::NoGain);
        }

        let selection =
            search_with(sorted, budget, &self.config.search).map_err(Rejection::Invalid)?;
        let max_profit = selection.max_profit;
        if max_profit <= original_profit {
            return Err(Rejection::NotBetter { max_profit });
        }
        if max_profit <= self.config.min_bundle_profit {
            return Err(Rejection::BelowMinimum { max_profit });
        }

        Ok(Opportunity {
            candidate: candidate.clone(),
            budget,
            original_profit,
            max_profit,
            ratio: max_profit / budget * 100.0,
            bundle: selection.items.into_iter().cloned().collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn planner(min: f64) -> Planner {
        Planner::new(PlannerConfig {
            min_bundle_profit: min,
            ..PlannerConfig::default()
        })
    }

    fn catalog() -> Vec<Upgrade> {
        vec![
            // Expensive card with poor gain: its budget buys much better bundles.
            Upgrade::sample("whale", 1000.0, 50.0),
            Upgrade::sample("a", 400.0, 200.0),
            Upgrade::sample("b", 300.0, 120.0),
            Upgrade::sample("c", 300.0, 90.0),
            Upgrade::sample("d", 100.0, 60.0),
        ]
    }

    #[test]
    fn test_bundle_beats_candidate() {
        let cat = catalog();
        let mut sorted = cat.clone();
        ordering::sort_by_ratio(&mut sorted);

        let opp = planner(0.0).evaluate(&sorted, &cat[0]).unwrap();
        // Greedy d + a + b spends 800 for 380; a + b + c spends all 1000 for 410.
        assert_eq!(opp.max_profit, 410.0);
        assert_eq!(opp.budget, 1000.0);
        assert_eq!(opp.original_profit, 50.0);
        assert!((opp.ratio - 41.0).abs() < 1e-9);
        let ids: Vec<_> = opp.bundle.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(opp.bundle_cost(), 1000.0);
    }

    #[test]
    fn test_candidate_alone_is_best() {
        let cat = catalog();
        let mut sorted = cat.clone();
        ordering::sort_by_ratio(&mut sorted);

        // Budget 100 only buys "d" itself.
        let err = planner(0.0).evaluate(&sorted, &cat[4]).unwrap_err();
        assert_eq!(err, Rejection::NotBetter { max_profit: 60.0 });
    }

    #[test]
    fn test_minimum_bundle_profit() {
        let cat = catalog();
        let mut sorted = cat.clone();
        ordering::sort_by_ratio(&mut sorted);

        let err = planner(10_000.0).evaluate(&sorted, &cat[0]).unwrap_err();
        assert_eq!(err, Rejection::BelowMinimum { max_profit: 410.0 });
    }

    #[test]
    fn test_zero_gain_candidate_rejected() {
        let cat = vec![Upgrade::sample("dud", 500.0, 0.0), Upgrade::sample("x", 100.0, 40.0)];
        let mut sorted = cat.clone();
        ordering::sort_by_ratio(&mut sorted);
        assert_eq!(
            planner(0.0).evaluate(&sorted, &cat[0]).unwrap_err(),
            Rejection::NoGain
        );
    }

    #[test]
    fn test_rank_orders_by_ratio_and_logs_all() {
        let (listed, decisions) = planner(0.0).rank(&catalog());
        assert_eq!(decisions.len(), 5);
        assert!(!listed.is_empty());
        assert!(listed.windows(2).all(|w| w[0].ratio >= w[1].ratio));
        assert_eq!(listed[0].candidate.id, "whale");
        for opp in &listed {
            assert!(opp.bundle_cost() <= opp.budget);
            assert!(opp.max_profit > opp.original_profit);
        }
    }

    #[test]
    fn test_rank_empty_catalog() {
        let (listed, decisions) = planner(0.0).rank(&[]);
        assert!(listed.is_empty());
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_display() {
        let cat = catalog();
        let mut sorted = cat.clone();
        ordering::sort_by_ratio(&mut sorted);
        let opp = planner(0.0).evaluate(&sorted, &cat[0]).unwrap();
        assert_eq!(
            opp.to_string(),
            "Ratio: 41.00% - Max Profit: 410 - Budget: 1000 (3 upgrades)"
        );
    }
}
