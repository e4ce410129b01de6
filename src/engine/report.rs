//! Cycle report: what one scan → plan → buy pass did.

use chrono::{DateTime, Utc};
use tracing::info;

use super::executor::ExecutionReport;
use crate::planner::{PlanDecision, Rejection};

/// Summary of a complete cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub upgrades_listed: usize,
    pub upgrades_purchasable: usize,
    pub opportunities: usize,
    /// Candidates whose best bundle did not qualify.
    pub rejected: usize,
    /// Candidates the optimizer refused as invalid input.
    pub invalid: usize,
    /// Candidate id of the plan that was executed, if any.
    pub chosen: Option<String>,
    pub purchased: usize,
    pub failed: usize,
    pub total_spent: f64,
    /// Profit-per-hour added by this cycle's purchases.
    pub profit_gained: f64,
    pub stopped_early: bool,
    pub timestamp: DateTime<Utc>,
}

impl CycleReport {
    /// A cycle that scanned and planned but bought nothing yet.
    pub fn planned(
        cycle_number: u64,
        upgrades_listed: usize,
        upgrades_purchasable: usize,
        decisions: &[PlanDecision],
    ) -> Self {
        let mut opportunities = 0;
        let mut rejected = 0;
        let mut invalid = 0;
        for decision in decisions {
            match decision {
                PlanDecision::Listed { .. } => opportunities += 1,
                PlanDecision::Rejected {
                    reason: Rejection::Invalid(_),
                    ..
                } => invalid += 1,
                PlanDecision::Rejected { .. } => rejected += 1,
            }
        }

        Self {
            cycle_number,
            upgrades_listed,
            upgrades_purchasable,
            opportunities,
            rejected,
            invalid,
            chosen: None,
            purchased: 0,
            failed: 0,
            total_spent: 0.0,
            profit_gained: 0.0,
            stopped_early: false,
            timestamp: Utc::now(),
        }
    }

    /// Fold an execution into the report.
    pub fn record_execution(&mut self, chosen: &str, execution: &ExecutionReport) {
        self.chosen = Some(chosen.to_string());
        self.purchased = execution.purchased.len();
        self.failed = execution.failed.len();
        self.total_spent = execution.total_spent;
        self.profit_gained = execution.profit_gained();
        self.stopped_early = !execution.is_complete();
        self.timestamp = Utc::now();
    }

    /// Log a human-readable cycle summary.
    pub fn log(&self) {
        info!(
            cycle = self.cycle_number,
            listed = self.upgrades_listed,
            purchasable = self.upgrades_purchasable,
            opportunities = self.opportunities,
            rejected = self.rejected,
            invalid = self.invalid,
            chosen = ?self.chosen,
            purchased = self.purchased,
            failed = self.failed,
            spent = format!("{:.0}", self.total_spent),
            profit_gained = format!("+{:.0}/h", self.profit_gained),
            stopped_early = self.stopped_early,
            "Cycle complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::executor::{FailedPurchase, Purchase, StopReason};
    use crate::types::Upgrade;

    use crate::optimizer::OptimizerError;

    fn decisions() -> Vec<PlanDecision> {
        vec![
            PlanDecision::Listed {
                candidate_id: "whale".into(),
                max_profit: 410.0,
            },
            PlanDecision::Rejected {
                candidate_id: "a".into(),
                reason: Rejection::NotBetter { max_profit: 200.0 },
            },
            PlanDecision::Rejected {
                candidate_id: "dud".into(),
                reason: Rejection::NoGain,
            },
            PlanDecision::Rejected {
                candidate_id: "bad".into(),
                reason: Rejection::Invalid(OptimizerError::InvalidBudget(-1.0)),
            },
        ]
    }

    #[test]
    fn test_planned_report_counts_decisions() {
        let r = CycleReport::planned(3, 40, 25, &decisions());
        assert_eq!(r.cycle_number, 3);
        assert_eq!(r.opportunities, 1);
        assert_eq!(r.rejected, 2);
        assert_eq!(r.invalid, 1);
        assert!(r.chosen.is_none());
        assert_eq!(r.purchased, 0);
    }

    #[test]
    fn test_planned_report_without_candidates() {
        let r = CycleReport::planned(1, 0, 0, &[]);
        assert_eq!(r.opportunities, 0);
        assert_eq!(r.rejected, 0);
        assert_eq!(r.invalid, 0);
    }

    #[test]
    fn test_record_execution() {
        let execution = ExecutionReport {
            starting_balance: 1_000.0,
            purchased: vec![Purchase {
                purchase_id: "p1".into(),
                upgrade: Upgrade::sample("a", 300.0, 45.0),
                attempts: 1,
                dry_run: false,
            }],
            failed: vec![FailedPurchase {
                upgrade_id: "b".into(),
                reason: "rejected".into(),
            }],
            total_spent: 300.0,
            stop_reason: Some(StopReason::BelowThreshold {
                upgrade_id: "c".into(),
                balance: 700.0,
                price: 500.0,
                threshold: 500.0,
            }),
        };

        let mut r = CycleReport::planned(1, 10, 8, &decisions());
        r.record_execution("whale", &execution);
        assert_eq!(r.chosen.as_deref(), Some("whale"));
        assert_eq!(r.purchased, 1);
        assert_eq!(r.failed, 1);
        assert_eq!(r.total_spent, 300.0);
        assert_eq!(r.profit_gained, 45.0);
        assert!(r.stopped_early);
    }
}
