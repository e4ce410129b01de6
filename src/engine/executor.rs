//! Purchase executor.
//!
//! Buys the upgrades of a chosen plan one by one, never letting the balance
//! drop to the user's minimum threshold. A purchase the server rejects
//! (typically a cooldown) is retried once after the upgrade's cooldown; a
//! successful purchase is followed by a short pause before the next one.

use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::GameApi;
use crate::types::{PurchaseStatus, Upgrade};

// ---------------------------------------------------------------------------
// Execution result
// ---------------------------------------------------------------------------

/// Result of executing a plan.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub starting_balance: f64,
    pub purchased: Vec<Purchase>,
    pub failed: Vec<FailedPurchase>,
    pub total_spent: f64,
    /// Set when execution ended before the plan was exhausted.
    pub stop_reason: Option<StopReason>,
}

impl ExecutionReport {
    /// Every upgrade in the plan was attempted.
    pub fn is_complete(&self) -> bool {
        self.stop_reason.is_none()
    }

    /// Profit-per-hour gained by the purchases made.
    pub fn profit_gained(&self) -> f64 {
        self.purchased.iter().map(|p| p.upgrade.profit_per_hour_delta).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Purchase {
    /// Local id for correlating log lines.
    pub purchase_id: String,
    pub upgrade: Upgrade,
    /// 1, or 2 when the first attempt was rejected. 0 in dry-run mode.
    pub attempts: u32,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct FailedPurchase {
    pub upgrade_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The next purchase would leave the balance at or below the threshold.
    BelowThreshold {
        upgrade_id: String,
        balance: f64,
        price: f64,
        threshold: f64,
    },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::BelowThreshold {
                upgrade_id,
                balance,
                price,
                threshold,
            } => write!(
                f,
                "balance {balance:.0} minus price of {upgrade_id} ({price:.0}) is below the threshold ({threshold:.0})"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct Executor {
    api: Arc<dyn GameApi>,
    dry_run: bool,
    purchase_delay: Duration,
}

impl Executor {
    pub fn new(api: Arc<dyn GameApi>, dry_run: bool, purchase_delay: Duration) -> Self {
        Self {
            api,
            dry_run,
            purchase_delay,
        }
    }

    /// Sync the balance, then buy `plan` in order while the balance stays
    /// above `min_balance_threshold`.
    ///
    /// In dry-run mode, logs but doesn't place real purchases.
    pub async fn execute_plan(
        &self,
        plan: &[Upgrade],
        min_balance_threshold: f64,
    ) -> Result<ExecutionReport> {
        let starting_balance = self
            .api
            .sync_balance()
            .await
            .context("Failed to sync balance before purchasing")?;

        let mut report = ExecutionReport {
            starting_balance,
            ..Default::default()
        };

        if plan.is_empty() {
            return Ok(report);
        }

        info!(
            count = plan.len(),
            balance = format!("{starting_balance:.0}"),
            expendable = format!("{:.0}", starting_balance - min_balance_threshold),
            dry_run = self.dry_run,
            "Executing plan"
        );

        let mut balance = starting_balance;

        for upgrade in plan {
            if balance - upgrade.price <= min_balance_threshold {
                let reason = StopReason::BelowThreshold {
                    upgrade_id: upgrade.id.clone(),
                    balance,
                    price: upgrade.price,
                    threshold: min_balance_threshold,
                };
                warn!(reason = %reason, "Stopping purchases");
                report.stop_reason = Some(reason);
                break;
            }

            let purchase_id = Uuid::new_v4().to_string();

            if self.dry_run {
                info!(
                    purchase_id = %purchase_id,
                    upgrade = %upgrade,
                    "[DRY RUN] Would buy upgrade"
                );
                balance -= upgrade.price;
                report.total_spent += upgrade.price;
                report.purchased.push(Purchase {
                    purchase_id,
                    upgrade: upgrade.clone(),
                    attempts: 0,
                    dry_run: true,
                });
                continue;
            }

            info!(purchase_id = %purchase_id, upgrade = %upgrade, "Attempting purchase");

            match self.buy_with_retry(upgrade).await {
                Ok(attempts) => {
                    info!(
                        purchase_id = %purchase_id,
                        upgrade_id = %upgrade.id,
                        attempts,
                        "Upgrade purchased"
                    );
                    balance -= upgrade.price;
                    report.total_spent += upgrade.price;
                    report.purchased.push(Purchase {
                        purchase_id,
                        upgrade: upgrade.clone(),
                        attempts,
                        dry_run: false,
                    });

                    if !self.purchase_delay.is_zero() {
                        debug!(
                            secs = self.purchase_delay.as_secs(),
                            "Waiting before next purchase"
                        );
                        tokio::time::sleep(self.purchase_delay).await;
                    }
                }
                Err(e) => {
                    warn!(
                        purchase_id = %purchase_id,
                        upgrade_id = %upgrade.id,
                        error = %e,
                        "Purchase failed"
                    );
                    report.failed.push(FailedPurchase {
                        upgrade_id: upgrade.id.clone(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        info!(
            purchased = report.purchased.len(),
            failed = report.failed.len(),
            spent = format!("{:.0}", report.total_spent),
            complete = report.is_complete(),
            "Plan execution complete"
        );

        Ok(report)
    }

    /// Buy once; if the server rejects it, wait out the cooldown and try one
    /// more time. Returns the number of attempts used.
    async fn buy_with_retry(&self, upgrade: &Upgrade) -> Result<u32> {
        match self.api.buy_upgrade(&upgrade.id).await? {
            PurchaseStatus::Accepted => return Ok(1),
            PurchaseStatus::Rejected { code, .. } => {
                info!(
                    upgrade_id = %upgrade.id,
                    code = %code,
                    cooldown_secs = upgrade.cooldown_seconds,
                    "Upgrade on cooldown, waiting before retry"
                );
                tokio::time::sleep(Duration::from_secs(upgrade.cooldown_seconds)).await;
            }
        }

        match self.api.buy_upgrade(&upgrade.id).await? {
            PurchaseStatus::Accepted => Ok(2),
            PurchaseStatus::Rejected { code, message } => {
                anyhow::bail!("rejected after cooldown retry: {code} {message}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
