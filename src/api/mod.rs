//! Game API integration.
//!
//! Defines the `GameApi` trait the scanner and executor depend on, and the
//! HTTP implementation in `kombat`.

pub mod kombat;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{PurchaseStatus, Upgrade};

/// Abstraction over the upgrade shop.
///
/// Implementors provide the catalog, the current balance, and purchasing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Fetch every upgrade currently listed for purchase.
    async fn fetch_upgrades(&self) -> Result<Vec<Upgrade>>;

    /// Sync the account and return the coin balance.
    async fn sync_balance(&self) -> Result<f64>;

    /// Attempt to buy one upgrade.
    ///
    /// A refusal the server reports (e.g. cooldown) is `Ok(Rejected)`;
    /// `Err` is reserved for transport and decoding failures.
    async fn buy_upgrade(&self, upgrade_id: &str) -> Result<PurchaseStatus>;
}
