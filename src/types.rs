//! Shared types for the UPGRADER agent.
//!
//! The catalog model mirrors the game API's JSON (camelCase keys). Only
//! `price` and `profit_per_hour_delta` matter to the optimizer; the rest is
//! carried through for display and purchasing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::optimizer::Investment;

// ---------------------------------------------------------------------------
// Upgrade
// ---------------------------------------------------------------------------

/// A purchasable upgrade card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub price: f64,
    /// Profit-per-hour gained by buying this upgrade.
    pub profit_per_hour_delta: f64,
    /// Profit-per-hour of the upgrade at its current level.
    #[serde(default)]
    pub profit_per_hour: f64,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub level: u32,
    /// Seconds to wait before the upgrade can be bought again.
    #[serde(default)]
    pub cooldown_seconds: u64,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub is_expired: bool,
}

impl Upgrade {
    /// Whether this upgrade can be handed to the optimizer: live, unlocked,
    /// and with a positive price.
    pub fn is_purchasable(&self) -> bool {
        self.is_available && !self.is_expired && self.price > 0.0
    }

    /// Build an upgrade with just the fields the optimizer reads.
    #[cfg(test)]
    pub fn sample(id: &str, price: f64, delta: f64) -> Self {
        Upgrade {
            id: id.to_string(),
            name: format!("Card {id}"),
            price,
            profit_per_hour_delta: delta,
            profit_per_hour: delta,
            section: "Markets".to_string(),
            level: 1,
            cooldown_seconds: 0,
            is_available: true,
            is_expired: false,
        }
    }
}

impl Investment for Upgrade {
    fn price(&self) -> f64 {
        self.price
    }

    fn profit_gain(&self) -> f64 {
        self.profit_per_hour_delta
    }
}

impl fmt::Display for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] (price: {:.0} | +{:.0}/h)",
            self.id, self.section, self.price, self.profit_per_hour_delta,
        )
    }
}

// ---------------------------------------------------------------------------
// API payloads
// ---------------------------------------------------------------------------

/// Body of `/clicker/upgrades-for-buy`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradesForBuy {
    pub upgrades_for_buy: Vec<Upgrade>,
}

/// Body of `/clicker/sync`. Only the balance is read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub clicker_user: ClickerUser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickerUser {
    pub balance_coins: f64,
}

/// Request body of `/clicker/buy-upgrade`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyUpgradeRequest {
    pub upgrade_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Outcome of a buy request the server answered.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseStatus {
    Accepted,
    /// The server refused the purchase, usually because of a cooldown.
    Rejected { code: String, message: String },
}

impl PurchaseStatus {
    /// Interpret a buy response body: any `error_code` means rejection.
    pub fn from_body(body: &serde_json::Value) -> Self {
        match body.get("error_code") {
            Some(code) => PurchaseStatus::Rejected {
                code: code
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| code.to_string()),
                message: body
                    .get("error_message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string(),
            },
            None => PurchaseStatus::Accepted,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PurchaseStatus::Accepted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upgrade_deserializes_camel_case() {
        let raw = json!({
            "id": "dao",
            "name": "DAO",
            "price": 15000,
            "profitPerHour": 900,
            "profitPerHourDelta": 120,
            "section": "PR&Team",
            "level": 3,
            "isAvailable": true,
            "isExpired": false,
            "cooldownSeconds": 60,
            "condition": { "_type": "ByUpgrade" }
        });
        let u: Upgrade = serde_json::from_value(raw).unwrap();
        assert_eq!(u.id, "dao");
        assert_eq!(u.price, 15000.0);
        assert_eq!(u.profit_per_hour_delta, 120.0);
        assert_eq!(u.cooldown_seconds, 60);
        assert!(u.is_purchasable());
    }

    #[test]
    fn test_upgrade_missing_optional_fields() {
        let raw = json!({
            "id": "x",
            "price": 10,
            "profitPerHourDelta": 5,
            "isAvailable": true
        });
        let u: Upgrade = serde_json::from_value(raw).unwrap();
        assert_eq!(u.cooldown_seconds, 0);
        assert!(!u.is_expired);
        assert_eq!(u.section, "");
    }

    #[test]
    fn test_is_purchasable_filters() {
        let mut u = Upgrade::sample("a", 100.0, 10.0);
        assert!(u.is_purchasable());
        u.is_expired = true;
        assert!(!u.is_purchasable());
        u.is_expired = false;
        u.is_available = false;
        assert!(!u.is_purchasable());
        u.is_available = true;
        u.price = 0.0;
        assert!(!u.is_purchasable());
    }

    #[test]
    fn test_upgrade_is_investment() {
        let u = Upgrade::sample("a", 200.0, 50.0);
        assert_eq!(u.ratio(), 0.25);
    }

    #[test]
    fn test_purchase_status_from_body() {
        assert_eq!(
            PurchaseStatus::from_body(&json!({ "clickerUser": {} })),
            PurchaseStatus::Accepted
        );
        let rejected = PurchaseStatus::from_body(&json!({
            "error_code": "UPGRADE_COOLDOWN",
            "error_message": "Upgrade is on cooldown"
        }));
        assert_eq!(
            rejected,
            PurchaseStatus::Rejected {
                code: "UPGRADE_COOLDOWN".into(),
                message: "Upgrade is on cooldown".into(),
            }
        );
        assert!(!rejected.is_accepted());
    }

    #[test]
    fn test_sync_response_balance() {
        let body = json!({ "clickerUser": { "balanceCoins": 1234.5, "level": 7 } });
        let sync: SyncResponse = serde_json::from_value(body).unwrap();
        assert_eq!(sync.clicker_user.balance_coins, 1234.5);
    }

    #[test]
    fn test_buy_request_serializes() {
        let req = BuyUpgradeRequest {
            upgrade_id: "dao".into(),
            timestamp: 42,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "upgradeId": "dao", "timestamp": 42 })
        );
    }
}
