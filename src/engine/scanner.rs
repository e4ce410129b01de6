//! Catalog scanner.
//!
//! Fetches the upgrade shop and narrows it to the upgrades the optimizer
//! may consider: not expired, currently available, and with a positive
//! price. Everything downstream assumes this filtering has happened.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::GameApi;
use crate::types::Upgrade;

/// Result of one catalog scan.
#[derive(Debug, Clone)]
pub struct Scan {
    /// Upgrades listed by the shop before filtering.
    pub listed: usize,
    pub purchasable: Vec<Upgrade>,
}

/// Keep only upgrades that can be bought right now.
pub fn filter_purchasable(upgrades: Vec<Upgrade>) -> Vec<Upgrade> {
    upgrades
        .into_iter()
        .filter(|u| {
            let keep = u.is_purchasable();
            if !keep {
                debug!(
                    id = %u.id,
                    expired = u.is_expired,
                    available = u.is_available,
                    price = u.price,
                    "Skipping upgrade"
                );
            }
            keep
        })
        .collect()
}

pub struct Scanner {
    api: Arc<dyn GameApi>,
}

impl Scanner {
    pub fn new(api: Arc<dyn GameApi>) -> Self {
        Self { api }
    }

    /// Fetch and filter the catalog.
    pub async fn scan(&self) -> Result<Scan> {
        let upgrades = self
            .api
            .fetch_upgrades()
            .await
            .context("Failed to fetch upgrade catalog")?;
        let listed = upgrades.len();
        let purchasable = filter_purchasable(upgrades);

        info!(
            listed,
            purchasable = purchasable.len(),
            "Catalog scanned"
        );

        Ok(Scan {
            listed,
            purchasable,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockGameApi;

    fn catalog() -> Vec<Upgrade> {
        let mut expired = Upgrade::sample("expired", 100.0, 10.0);
        expired.is_expired = true;
        let mut locked = Upgrade::sample("locked", 100.0, 10.0);
        locked.is_available = false;
        let free = Upgrade::sample("free", 0.0, 10.0);
        vec![
            Upgrade::sample("a", 100.0, 10.0),
            expired,
            locked,
            free,
            Upgrade::sample("b", 50.0, 1.0),
        ]
    }

    #[test]
    fn test_filter_purchasable() {
        let ids: Vec<_> = filter_purchasable(catalog())
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_scan_filters_catalog() {
        let mut api = MockGameApi::new();
        api.expect_fetch_upgrades()
            .times(1)
            .returning(|| Ok(catalog()));

        let scan = Scanner::new(Arc::new(api)).scan().await.unwrap();
        assert_eq!(scan.listed, 5);
        assert_eq!(scan.purchasable.len(), 2);
    }

    #[test]
    fn test_scan_propagates_fetch_error() {
        let mut api = MockGameApi::new();
        api.expect_fetch_upgrades()
            .returning(|| Err(anyhow::anyhow!("HTTP 401")));

        let err = tokio_test::block_on(Scanner::new(Arc::new(api)).scan()).unwrap_err();
        assert!(format!("{err:#}").contains("HTTP 401"));
    }

    #[test]
    fn test_scan_empty_catalog() {
        let mut api = MockGameApi::new();
        api.expect_fetch_upgrades().returning(|| Ok(Vec::new()));

        let scan = tokio_test::block_on(Scanner::new(Arc::new(api)).scan()).unwrap();
        assert_eq!(scan.listed, 0);
        assert!(scan.purchasable.is_empty());
    }
}
