//! Distributed-ledger mirror client
//!
//! Read-only HTTP client for an external service that mirrors chain-log
//! events onto a blockchain. Strictly an enrichment: any failure here is
//! logged and degraded to an empty transaction list, never surfaced as a
//! trace failure.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mirror client configuration
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Base URL, e.g. `https://ledger-mirror.internal`
    pub base_url: String,
    /// Request timeout
    pub timeout_secs: u64,
}

impl MirrorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 5,
        }
    }
}

/// One mirrored transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorTransaction {
    pub tx_hash: String,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub event_id: Option<Uuid>,
    #[serde(default)]
    pub recorded_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<MirrorTransaction>,
}

/// Mirror HTTP client
pub struct MirrorClient {
    client: Client,
    config: MirrorConfig,
}

impl MirrorClient {
    pub fn new(config: MirrorConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("failed to build mirror client: {e}"))?;
        Ok(Self { client, config })
    }

    /// Fetch the mirrored transaction list for a product.
    pub async fn product_transactions(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<MirrorTransaction>, String> {
        let url = format!(
            "{}/api/v1/products/{}/transactions",
            self.config.base_url.trim_end_matches('/'),
            product_id
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("mirror request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("mirror returned status {}", response.status()));
        }
        let body: TransactionsResponse = response
            .json()
            .await
            .map_err(|e| format!("mirror returned invalid body: {e}"))?;
        Ok(body.transactions)
    }

    /// Enrichment wrapper: degrade every failure to an empty list.
    pub async fn product_transactions_or_empty(&self, product_id: Uuid) -> Vec<MirrorTransaction> {
        match self.product_transactions(product_id).await {
            Ok(transactions) => transactions,
            Err(err) => {
                tracing::warn!(%product_id, error = %err, "ledger mirror unavailable, continuing without it");
                Vec::new()
            }
        }
    }
}
