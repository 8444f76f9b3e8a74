use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

use crate::domain::{SwapDirection, TransactionReceipt};
use crate::error::ProviderFault;
use crate::flow::TransactionSubmitter;

/// Submitter that accepts every swap without touching the chain
#[derive(Debug, Default)]
pub struct DryRunSubmitter {
    /// Simulated confirmation delay
    latency: Duration,
    submitted: AtomicU64,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            submitted: AtomicU64::new(0),
        }
    }

    /// Number of swaps accepted so far
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TransactionSubmitter for DryRunSubmitter {
    async fn submit(
        &self,
        direction: SwapDirection,
        amount: u128,
        minimum_out: u128,
    ) -> Result<TransactionReceipt, ProviderFault> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let transaction_id = format!("dry-{}", uuid::Uuid::new_v4());
        self.submitted.fetch_add(1, Ordering::Relaxed);
        info!(
            %direction,
            amount = %amount,
            minimum_out = %minimum_out,
            tx = %transaction_id,
            "[DRY RUN] Swap accepted"
        );
        Ok(TransactionReceipt::new(transaction_id))
    }
}
