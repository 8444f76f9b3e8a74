//! Collaborator seams of the swap flow
//!
//! The controller owns no network code. Everything it reads or writes goes
//! through these traits so hosts can plug in a backend client, a wallet, or
//! test doubles.

use async_trait::async_trait;
use std::sync::Arc;

use super::notification::Notification;
use crate::domain::{SwapDirection, TokenKind, TransactionReceipt};
use crate::error::ProviderFault;

/// Read-only bonding curve simulation (`simulate_buy` / `simulate_sell`)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Counter-leg amount for `amount` of the input leg, both in smallest units
    async fn simulate(&self, direction: SwapDirection, amount: u128)
        -> Result<u128, ProviderFault>;
}

/// Read-only token balances
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn balance_of(&self, address: &str, token: TokenKind) -> Result<u128, ProviderFault>;
}

/// On-chain `buy` / `sell` writes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// `minimum_out` is enforced as the slippage bound of the trade
    async fn submit(
        &self,
        direction: SwapDirection,
        amount: u128,
        minimum_out: u128,
    ) -> Result<TransactionReceipt, ProviderFault>;
}

/// Fire-and-forget success/failure sink
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Invoked once per successful submission so the host can reload balances
pub type RefreshHook = Arc<dyn Fn() + Send + Sync>;

/// The collaborators a controller is wired to
#[derive(Clone)]
pub struct FlowProviders {
    pub quotes: Arc<dyn QuoteProvider>,
    pub balances: Arc<dyn BalanceProvider>,
    pub submitter: Arc<dyn TransactionSubmitter>,
    pub notifier: Arc<dyn Notifier>,
    pub refresh: Option<RefreshHook>,
}

impl FlowProviders {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        balances: Arc<dyn BalanceProvider>,
        submitter: Arc<dyn TransactionSubmitter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            quotes,
            balances,
            submitter,
            notifier,
            refresh: None,
        }
    }

    pub fn with_refresh<F>(mut self, refresh: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.refresh = Some(Arc::new(refresh));
        self
    }
}
