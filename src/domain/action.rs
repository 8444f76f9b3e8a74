use serde::{Deserialize, Serialize};

use super::fault::ErrorKind;
use super::session::SwapSession;
use super::state::SwapStatus;

/// The single action a UI binding should offer for the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapAction {
    ConnectWallet,
    EnterAmount,
    AwaitQuote,
    /// Quote failed; editing the amount is the only way forward
    Blocked(ErrorKind),
    Swap,
    AwaitConfirmation,
    Retry,
}

impl SwapAction {
    pub fn label(&self) -> String {
        match self {
            SwapAction::ConnectWallet => "Connect Wallet".to_string(),
            SwapAction::EnterAmount => "Enter Amount".to_string(),
            SwapAction::AwaitQuote => "Fetching Quote...".to_string(),
            SwapAction::Blocked(kind) => kind.to_string(),
            SwapAction::Swap => "Swap".to_string(),
            SwapAction::AwaitConfirmation => "Confirming...".to_string(),
            SwapAction::Retry => "Retry".to_string(),
        }
    }

    /// Whether the primary button is clickable
    pub fn is_enabled(&self) -> bool {
        matches!(self, SwapAction::Swap | SwapAction::Retry)
    }
}

impl SwapSession {
    /// Derive the allowed action from session state and wallet connection.
    pub fn allowed_action(&self, connected: bool) -> SwapAction {
        if self.status() == SwapStatus::Submitting {
            return SwapAction::AwaitConfirmation;
        }
        if !connected {
            return SwapAction::ConnectWallet;
        }
        match self.status() {
            SwapStatus::Idle | SwapStatus::Submitted => SwapAction::EnterAmount,
            SwapStatus::Debouncing | SwapStatus::Quoting => SwapAction::AwaitQuote,
            SwapStatus::QuoteReady => SwapAction::Swap,
            SwapStatus::QuoteFailed => {
                SwapAction::Blocked(self.quote_error().cloned().unwrap_or(ErrorKind::NotReady))
            }
            SwapStatus::SubmitFailed => SwapAction::Retry,
            SwapStatus::Submitting => SwapAction::AwaitConfirmation,
        }
    }
}
