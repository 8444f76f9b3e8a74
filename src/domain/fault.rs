//! Error taxonomy surfaced as session state.
//!
//! None of these are thrown past the controller; they are stored on the
//! session and mirrored to the notifier.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which phase of the flow produced a provider fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPhase {
    Quote,
    Balance,
    Submit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[error("Please connect your wallet to trade.")]
    NotConnected,

    #[error("No valid quote for the current amount")]
    NotReady,

    #[error("Insufficient liquidity in the bonding curve")]
    InsufficientLiquidity,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Transaction would revert")]
    WouldRevert,

    #[error("Transaction rejected")]
    Rejected,

    #[error("{0}")]
    Unknown(String),
}

const BALANCE_PATTERNS: &[&str] = &[
    "insufficient balance",
    "insufficient funds",
    "exceeds balance",
    "exceeded balance",
    "transfer amount exceeds",
];

const LIQUIDITY_PATTERNS: &[&str] = &["insufficient", "liquidity", "option::unwrap failed"];

const REJECTION_PATTERNS: &[&str] = &["rejected", "denied", "user abort", "cancelled", "canceled"];

impl ErrorKind {
    /// Classify a provider fault string.
    ///
    /// Balance patterns are checked before the generic "insufficient" match so
    /// an exceeded balance is not reported as missing liquidity. Signer
    /// rejections only apply to the submit phase.
    pub fn classify(phase: FaultPhase, fault: &str) -> Self {
        let lowered = fault.to_lowercase();
        let matches_any = |patterns: &[&str]| patterns.iter().any(|p| lowered.contains(p));

        if matches_any(BALANCE_PATTERNS) {
            return ErrorKind::InsufficientBalance;
        }
        if phase == FaultPhase::Submit && matches_any(REJECTION_PATTERNS) {
            return ErrorKind::Rejected;
        }
        if matches_any(LIQUIDITY_PATTERNS) {
            return ErrorKind::InsufficientLiquidity;
        }
        if lowered.contains("revert") {
            return ErrorKind::WouldRevert;
        }
        ErrorKind::Unknown(fault.to_string())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotConnected => "not_connected",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::InsufficientLiquidity => "insufficient_liquidity",
            ErrorKind::InsufficientBalance => "insufficient_balance",
            ErrorKind::WouldRevert => "would_revert",
            ErrorKind::Rejected => "rejected",
            ErrorKind::Unknown(_) => "unknown",
        }
    }

    /// Whether the user can fix this without changing the amount
    pub fn is_precondition(&self) -> bool {
        matches!(self, ErrorKind::NotConnected | ErrorKind::NotReady)
    }
}
