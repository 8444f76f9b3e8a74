//! Quote-then-execute swap flow
//!
//! [`SwapFlowController`] owns a [`SwapSession`](crate::domain::SwapSession)
//! and drives it through debounce, quote, and submission against the
//! collaborator traits in [`traits`].

pub mod controller;
pub mod notification;
pub mod traits;

pub use controller::{SubmitOutcome, SwapFlowController};
pub use notification::{Notification, NotificationKind};
pub use traits::{
    BalanceProvider, FlowProviders, Notifier, QuoteProvider, RefreshHook, TransactionSubmitter,
};
