pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod flow;

pub use adapters::{BackendClient, DryRunSubmitter, FanoutNotifier, TracingNotifier, WebhookNotifier};
pub use config::AppConfig;
pub use domain::{
    AgentMarket, CurveSide, ErrorKind, SwapAction, SwapDirection, SwapSession, SwapStatus,
    TokenKind, TransactionReceipt,
};
pub use error::{ProviderFault, Result, SwapFlowError};
pub use flow::{
    BalanceProvider, FlowProviders, Notification, NotificationKind, Notifier, QuoteProvider,
    SubmitOutcome, SwapFlowController, TransactionSubmitter,
};
