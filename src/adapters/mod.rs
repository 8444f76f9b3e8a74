pub mod backend;
pub mod dry_run;
pub mod notifier;

pub use backend::BackendClient;
pub use dry_run::DryRunSubmitter;
pub use notifier::{FanoutNotifier, TracingNotifier, WebhookNotifier};
