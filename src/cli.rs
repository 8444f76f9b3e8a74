use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{BackendClient, DryRunSubmitter, FanoutNotifier, TracingNotifier, WebhookNotifier};
use crate::config::AppConfig;
use crate::domain::{AgentMarket, CurveSide, SwapDirection, SwapSession, SwapStatus};
use crate::error::{Result, SwapFlowError};
use crate::flow::{FlowProviders, Notifier, SubmitOutcome, SwapFlowController, TransactionSubmitter};

#[derive(Parser)]
#[command(name = "curve-swap")]
#[command(version = "0.1.0")]
#[command(about = "Quote and swap bonding-curve agent tokens", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory
    #[arg(short, long, default_value = "config", env = "SWAPFLOW_CONFIG_DIR")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Quote a swap without submitting it
    Quote {
        #[command(flatten)]
        swap: SwapArgs,
    },
    /// Quote a swap, then submit it
    Swap {
        #[command(flatten)]
        swap: SwapArgs,
        /// Wallet address the swap is made from
        #[arg(long, env = "SWAPFLOW_ADDRESS")]
        address: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SwapArgs {
    /// Agent id of the market
    #[arg(short, long)]
    pub agent: String,
    /// Agent token symbol (defaults to the agent id)
    #[arg(long)]
    pub name: Option<String>,
    /// Curve the agent trades on (leftcurve|rightcurve)
    #[arg(long, default_value = "leftcurve")]
    pub curve: CurveSide,
    /// buy or sell
    #[arg(short, long, default_value = "buy")]
    pub direction: SwapDirection,
    /// Human decimal amount of the paid token
    #[arg(long)]
    pub amount: String,
}

impl SwapArgs {
    fn market(&self) -> AgentMarket {
        AgentMarket::new(
            self.agent.clone(),
            self.name.clone().unwrap_or_else(|| self.agent.clone()),
            self.curve,
        )
    }
}

/// Upper bound on waiting for webhook deliveries before exit
const NOTIFY_FLUSH_LIMIT: Duration = Duration::from_secs(5);

/// Notification sinks for one command run
pub struct Notifiers {
    pub sink: Arc<dyn Notifier>,
    webhook: Option<WebhookNotifier>,
}

impl Notifiers {
    pub fn from_config(config: &AppConfig) -> Self {
        let webhook = config
            .notifier
            .webhook_url
            .clone()
            .map(WebhookNotifier::new)
            .or_else(WebhookNotifier::from_env);

        let mut fanout = FanoutNotifier::new().with(Arc::new(TracingNotifier));
        if let Some(webhook) = &webhook {
            fanout = fanout.with(Arc::new(webhook.clone()));
        }

        Self {
            sink: Arc::new(fanout),
            webhook,
        }
    }

    /// Wait for background deliveries so they survive process exit
    pub async fn flush(&self, limit: Duration) {
        if let Some(webhook) = &self.webhook {
            let abandoned = webhook.flush(limit).await;
            if abandoned > 0 {
                tracing::warn!(abandoned, "Dropped undelivered webhook notifications");
            }
        }
    }
}

fn build_submitter(config: &AppConfig) -> Result<Arc<dyn TransactionSubmitter>> {
    if config.dry_run.enabled {
        return Ok(Arc::new(DryRunSubmitter::new()));
    }
    Err(SwapFlowError::Validation(
        "live submission needs a wallet-backed submitter; set dry_run.enabled = true".to_string(),
    ))
}

/// Wire a controller to the backend for the market described by `args`
pub fn build_controller(
    config: &AppConfig,
    args: &SwapArgs,
    submitter: Arc<dyn TransactionSubmitter>,
    notifier: Arc<dyn Notifier>,
) -> Result<SwapFlowController> {
    let backend = Arc::new(BackendClient::from_config(&config.backend, &args.agent)?);
    let providers = FlowProviders::new(backend.clone(), backend, submitter, notifier)
        .with_refresh(|| tracing::debug!("Swap settled, balances should be reloaded"));
    Ok(SwapFlowController::new(
        args.market(),
        config.flow.clone(),
        providers,
    ))
}

/// Run one debounce/quote cycle and return the settled session
pub async fn quote_once(
    flow: &SwapFlowController,
    direction: SwapDirection,
    amount: &str,
    limit: Duration,
) -> Result<SwapSession> {
    flow.set_direction(direction);
    if !flow.set_amount(amount) {
        return Err(SwapFlowError::InvalidAmount(amount.to_string()));
    }

    let mut rx = flow.subscribe();
    let settled = tokio::time::timeout(limit, rx.wait_for(|s| s.status().is_settled()))
        .await
        .map_err(|_| SwapFlowError::Timeout(format!("no quote within {:?}", limit)))?
        .map_err(|e| SwapFlowError::Internal(e.to_string()))?
        .clone();
    Ok(settled)
}

fn quote_limit(config: &AppConfig) -> Duration {
    config.flow.debounce() + config.backend.timeout() + Duration::from_secs(1)
}

fn print_quote(flow: &SwapFlowController, session: &SwapSession) {
    let market = flow.market();
    let base = flow.config().base_symbol.as_str();
    let direction = session.direction();
    let paid = market.symbol(direction.input_token(), base);
    let received = market.symbol(direction.output_token(), base);

    match session.status() {
        SwapStatus::QuoteReady => println!(
            "\x1b[32m{} {} {} -> ~{} {}\x1b[0m",
            direction,
            session.debounced_input(),
            paid,
            flow.quote_display().unwrap_or_default(),
            received
        ),
        SwapStatus::QuoteFailed => println!(
            "\x1b[31m✗ {}\x1b[0m",
            session
                .quote_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Failed to simulate swap".to_string())
        ),
        _ => println!("Nothing to quote"),
    }
}

pub async fn run_quote(config: &AppConfig, args: &SwapArgs) -> Result<()> {
    let notifiers = Notifiers::from_config(config);
    let flow = build_controller(
        config,
        args,
        Arc::new(DryRunSubmitter::new()),
        notifiers.sink.clone(),
    )?;
    let session = quote_once(&flow, args.direction, &args.amount, quote_limit(config)).await?;
    print_quote(&flow, &session);
    Ok(())
}

pub async fn run_swap(config: &AppConfig, args: &SwapArgs, address: &str) -> Result<()> {
    let notifiers = Notifiers::from_config(config);
    let flow = build_controller(config, args, build_submitter(config)?, notifiers.sink.clone())?;
    flow.bind_address(Some(address.to_string()));

    let session = quote_once(&flow, args.direction, &args.amount, quote_limit(config)).await?;
    print_quote(&flow, &session);
    if session.status() != SwapStatus::QuoteReady {
        return Err(SwapFlowError::Validation("no executable quote".to_string()));
    }

    let outcome = flow.submit().await;
    notifiers.flush(NOTIFY_FLUSH_LIMIT).await;

    match outcome {
        SubmitOutcome::Submitted(receipt) => {
            println!("\x1b[32m✓ Submitted {}\x1b[0m", receipt.transaction_id);
            if let Some(link) = flow.config().explorer_link(&receipt.transaction_id) {
                println!("  {}", link);
            }
            Ok(())
        }
        SubmitOutcome::Rejected(kind) | SubmitOutcome::Failed(kind) => {
            println!("\x1b[31m✗ {}\x1b[0m", kind);
            Err(SwapFlowError::Validation(kind.to_string()))
        }
    }
}
