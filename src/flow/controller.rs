//! Swap flow controller
//!
//! Turns raw amount edits into a debounced quote and a serialized swap
//! submission. Session state lives behind one lock that is never held across
//! an await; every asynchronous step re-enters through a generation-stamped
//! ticket so stale timers and late provider responses are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::notification::Notification;
use super::traits::FlowProviders;
use crate::config::FlowConfig;
use crate::domain::{
    format_units, AgentMarket, ErrorKind, FaultPhase, QuoteStart, SubmitIntent, SwapAction,
    SwapDirection, SwapSession, TransactionReceipt,
};

/// Result of a [`SwapFlowController::submit`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Transaction accepted by the submitter
    Submitted(TransactionReceipt),
    /// A precondition failed; the submitter was not called
    Rejected(ErrorKind),
    /// The submitter reported a failure
    Failed(ErrorKind),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }

    pub fn error(&self) -> Option<&ErrorKind> {
        match self {
            SubmitOutcome::Submitted(_) => None,
            SubmitOutcome::Rejected(kind) | SubmitOutcome::Failed(kind) => Some(kind),
        }
    }
}

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct FlowInner {
    market: AgentMarket,
    config: FlowConfig,
    providers: FlowProviders,
    session: Mutex<SwapSession>,
    account: RwLock<Option<String>>,
    timer: Mutex<Option<PendingTimer>>,
    submit_gate: AsyncMutex<()>,
    updates: watch::Sender<SwapSession>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FlowInner {
    /// Mutate the session and publish the new snapshot
    fn update<R>(&self, f: impl FnOnce(&mut SwapSession) -> R) -> R {
        let mut session = lock(&self.session);
        let result = f(&mut session);
        self.updates.send_replace(session.clone());
        result
    }

    fn read<R>(&self, f: impl FnOnce(&SwapSession) -> R) -> R {
        f(&lock(&self.session))
    }

    fn account(&self) -> Option<String> {
        self.account
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the timer slot if it still belongs to `generation`.
    ///
    /// Once fired, a timer's quote request is no longer abortable; later edits
    /// only invalidate its result.
    fn disarm_timer(&self, generation: u64) {
        let mut timer = lock(&self.timer);
        if timer.as_ref().map(|t| t.generation) == Some(generation) {
            timer.take();
        }
    }

    fn cancel_timer(&self) {
        if let Some(pending) = lock(&self.timer).take() {
            pending.handle.abort();
        }
    }

    async fn run_quote(&self, generation: u64) {
        let decimals = self.config.input_decimals;
        let request = match self.update(|s| s.begin_quote(generation, decimals)) {
            QuoteStart::Request(request) => request,
            QuoteStart::Idle => {
                debug!(generation, "Amount empty or zero, nothing to quote");
                return;
            }
            QuoteStart::Stale => {
                debug!(generation, "Debounce timer superseded");
                return;
            }
        };

        debug!(
            agent = %self.market.agent_id,
            direction = %request.direction,
            amount = %request.amount,
            generation,
            "Requesting quote"
        );

        let outcome = match self
            .providers
            .quotes
            .simulate(request.direction, request.amount)
            .await
        {
            Ok(quote) => Ok(quote),
            Err(fault) => {
                let kind = ErrorKind::classify(FaultPhase::Quote, &fault.message);
                warn!(
                    agent = %self.market.agent_id,
                    error = %fault,
                    kind = kind.code(),
                    "Quote failed"
                );
                Err(kind)
            }
        };

        let quote = outcome.as_ref().ok().copied();
        if self.update(|s| s.resolve_quote(&request, outcome)) {
            if let Some(quote) = quote {
                info!(
                    agent = %self.market.agent_id,
                    direction = %request.direction,
                    amount = %request.amount,
                    quote = %quote,
                    "Quote ready"
                );
            }
        } else {
            debug!(
                generation = request.generation,
                input = %request.input,
                "Discarding stale quote"
            );
        }
    }

    fn notify(&self, notification: Notification) {
        self.providers.notifier.notify(notification);
    }

    fn reject(&self, kind: ErrorKind) -> SubmitOutcome {
        debug!(kind = kind.code(), "Submit rejected");
        if kind != ErrorKind::NotReady {
            self.update(|s| s.reject_submit(kind.clone()));
            self.notify(Notification::failure(self.market.curve, kind.clone()));
        }
        SubmitOutcome::Rejected(kind)
    }

    /// Reject a check that ran for `intent`, unless the session moved on meanwhile.
    fn reject_intent(&self, intent: &SubmitIntent, kind: ErrorKind) -> SubmitOutcome {
        if !self.update(|s| s.reject_intent(intent, kind.clone())) {
            debug!(kind = kind.code(), "Discarding check result for a superseded quote");
            return SubmitOutcome::Rejected(ErrorKind::NotReady);
        }
        debug!(kind = kind.code(), "Submit rejected");
        self.notify(Notification::failure(self.market.curve, kind.clone()));
        SubmitOutcome::Rejected(kind)
    }

    /// Just-in-time balance check for the paid leg; never cached.
    async fn check_balance(&self, address: &str, intent: &SubmitIntent) -> Option<ErrorKind> {
        let token = intent.direction.input_token();
        match self.providers.balances.balance_of(address, token).await {
            Ok(balance) if balance < intent.amount => {
                warn!(
                    %token,
                    balance = %balance,
                    required = %intent.amount,
                    "Balance below swap amount"
                );
                Some(ErrorKind::InsufficientBalance)
            }
            Ok(_) => None,
            Err(fault) => {
                warn!(%token, error = %fault, "Balance lookup failed");
                Some(ErrorKind::classify(FaultPhase::Balance, &fault.message))
            }
        }
    }

    fn success_message(&self, intent: &SubmitIntent) -> String {
        let base = self.config.base_symbol.as_str();
        let paid = self.market.symbol(intent.direction.input_token(), base);
        let received = self.market.symbol(intent.direction.output_token(), base);
        let quoted = format_units(
            intent.minimum_out,
            self.config.quote_decimals,
            self.config.display_decimals,
        )
        .unwrap_or_else(|| intent.minimum_out.to_string());

        format!(
            "{} {} {} for at least {} {}",
            match intent.direction {
                SwapDirection::Buy => "Bought with",
                SwapDirection::Sell => "Sold",
            },
            intent.input,
            paid,
            quoted,
            received
        )
    }
}

/// State machine driving one swap widget for one agent market
pub struct SwapFlowController {
    inner: Arc<FlowInner>,
}

impl SwapFlowController {
    /// Create a controller for `market` starting on the buy side.
    pub fn new(market: AgentMarket, config: FlowConfig, providers: FlowProviders) -> Self {
        let session = SwapSession::new(SwapDirection::Buy);
        let (updates, _) = watch::channel(session.clone());

        Self {
            inner: Arc::new(FlowInner {
                market,
                config,
                providers,
                session: Mutex::new(session),
                account: RwLock::new(None),
                timer: Mutex::new(None),
                submit_gate: AsyncMutex::new(()),
                updates,
            }),
        }
    }

    pub fn market(&self) -> &AgentMarket {
        &self.inner.market
    }

    pub fn config(&self) -> &FlowConfig {
        &self.inner.config
    }

    /// Bind or clear the wallet address used for balance checks
    pub fn bind_address(&self, address: Option<String>) {
        let address = address.filter(|a| !a.trim().is_empty());
        debug!(connected = address.is_some(), "Wallet binding changed");
        *self
            .inner
            .account
            .write()
            .unwrap_or_else(PoisonError::into_inner) = address;
    }

    pub fn address(&self) -> Option<String> {
        self.inner.account()
    }

    pub fn is_connected(&self) -> bool {
        self.address().is_some()
    }

    /// Current session state
    pub fn snapshot(&self) -> SwapSession {
        self.inner.read(SwapSession::clone)
    }

    /// Receive every session change
    pub fn subscribe(&self) -> watch::Receiver<SwapSession> {
        self.inner.updates.subscribe()
    }

    pub fn allowed_action(&self) -> SwapAction {
        let connected = self.is_connected();
        self.inner.read(|s| s.allowed_action(connected))
    }

    /// Quoted counter amount formatted for display
    pub fn quote_display(&self) -> Option<String> {
        let config = &self.inner.config;
        self.inner
            .read(|s| s.quote())
            .and_then(|q| format_units(q, config.quote_decimals, config.display_decimals))
    }

    /// Switch buy/sell. Clears the session and invalidates any in-flight quote.
    pub fn set_direction(&self, direction: SwapDirection) {
        self.inner.cancel_timer();
        let generation = self.inner.update(|s| s.change_direction(direction));
        debug!(%direction, generation, "Direction changed");
    }

    /// Record an amount edit and restart the quiescence timer.
    ///
    /// Returns `false` when the edit was ignored (not a finite non-negative
    /// number, or a submission is in flight).
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn set_amount(&self, raw: &str) -> bool {
        let decimals = self.inner.config.input_decimals;
        match self.inner.update(|s| s.edit_amount(raw, decimals)) {
            Some(generation) => {
                self.schedule_quote(generation);
                true
            }
            None => {
                debug!(raw, "Ignoring amount edit");
                false
            }
        }
    }

    /// Re-run the quote cycle for the amount currently typed
    pub fn retry(&self) -> bool {
        let raw = self.inner.read(|s| s.raw_input().to_string());
        self.set_amount(&raw)
    }

    /// Back to `Idle`, keeping the direction
    pub fn reset(&self) {
        self.inner.cancel_timer();
        let generation = self.inner.update(|s| s.reset());
        debug!(generation, "Swap session reset");
    }

    /// Unmount: cancel the timer and invalidate every in-flight result
    pub fn close(&self) {
        self.inner.cancel_timer();
        self.inner.update(|s| s.invalidate());
    }

    fn schedule_quote(&self, generation: u64) {
        let mut timer = lock(&self.inner.timer);
        if let Some(previous) = timer.take() {
            previous.handle.abort();
        }

        let inner = Arc::clone(&self.inner);
        let window = self.inner.config.debounce();
        let handle = tokio::spawn(async move {
            sleep(window).await;
            inner.disarm_timer(generation);
            inner.run_quote(generation).await;
        });

        *timer = Some(PendingTimer { generation, handle });
    }

    /// Submit the quoted swap.
    ///
    /// Preconditions are checked in order: wallet bound, fresh quote, and for
    /// sells a just-in-time balance check. Concurrent calls while one is in
    /// flight are rejected with [`ErrorKind::NotReady`].
    pub async fn submit(&self) -> SubmitOutcome {
        let Ok(_gate) = self.inner.submit_gate.try_lock() else {
            debug!("Submission already in flight");
            return SubmitOutcome::Rejected(ErrorKind::NotReady);
        };

        let address = self.address();
        let intent = match self.inner.read(|s| s.submit_intent(address.is_some())) {
            Ok(intent) => intent,
            Err(kind) => return self.inner.reject(kind),
        };

        if let (SwapDirection::Sell, Some(address)) = (intent.direction, address.as_deref()) {
            if let Some(kind) = self.inner.check_balance(address, &intent).await {
                return self.inner.reject_intent(&intent, kind);
            }
        }

        if !self.inner.update(|s| s.begin_submit(&intent)) {
            debug!("Quote went stale before submission");
            return SubmitOutcome::Rejected(ErrorKind::NotReady);
        }

        info!(
            agent = %self.inner.market.agent_id,
            direction = %intent.direction,
            amount = %intent.amount,
            minimum_out = %intent.minimum_out,
            "Submitting swap"
        );

        let curve = self.inner.market.curve;
        let result = self
            .inner
            .providers
            .submitter
            .submit(intent.direction, intent.amount, intent.minimum_out)
            .await;

        match result {
            Ok(receipt) => {
                if !self.inner.update(|s| s.complete_submit(&intent, receipt.clone())) {
                    debug!("Session moved on while the swap was submitting");
                }
                info!(tx = %receipt.transaction_id, "Swap submitted");

                let link = self.inner.config.explorer_link(&receipt.transaction_id);
                let message = self.inner.success_message(&intent);
                self.inner
                    .notify(Notification::success(curve, message).with_link(link));
                if let Some(refresh) = &self.inner.providers.refresh {
                    refresh();
                }
                SubmitOutcome::Submitted(receipt)
            }
            Err(fault) => {
                let kind = ErrorKind::classify(FaultPhase::Submit, &fault.message);
                warn!(error = %fault, kind = kind.code(), "Swap submission failed");
                self.inner.update(|s| s.fail_submit(&intent, kind.clone()));
                self.inner.notify(Notification::failure(curve, kind.clone()));
                SubmitOutcome::Failed(kind)
            }
        }
    }
}

impl Drop for SwapFlowController {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveSide, SwapStatus, TokenKind};
    use crate::error::ProviderFault;
    use crate::flow::traits::{
        MockBalanceProvider, MockNotifier, MockQuoteProvider, MockTransactionSubmitter,
    };
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn market() -> AgentMarket {
        AgentMarket::new("agent-1", "DEGEN", CurveSide::LeftCurve)
    }

    fn controller(
        quotes: MockQuoteProvider,
        balances: MockBalanceProvider,
        submitter: MockTransactionSubmitter,
        notifier: MockNotifier,
    ) -> SwapFlowController {
        let providers = FlowProviders::new(
            Arc::new(quotes),
            Arc::new(balances),
            Arc::new(submitter),
            Arc::new(notifier),
        );
        SwapFlowController::new(market(), FlowConfig::default(), providers)
    }

    async fn settle(flow: &SwapFlowController) -> SwapSession {
        let mut rx = flow.subscribe();
        let session = rx
            .wait_for(|s| s.status().is_settled())
            .await
            .expect("controller alive")
            .clone();
        session
    }

    #[tokio::test(start_paused = true)]
    async fn test_buy_quote_scenario() {
        let mut quotes = MockQuoteProvider::new();
        quotes
            .expect_simulate()
            .with(eq(SwapDirection::Buy), eq(1_500_000u128))
            .times(1)
            .returning(|_, _| Ok(3_000_000_000_000_000_000));

        let flow = controller(
            quotes,
            MockBalanceProvider::new(),
            MockTransactionSubmitter::new(),
            MockNotifier::new(),
        );
        assert!(flow.set_amount("1.5"));
        assert_eq!(flow.snapshot().status(), SwapStatus::Debouncing);

        let session = settle(&flow).await;
        assert_eq!(session.status(), SwapStatus::QuoteReady);
        assert_eq!(session.quote(), Some(3_000_000_000_000_000_000));
        assert_eq!(session.normalized_input(), Some(1_500_000));
        assert_eq!(flow.quote_display().as_deref(), Some("3.000000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_amount_never_quotes() {
        let mut quotes = MockQuoteProvider::new();
        quotes.expect_simulate().never();

        let flow = controller(
            quotes,
            MockBalanceProvider::new(),
            MockTransactionSubmitter::new(),
            MockNotifier::new(),
        );
        assert!(flow.set_amount("0"));
        let session = settle(&flow).await;
        assert_eq!(session.status(), SwapStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_fault_is_classified() {
        let mut quotes = MockQuoteProvider::new();
        quotes
            .expect_simulate()
            .returning(|_, _| Err(ProviderFault::new("insufficient liquidity for trade")));

        let flow = controller(
            quotes,
            MockBalanceProvider::new(),
            MockTransactionSubmitter::new(),
            MockNotifier::new(),
        );
        flow.set_amount("2");
        let session = settle(&flow).await;
        assert_eq!(session.status(), SwapStatus::QuoteFailed);
        assert_eq!(session.quote(), None);
        assert_eq!(session.quote_error(), Some(&ErrorKind::InsufficientLiquidity));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sell_with_short_balance_skips_submitter() {
        let mut quotes = MockQuoteProvider::new();
        quotes.expect_simulate().returning(|_, _| Ok(7));
        let mut balances = MockBalanceProvider::new();
        balances
            .expect_balance_of()
            .withf(|address, token| address == "0xuser" && *token == TokenKind::Agent)
            .times(1)
            .returning(|_, _| Ok(5_000_000));
        let mut submitter = MockTransactionSubmitter::new();
        submitter.expect_submit().never();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.error == Some(ErrorKind::InsufficientBalance))
            .times(1)
            .return_const(());

        let flow = controller(quotes, balances, submitter, notifier);
        flow.bind_address(Some("0xuser".to_string()));
        flow.set_direction(SwapDirection::Sell);
        flow.set_amount("10");
        settle(&flow).await;

        let outcome = flow.submit().await;
        assert_eq!(outcome, SubmitOutcome::Rejected(ErrorKind::InsufficientBalance));
        let session = flow.snapshot();
        assert_eq!(session.status(), SwapStatus::QuoteReady);
        assert_eq!(session.submit_error(), Some(&ErrorKind::InsufficientBalance));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_success_notifies_and_refreshes_once() {
        let mut quotes = MockQuoteProvider::new();
        quotes.expect_simulate().returning(|_, _| Ok(99));
        let mut submitter = MockTransactionSubmitter::new();
        submitter
            .expect_submit()
            .with(eq(SwapDirection::Buy), eq(1_000_000u128), eq(99u128))
            .times(1)
            .returning(|_, _, _| Ok(TransactionReceipt::new("0xabc")));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.is_success() && n.title == "WAGMI DETECTED")
            .times(1)
            .return_const(());

        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        let providers = FlowProviders::new(
            Arc::new(quotes),
            Arc::new(MockBalanceProvider::new()),
            Arc::new(submitter),
            Arc::new(notifier),
        )
        .with_refresh(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let flow = SwapFlowController::new(market(), FlowConfig::default(), providers);
        flow.bind_address(Some("0xuser".to_string()));
        flow.set_amount("1");
        settle(&flow).await;

        let outcome = flow.submit().await;
        assert!(outcome.is_submitted());
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        let session = flow.snapshot();
        assert_eq!(session.status(), SwapStatus::Submitted);
        assert_eq!(session.raw_input(), "");
        assert_eq!(session.quote(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce() {
        let mut quotes = MockQuoteProvider::new();
        quotes
            .expect_simulate()
            .with(eq(SwapDirection::Buy), eq(123_000_000u128))
            .times(1)
            .returning(|_, _| Ok(1));

        let flow = controller(
            quotes,
            MockBalanceProvider::new(),
            MockTransactionSubmitter::new(),
            MockNotifier::new(),
        );
        for raw in ["1", "12", "123"] {
            flow.set_amount(raw);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let session = settle(&flow).await;
        assert_eq!(session.debounced_input(), "123");
        assert_eq!(session.quote(), Some(1));
    }

    #[test]
    fn test_submit_outcome_error() {
        assert_eq!(
            SubmitOutcome::Failed(ErrorKind::Rejected).error(),
            Some(&ErrorKind::Rejected)
        );
        assert!(SubmitOutcome::Submitted(TransactionReceipt::new("0x")).error().is_none());
    }
}
