//! Swap session state and its pure transition functions.
//!
//! Every transition that starts asynchronous work hands back a ticket
//! ([`QuoteRequest`], [`SubmitIntent`]) stamped with the session generation.
//! Results are only applied when the ticket still matches the session, which
//! is how late responses for an older input are dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::{check_input, to_smallest_unit, AmountInput};
use super::fault::ErrorKind;
use super::market::SwapDirection;
use super::state::SwapStatus;

/// Identifier of an accepted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: String,
    pub submitted_at: DateTime<Utc>,
}

impl TransactionReceipt {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// A quote call the session expects an answer for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub generation: u64,
    pub direction: SwapDirection,
    pub input: String,
    pub amount: u128,
}

/// What the debounce timer should do once it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteStart {
    /// Issue this request
    Request(QuoteRequest),
    /// Input empty or zero, nothing to quote
    Idle,
    /// Timer belongs to an older edit
    Stale,
}

/// A validated swap ready to hand to the submitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitIntent {
    pub generation: u64,
    pub direction: SwapDirection,
    pub input: String,
    pub amount: u128,
    /// Quoted counter amount, passed on as the minimum acceptable output
    pub minimum_out: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapSession {
    direction: SwapDirection,
    raw_input: String,
    debounced_input: String,
    normalized_input: Option<u128>,
    quote: Option<u128>,
    quoted_input: Option<String>,
    quote_error: Option<ErrorKind>,
    submit_error: Option<ErrorKind>,
    status: SwapStatus,
    generation: u64,
    last_transaction: Option<TransactionReceipt>,
}

impl SwapSession {
    pub fn new(direction: SwapDirection) -> Self {
        Self {
            direction,
            raw_input: String::new(),
            debounced_input: String::new(),
            normalized_input: None,
            quote: None,
            quoted_input: None,
            quote_error: None,
            submit_error: None,
            status: SwapStatus::Idle,
            generation: 0,
            last_transaction: None,
        }
    }

    pub fn direction(&self) -> SwapDirection {
        self.direction
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn debounced_input(&self) -> &str {
        &self.debounced_input
    }

    pub fn normalized_input(&self) -> Option<u128> {
        self.normalized_input
    }

    pub fn quote(&self) -> Option<u128> {
        self.quote
    }

    pub fn quote_error(&self) -> Option<&ErrorKind> {
        self.quote_error.as_ref()
    }

    pub fn submit_error(&self) -> Option<&ErrorKind> {
        self.submit_error.as_ref()
    }

    pub fn status(&self) -> SwapStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_transaction(&self) -> Option<&TransactionReceipt> {
        self.last_transaction.as_ref()
    }

    /// The quote still corresponds to the debounced input
    pub fn is_quote_fresh(&self) -> bool {
        self.status == SwapStatus::QuoteReady
            && self.quote.is_some()
            && self.quoted_input.as_deref() == Some(self.debounced_input.as_str())
    }

    fn clear_amounts(&mut self) {
        self.raw_input.clear();
        self.debounced_input.clear();
        self.normalized_input = None;
        self.clear_quote();
    }

    fn clear_quote(&mut self) {
        self.quote = None;
        self.quoted_input = None;
        self.quote_error = None;
    }

    /// Bump the generation so every outstanding ticket becomes stale
    pub fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Switch direction: wipes amounts, quote and errors, back to `Idle`.
    pub fn change_direction(&mut self, direction: SwapDirection) -> u64 {
        self.direction = direction;
        self.reset()
    }

    /// Back to `Idle` keeping the direction
    pub fn reset(&mut self) -> u64 {
        self.clear_amounts();
        self.submit_error = None;
        self.status = SwapStatus::Idle;
        self.invalidate()
    }

    /// Record an edit of the amount field.
    ///
    /// Returns the generation the debounce timer must carry, or `None` when the
    /// edit is ignored: not a finite non-negative number, too large to
    /// represent in `decimals`, or a submission is in flight.
    pub fn edit_amount(&mut self, raw: &str, decimals: u32) -> Option<u64> {
        if self.status == SwapStatus::Submitting {
            return None;
        }
        match check_input(raw) {
            AmountInput::Rejected => return None,
            AmountInput::Value(value) => {
                to_smallest_unit(value, decimals)?;
            }
            AmountInput::Empty => {}
        }

        self.raw_input = raw.to_string();
        self.normalized_input = None;
        self.clear_quote();
        self.submit_error = None;
        self.status = SwapStatus::Debouncing;
        Some(self.invalidate())
    }

    /// The quiescence window for `generation` elapsed.
    pub fn begin_quote(&mut self, generation: u64, decimals: u32) -> QuoteStart {
        if generation != self.generation || self.status != SwapStatus::Debouncing {
            return QuoteStart::Stale;
        }

        self.debounced_input = self.raw_input.clone();
        let amount = check_input(&self.raw_input)
            .positive()
            .and_then(|value| to_smallest_unit(value, decimals))
            .filter(|amount| *amount > 0);

        match amount {
            None => {
                self.normalized_input = None;
                self.status = SwapStatus::Idle;
                QuoteStart::Idle
            }
            Some(amount) => {
                self.normalized_input = Some(amount);
                self.status = SwapStatus::Quoting;
                QuoteStart::Request(QuoteRequest {
                    generation,
                    direction: self.direction,
                    input: self.debounced_input.clone(),
                    amount,
                })
            }
        }
    }

    /// Apply a quote result. Returns `false` if the request went stale.
    pub fn resolve_quote(&mut self, request: &QuoteRequest, outcome: Result<u128, ErrorKind>) -> bool {
        if request.generation != self.generation
            || request.direction != self.direction
            || request.input != self.debounced_input
            || self.status != SwapStatus::Quoting
        {
            return false;
        }

        match outcome {
            Ok(quote) => {
                self.quote = Some(quote);
                self.quoted_input = Some(request.input.clone());
                self.quote_error = None;
                self.status = SwapStatus::QuoteReady;
            }
            Err(kind) => {
                self.quote = None;
                self.quoted_input = None;
                self.quote_error = Some(kind);
                self.status = SwapStatus::QuoteFailed;
            }
        }
        true
    }

    /// Check submit preconditions (connection first, then a fresh quote).
    pub fn submit_intent(&self, connected: bool) -> Result<SubmitIntent, ErrorKind> {
        if !connected {
            return Err(ErrorKind::NotConnected);
        }
        if !self.is_quote_fresh() {
            return Err(ErrorKind::NotReady);
        }
        match (self.normalized_input, self.quote) {
            (Some(amount), Some(minimum_out)) => Ok(SubmitIntent {
                generation: self.generation,
                direction: self.direction,
                input: self.debounced_input.clone(),
                amount,
                minimum_out,
            }),
            _ => Err(ErrorKind::NotReady),
        }
    }

    /// Record a submit precondition failure without leaving the current state
    pub fn reject_submit(&mut self, kind: ErrorKind) {
        self.submit_error = Some(kind);
    }

    /// Record a failed check made for `intent`.
    ///
    /// Returns `false`, leaving the session untouched, when the session moved
    /// on while the check was pending.
    pub fn reject_intent(&mut self, intent: &SubmitIntent, kind: ErrorKind) -> bool {
        if intent.generation != self.generation
            || !self.is_quote_fresh()
            || self.quote != Some(intent.minimum_out)
        {
            return false;
        }
        self.submit_error = Some(kind);
        true
    }

    /// Move to `Submitting` if the intent still matches the session.
    pub fn begin_submit(&mut self, intent: &SubmitIntent) -> bool {
        if intent.generation != self.generation
            || !self.is_quote_fresh()
            || self.quote != Some(intent.minimum_out)
        {
            return false;
        }
        self.submit_error = None;
        self.status = SwapStatus::Submitting;
        true
    }

    pub fn complete_submit(&mut self, intent: &SubmitIntent, receipt: TransactionReceipt) -> bool {
        if intent.generation != self.generation || self.status != SwapStatus::Submitting {
            return false;
        }
        self.clear_amounts();
        self.submit_error = None;
        self.last_transaction = Some(receipt);
        self.status = SwapStatus::Submitted;
        true
    }

    /// Failed submission keeps the typed amount so the user can retry.
    pub fn fail_submit(&mut self, intent: &SubmitIntent, kind: ErrorKind) -> bool {
        if intent.generation != self.generation || self.status != SwapStatus::Submitting {
            return false;
        }
        self.quote = None;
        self.quoted_input = None;
        self.submit_error = Some(kind);
        self.status = SwapStatus::SubmitFailed;
        true
    }
}

impl Default for SwapSession {
    fn default() -> Self {
        Self::new(SwapDirection::default())
    }
}
