use serde::{Deserialize, Serialize};
use std::fmt;

/// Swap flow state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapStatus {
    /// Nothing to quote
    Idle,
    /// Amount edited, waiting for the quiescence window to elapse
    Debouncing,
    /// Quote request in flight
    Quoting,
    /// Quote available and submittable
    QuoteReady,
    /// Quote request failed
    QuoteFailed,
    /// Transaction handed to the submitter
    Submitting,
    /// Transaction accepted
    Submitted,
    /// Transaction failed or was rejected
    SubmitFailed,
}

impl SwapStatus {
    pub const ALL: [SwapStatus; 8] = [
        SwapStatus::Idle,
        SwapStatus::Debouncing,
        SwapStatus::Quoting,
        SwapStatus::QuoteReady,
        SwapStatus::QuoteFailed,
        SwapStatus::Submitting,
        SwapStatus::Submitted,
        SwapStatus::SubmitFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Idle => "IDLE",
            SwapStatus::Debouncing => "DEBOUNCING",
            SwapStatus::Quoting => "QUOTING",
            SwapStatus::QuoteReady => "QUOTE_READY",
            SwapStatus::QuoteFailed => "QUOTE_FAILED",
            SwapStatus::Submitting => "SUBMITTING",
            SwapStatus::Submitted => "SUBMITTED",
            SwapStatus::SubmitFailed => "SUBMIT_FAILED",
        }
    }

    /// Check if this state can transition to another state
    pub fn can_transition_to(&self, target: SwapStatus) -> bool {
        use SwapStatus::*;

        match (self, target) {
            // Direction change or reset is always allowed
            (_, Idle) => true,

            // Editing the amount restarts the debounce from anywhere but an
            // in-flight submission
            (Submitting, Debouncing) => false,
            (_, Debouncing) => true,

            (Debouncing, Quoting) => true,

            (Quoting, QuoteReady) => true,
            (Quoting, QuoteFailed) => true,

            (QuoteReady, Submitting) => true,

            (Submitting, Submitted) => true,
            (Submitting, SubmitFailed) => true,

            // All other transitions are invalid
            _ => false,
        }
    }

    /// Is a network call outstanding for the session?
    pub fn is_busy(&self) -> bool {
        matches!(self, SwapStatus::Quoting | SwapStatus::Submitting)
    }

    /// Is the quote/submission cycle waiting on the user?
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SwapStatus::Idle
                | SwapStatus::QuoteReady
                | SwapStatus::QuoteFailed
                | SwapStatus::Submitted
                | SwapStatus::SubmitFailed
        )
    }
}

impl Default for SwapStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SwapStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        SwapStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown state: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use SwapStatus::*;

        assert!(Idle.can_transition_to(Debouncing));
        assert!(Debouncing.can_transition_to(Idle));
        assert!(Debouncing.can_transition_to(Quoting));
        assert!(Quoting.can_transition_to(QuoteReady));
        assert!(Quoting.can_transition_to(QuoteFailed));
        assert!(QuoteReady.can_transition_to(Debouncing));
        assert!(QuoteFailed.can_transition_to(Debouncing));
        assert!(QuoteReady.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Submitted));
        assert!(Submitting.can_transition_to(SubmitFailed));
        assert!(Submitted.can_transition_to(Idle));
        assert!(SubmitFailed.can_transition_to(Debouncing));

        assert!(!Idle.can_transition_to(Quoting));
        assert!(!Debouncing.can_transition_to(QuoteReady));
        assert!(!QuoteFailed.can_transition_to(Submitting));
        assert!(!Submitting.can_transition_to(Debouncing));
        assert!(!Submitted.can_transition_to(Submitting));
    }

    #[test]
    fn test_every_state_can_reach_idle() {
        for status in SwapStatus::ALL {
            assert!(status.can_transition_to(SwapStatus::Idle), "{status}");
        }
    }

    #[test]
    fn test_state_from_str() {
        assert_eq!(SwapStatus::try_from("IDLE").unwrap(), SwapStatus::Idle);
        assert_eq!(
            SwapStatus::try_from("quote_ready").unwrap(),
            SwapStatus::QuoteReady
        );
        assert!(SwapStatus::try_from("INVALID").is_err());
    }

    #[test]
    fn test_busy_and_settled() {
        assert!(SwapStatus::Quoting.is_busy());
        assert!(SwapStatus::Submitting.is_busy());
        assert!(!SwapStatus::Debouncing.is_busy());
        assert!(!SwapStatus::Debouncing.is_settled());
        assert!(SwapStatus::SubmitFailed.is_settled());
    }
}
