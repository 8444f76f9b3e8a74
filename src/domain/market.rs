use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction of a swap against the bonding curve
///
/// `Buy` pays the base asset and quotes agent tokens out; `Sell` pays agent
/// tokens and quotes the base asset out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwapDirection {
    Buy,
    Sell,
}

impl SwapDirection {
    /// Get the opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            SwapDirection::Buy => SwapDirection::Sell,
            SwapDirection::Sell => SwapDirection::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwapDirection::Buy => "BUY",
            SwapDirection::Sell => "SELL",
        }
    }

    /// Token the user pays with
    pub fn input_token(&self) -> TokenKind {
        match self {
            SwapDirection::Buy => TokenKind::Base,
            SwapDirection::Sell => TokenKind::Agent,
        }
    }

    /// Token quoted back by the curve
    pub fn output_token(&self) -> TokenKind {
        self.input_token().other()
    }
}

impl Default for SwapDirection {
    fn default() -> Self {
        Self::Buy
    }
}

impl std::fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SwapDirection {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(SwapDirection::Buy),
            "sell" => Ok(SwapDirection::Sell),
            other => Err(format!("invalid direction '{}'; expected buy|sell", other)),
        }
    }
}

/// Which of the two tokens in an agent market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// The quote asset the curve is denominated in
    Base,
    /// The agent's own token
    Agent,
}

impl TokenKind {
    pub fn other(&self) -> Self {
        match self {
            TokenKind::Base => TokenKind::Agent,
            TokenKind::Agent => TokenKind::Base,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Base => "base",
            TokenKind::Agent => "agent",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which curve an agent trades on. Drives notification flavour only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveSide {
    #[serde(alias = "left-curve", alias = "left")]
    LeftCurve,
    #[serde(alias = "right-curve", alias = "right")]
    RightCurve,
}

impl Default for CurveSide {
    fn default() -> Self {
        Self::LeftCurve
    }
}

impl FromStr for CurveSide {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "leftcurve" | "left" => Ok(CurveSide::LeftCurve),
            "rightcurve" | "right" => Ok(CurveSide::RightCurve),
            other => Err(format!("invalid curve '{}'; expected leftcurve|rightcurve", other)),
        }
    }
}

/// The agent market a swap session is mounted for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMarket {
    pub agent_id: String,
    /// Display name, also used as the agent token symbol
    pub name: String,
    #[serde(default)]
    pub curve: CurveSide,
}

impl AgentMarket {
    pub fn new(agent_id: impl Into<String>, name: impl Into<String>, curve: CurveSide) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            curve,
        }
    }

    /// Symbol for a token of this market given the configured base symbol
    pub fn symbol<'a>(&'a self, token: TokenKind, base_symbol: &'a str) -> &'a str {
        match token {
            TokenKind::Base => base_symbol,
            TokenKind::Agent => &self.name,
        }
    }
}
