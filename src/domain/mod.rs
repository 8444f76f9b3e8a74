pub mod action;
pub mod amount;
pub mod fault;
pub mod market;
pub mod session;
pub mod state;

pub use action::*;
pub use amount::{check_input, format_units, parse_amount, to_smallest_unit, AmountInput};
pub use fault::*;
pub use market::*;
pub use session::*;
pub use state::*;
